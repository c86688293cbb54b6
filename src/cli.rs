use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::warn;

use crate::csv_output::write_csv_file;
use crate::id_data::Hierarchy;
use crate::parser::parse_file;

/// Parses the `--delimiter` argument: a single ASCII character that is not a
/// quote or a line break.
pub fn parse_delimiter(src: &str) -> Result<u8> {
    let mut chars = src.chars();
    let delimiter = match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => c as u8,
        _ => return Err(anyhow!("Delimiter must be a single ASCII character, got {:?}.", src)),
    };
    match delimiter {
        b'"' | b'\r' | b'\n' => Err(anyhow!("{:?} can't be used as a delimiter.", src)),
        _ => Ok(delimiter),
    }
}

/// Resolves `path` against the current working directory.
pub fn resolve_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Couldn't get the current directory.")?;
    Ok(cwd.join(path))
}

/// One ids file to CSV conversion, as requested on the command line.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    pub delimiter: u8,
    pub hierarchy: Hierarchy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    pub num_records: usize,
    pub output_file: PathBuf,
}

impl fmt::Display for ConversionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ids written to '{}'",
            self.num_records,
            self.output_file.display()
        )
    }
}

/// Parses the input file and writes its CSV table.
///
/// Returns `None` when the input holds no vendor at all, in which case no
/// output file is created.
pub fn run(conversion: &Conversion) -> Result<Option<ConversionSummary>> {
    let input_file = resolve_path(&conversion.input_file)?;
    let output_file = resolve_path(&conversion.output_file)?;

    let data = parse_file(&input_file, conversion.hierarchy)?;
    if data.is_empty() {
        warn!(
            "No vendor found in '{}', nothing written.",
            input_file.display()
        );
        return Ok(None);
    }

    let num_records = write_csv_file(&data, conversion.delimiter, &output_file)?;
    Ok(Some(ConversionSummary {
        num_records,
        output_file,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir() -> Result<PathBuf> {
        let dir = std::env::temp_dir().join(format!(
            "idstocsv-{}-{:08x}",
            std::process::id(),
            rand::random::<u32>()
        ));
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    #[test]
    fn test_parse_delimiter() -> Result<()> {
        assert_eq!(parse_delimiter(";")?, b';');
        assert_eq!(parse_delimiter(",")?, b',');
        assert_eq!(parse_delimiter("\t")?, b'\t');
        for bad in &["", ";;", "é", "\"", "\n"] {
            assert!(parse_delimiter(bad).is_err(), "{:?} was accepted", bad);
        }
        Ok(())
    }

    #[test]
    fn test_resolve_path() -> Result<()> {
        let relative = resolve_path(Path::new("pciids/pci.ids"))?;
        assert!(relative.is_absolute());
        assert!(relative.ends_with("pciids/pci.ids"));

        let absolute = std::env::temp_dir().join("pci.ids");
        assert_eq!(resolve_path(&absolute)?, absolute);
        Ok(())
    }

    #[test]
    fn test_run_writes_csv() -> Result<()> {
        let dir = scratch_dir()?;
        let input_file = dir.join("pci.ids");
        let output_file = dir.join("pci.ids_vdi.csv");
        fs::write(
            &input_file,
            "# Vendors\n1234  Acme Corp\n\t0001  Widget\n\t\t5678 0002  SubWidget\n5678  Bare Corp\n",
        )?;

        let summary = run(&Conversion {
            input_file,
            output_file: output_file.clone(),
            delimiter: b',',
            hierarchy: Hierarchy::VendorDeviceSubsystem,
        })?
        .context("Nothing written.")?;

        assert_eq!(summary.num_records, 3);
        assert_eq!(
            summary.to_string(),
            format!("3 ids written to '{}'", output_file.display())
        );
        let csv = fs::read_to_string(&output_file)?;
        assert_eq!(csv.lines().count(), 4);
        assert!(csv.ends_with("\"\",\"5678\",\"Bare Corp\",\"\",\"\",\"\",\"\"\n"));

        fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_run_empty_input_creates_nothing() -> Result<()> {
        let dir = scratch_dir()?;
        let input_file = dir.join("usb.ids");
        let output_file = dir.join("usb.ids_vdi.csv");
        fs::write(&input_file, "# Vendors\n# List of known device classes\n")?;

        let summary = run(&Conversion {
            input_file,
            output_file: output_file.clone(),
            delimiter: b';',
            hierarchy: Hierarchy::VendorDevice,
        })?;

        assert_eq!(summary, None);
        assert!(!output_file.exists());
        fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_run_missing_input() -> Result<()> {
        let dir = scratch_dir()?;
        let output_file = dir.join("out.csv");
        let result = run(&Conversion {
            input_file: dir.join("missing.ids"),
            output_file: output_file.clone(),
            delimiter: b';',
            hierarchy: Hierarchy::VendorDevice,
        });

        assert!(result.is_err());
        assert!(!output_file.exists());
        fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
