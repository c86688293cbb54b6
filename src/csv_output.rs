use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::id_data::{Device, Hierarchy, IdData, Vendor};

/// Column layout and composite key prefixes for one hierarchy.
#[derive(Debug)]
struct Schema {
    header: &'static [&'static str],
    vendor_prefix: &'static str,
    device_prefix: &'static str,
    subsystem_prefix: Option<&'static str>,
}

const VENDOR_DEVICE_SCHEMA: Schema = Schema {
    header: &["VID_PID", "VID", "VID_name", "PID", "PID_name"],
    vendor_prefix: "VID",
    device_prefix: "PID",
    subsystem_prefix: None,
};

const VENDOR_DEVICE_SUBSYSTEM_SCHEMA: Schema = Schema {
    header: &[
        "VEN_DEV_SUBSYS",
        "VEN",
        "VEN_name",
        "DEV",
        "DEV_name",
        "SUBSYS",
        "SUBSYS_name",
    ],
    vendor_prefix: "VEN",
    device_prefix: "DEV",
    subsystem_prefix: Some("SUBSYS"),
};

impl Schema {
    fn for_hierarchy(hierarchy: Hierarchy) -> &'static Schema {
        match hierarchy {
            Hierarchy::VendorDevice => &VENDOR_DEVICE_SCHEMA,
            Hierarchy::VendorDeviceSubsystem => &VENDOR_DEVICE_SUBSYSTEM_SCHEMA,
        }
    }

    /// Fills the trailing columns of a record with empty fields.
    fn pad<'a>(&self, fields: &[&'a str]) -> Vec<&'a str> {
        let mut record = fields.to_vec();
        record.resize(self.header.len(), "");
        record
    }
}

/// Joins `(prefix, id)` pairs into a key such as `VEN_1234&DEV_0001`.
fn composite_key(parts: &[(&str, &str)]) -> String {
    parts
        .iter()
        .map(|(prefix, id)| format!("{}_{}", prefix, id))
        .collect::<Vec<_>>()
        .join("&")
}

/// Writes the vendor tree as CSV, every field quoted and every record ended
/// by `\n`.
///
/// Returns the number of records written, header excluded. Nothing at all is
/// written for an empty tree.
pub fn write_csv<W: Write>(data: &IdData, delimiter: u8, output: W) -> Result<usize> {
    if data.is_empty() {
        debug!("No vendors, skipping CSV output.");
        return Ok(0);
    }

    let schema = Schema::for_hierarchy(data.hierarchy());
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(output);

    writer.write_record(schema.header)?;
    let mut num_records = 0;
    for vendor in data.vendors() {
        num_records += write_vendor_records(&mut writer, schema, vendor)?;
    }
    writer.flush()?;

    info!("Wrote {} CSV records.", num_records);
    Ok(num_records)
}

/// Same as [`write_csv`], into a file at `path`. The file is only created
/// when there is something to write.
pub fn write_csv_file(data: &IdData, delimiter: u8, path: &Path) -> Result<usize> {
    if data.is_empty() {
        return Ok(0);
    }
    let file = File::create(path)
        .with_context(|| format!("Couldn't create output file '{}'.", path.display()))?;
    write_csv(data, delimiter, file)
        .with_context(|| format!("Couldn't write CSV to '{}'.", path.display()))
}

fn write_vendor_records<W: Write>(
    writer: &mut csv::Writer<W>,
    schema: &Schema,
    vendor: &Vendor,
) -> Result<usize> {
    let vendor_id = vendor.id.as_str();
    if !vendor.has_devices() {
        writer.write_record(schema.pad(&["", vendor_id, &vendor.name]))?;
        return Ok(1);
    }

    let mut num_records = 0;
    for device in vendor.devices() {
        num_records += write_device_records(writer, schema, vendor, device)?;
    }
    Ok(num_records)
}

fn write_device_records<W: Write>(
    writer: &mut csv::Writer<W>,
    schema: &Schema,
    vendor: &Vendor,
    device: &Device,
) -> Result<usize> {
    let vendor_id = vendor.id.as_str();
    let device_id = device.id.as_str();
    let device_key = composite_key(&[
        (schema.vendor_prefix, vendor_id),
        (schema.device_prefix, device_id),
    ]);
    writer.write_record(schema.pad(&[
        &device_key,
        vendor_id,
        &vendor.name,
        device_id,
        &device.name,
    ]))?;
    let mut num_records = 1;

    let subsystem_prefix = match schema.subsystem_prefix {
        Some(prefix) => prefix,
        None => return Ok(num_records),
    };
    for subsystem in device.subsystems() {
        // Keyed by the subdevice id alone; the subvendor is not part of the key.
        let subdevice_id = subsystem.subdevice_id.as_str();
        let subsystem_key = composite_key(&[
            (schema.vendor_prefix, vendor_id),
            (schema.device_prefix, device_id),
            (subsystem_prefix, subdevice_id),
        ]);
        writer.write_record(schema.pad(&[
            &subsystem_key,
            vendor_id,
            &vendor.name,
            device_id,
            &device.name,
            subdevice_id,
            &subsystem.name,
        ]))?;
        num_records += 1;
    }
    Ok(num_records)
}
