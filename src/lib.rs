//! Converts the vendor sections of `usb.ids` and `pci.ids` into flat CSV
//! tables, one record per vendor, device or subsystem.
//!
//! ```no_run
//! use idstocsv::{parse_file, write_csv_file, Hierarchy};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let data = parse_file(Path::new("/usr/share/misc/pci.ids"), Hierarchy::VendorDeviceSubsystem)?;
//! let num_records = write_csv_file(&data, b';', Path::new("pci.ids_vdi.csv"))?;
//! println!("{} ids written", num_records);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod csv_output;
pub mod id_data;
pub mod parser;

pub use crate::csv_output::{write_csv, write_csv_file};
pub use crate::id_data::{Device, HexId, Hierarchy, IdData, Subsystem, Vendor};
pub use crate::parser::{parse, parse_file};
