use std::path::PathBuf;

use anyhow::Result;
use idstocsv::cli::{self, Conversion};
use idstocsv::Hierarchy;

/// Converts the vendors and devices of usb.ids into a CSV table.
#[derive(structopt::StructOpt)]
struct Args {
    /// Input usb.ids file
    #[structopt(
        short = "i",
        long = "input-file",
        default_value = "./usbids/usb.ids",
        parse(from_os_str)
    )]
    input_file: PathBuf,

    /// Output CSV file of vendors and devices
    #[structopt(
        short = "o",
        long = "output-file-vdi",
        default_value = "./usb.ids_vdi.csv",
        parse(from_os_str)
    )]
    output_file_vdi: PathBuf,

    /// CSV output delimiter, e.g. -d ","
    #[structopt(
        short = "d",
        long = "delimiter",
        default_value = ";",
        parse(try_from_str = cli::parse_delimiter)
    )]
    delimiter: u8,
}

#[paw::main]
fn main(args: Args) -> Result<()> {
    env_logger::init();
    let conversion = Conversion {
        input_file: args.input_file,
        output_file: args.output_file_vdi,
        delimiter: args.delimiter,
        hierarchy: Hierarchy::VendorDevice,
    };
    if let Some(summary) = cli::run(&conversion)? {
        println!("{}", summary);
    }
    Ok(())
}
