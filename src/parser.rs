use std::borrow::Cow;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use pest::Parser;
use pest_derive::Parser;

use crate::id_data::{HexId, Hierarchy, IdData};

/// Prefix of the comment line that opens the vendor section.
pub const VENDOR_BLOCK_START: &str = "# Vendors";
/// Prefix of the comment line that opens the section following the vendors.
pub const VENDOR_BLOCK_STOP: &str = "# List of known device classes";

#[derive(Parser)]
#[grammar = "ids.pest"]
struct IdsLineParser;

/// Reads a whole ids data stream and builds its vendor tree.
///
/// Bytes that are not valid UTF-8 are decoded one per character, so every
/// line reaches the parser. Only read failures are reported as errors;
/// lines the parser does not understand are skipped.
pub fn parse(ids_data_stream: &mut dyn Read, hierarchy: Hierarchy) -> Result<IdData> {
    info!("Parsing ids data ({:?}).", hierarchy);
    let mut raw_data = Vec::new();
    ids_data_stream
        .read_to_end(&mut raw_data)
        .context("Couldn't read ids data.")?;

    let mut context = ParserContext::new(hierarchy);
    for raw_line in raw_data.split(|&b| b == b'\n') {
        context.feed(&decode_line(raw_line));
    }
    Ok(context.finish())
}

pub fn parse_file(path: &Path, hierarchy: Hierarchy) -> Result<IdData> {
    let mut file = File::open(path)
        .with_context(|| format!("Couldn't open ids file '{}'.", path.display()))?;
    parse(&mut file, hierarchy).with_context(|| format!("Couldn't parse '{}'.", path.display()))
}

fn decode_line(raw_line: &[u8]) -> Cow<'_, str> {
    let raw_line = raw_line.strip_suffix(b"\r").unwrap_or(raw_line);
    match std::str::from_utf8(raw_line) {
        Ok(line) => Cow::Borrowed(line),
        Err(_) => Cow::Owned(raw_line.iter().map(|&b| char::from(b)).collect()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockState {
    OutsideBlock,
    InBlock,
}

#[derive(Debug, PartialEq, Eq)]
enum IdsLine<'a> {
    Vendor {
        id: HexId,
        name: &'a str,
    },
    Device {
        id: HexId,
        name: &'a str,
    },
    Subsystem {
        subvendor_id: HexId,
        subdevice_id: HexId,
        name: &'a str,
    },
    Unrecognized,
}

fn classify_line(line: &str, hierarchy: Hierarchy) -> IdsLine<'_> {
    let depth = line.bytes().take_while(|&b| b == b'\t').count();
    let rule = match depth {
        0 => Rule::vendor_line,
        1 => Rule::device_line,
        2 if hierarchy.has_subsystems() => Rule::subsystem_line,
        _ => return IdsLine::Unrecognized,
    };

    let line_pair = match IdsLineParser::parse(rule, line) {
        Ok(mut pairs) => match pairs.next() {
            Some(pair) => pair,
            None => return IdsLine::Unrecognized,
        },
        Err(err) => {
            debug!("Skipping line {:?}: {}", line, err);
            return IdsLine::Unrecognized;
        }
    };
    let fields: Vec<&str> = line_pair.into_inner().map(|pair| pair.as_str()).collect();

    match (rule, fields.as_slice()) {
        (Rule::vendor_line, &[id, name]) => IdsLine::Vendor {
            id: HexId::new(id),
            name,
        },
        (Rule::device_line, &[id, name]) => IdsLine::Device {
            id: HexId::new(id),
            name,
        },
        (Rule::subsystem_line, &[subvendor_id, subdevice_id, name]) => IdsLine::Subsystem {
            subvendor_id: HexId::new(subvendor_id),
            subdevice_id: HexId::new(subdevice_id),
            name,
        },
        _ => IdsLine::Unrecognized,
    }
}

/// State carried from one line to the next while building the tree.
#[derive(Debug)]
struct ParserContext {
    data: IdData,
    state: BlockState,
    current_vendor: Option<usize>,
    current_device: Option<usize>,
    num_devices: usize,
    num_subsystems: usize,
    num_orphans: usize,
}

impl ParserContext {
    fn new(hierarchy: Hierarchy) -> Self {
        ParserContext {
            data: IdData::new(hierarchy),
            state: BlockState::OutsideBlock,
            current_vendor: None,
            current_device: None,
            num_devices: 0,
            num_subsystems: 0,
            num_orphans: 0,
        }
    }

    fn feed(&mut self, line: &str) {
        if line.starts_with(VENDOR_BLOCK_START) {
            debug!("Entering vendor block.");
            self.state = BlockState::InBlock;
            self.current_vendor = None;
            self.current_device = None;
        }
        if line.starts_with(VENDOR_BLOCK_STOP) {
            debug!("Leaving vendor block.");
            self.state = BlockState::OutsideBlock;
        }
        if self.state != BlockState::InBlock {
            return;
        }

        match classify_line(line, self.data.hierarchy()) {
            IdsLine::Vendor { id, name } => {
                self.current_vendor = Some(self.data.open_vendor(id, name));
                self.current_device = None;
            }
            IdsLine::Device { id, name } => match self.current_vendor {
                Some(vendor_pos) => {
                    self.current_device = self.data.add_device(vendor_pos, id, name);
                    self.num_devices += 1;
                }
                None => self.orphan("device", line),
            },
            IdsLine::Subsystem {
                subvendor_id,
                subdevice_id,
                name,
            } => match (self.current_vendor, self.current_device) {
                (Some(vendor_pos), Some(device_pos)) => {
                    self.data
                        .add_subsystem(vendor_pos, device_pos, subvendor_id, subdevice_id, name);
                    self.num_subsystems += 1;
                }
                _ => self.orphan("subsystem", line),
            },
            IdsLine::Unrecognized => {}
        }
    }

    fn orphan(&mut self, kind: &str, line: &str) {
        self.num_orphans += 1;
        warn!("Skipping {} line with no parent: {:?}", kind, line);
    }

    fn finish(self) -> IdData {
        info!(
            concat!(
                "Number of lines imported from the ids data: ",
                "vendors({}), devices({}), subsystems({}); skipped orphans({})",
            ),
            self.data.vendor_count(),
            self.num_devices,
            self.num_subsystems,
            self.num_orphans
        );
        self.data
    }
}
