//! srmdiff: compare two fixed-size SRAM snapshots.
//!
//! Thin presentation layer over the comparison core. Loads both files,
//! carves the buffer into regions, runs one comparison session, and
//! prints the report as text or JSON.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};

use srm_compare::diff::Unit;
use srm_compare::session::{CompareFlags, ComparisonSession, Region, RegionKind};
use srm_save::load_buffer;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum UnitArg {
    Byte,
    Word,
    Dword,
}

impl From<UnitArg> for Unit {
    fn from(arg: UnitArg) -> Self {
        match arg {
            UnitArg::Byte => Unit::Byte,
            UnitArg::Word => Unit::Word,
            UnitArg::Dword => Unit::DWord,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about = "Compare two fixed-size SRAM snapshots")]
struct Cli {
    /// Current snapshot
    #[arg(value_name = "CURRENT")]
    current: PathBuf,
    /// Snapshot to compare against
    #[arg(value_name = "COMPARISON")]
    comparison: PathBuf,
    /// Expected size in bytes; defaults to the current file's size
    #[arg(long)]
    size: Option<usize>,
    /// Comparison granularity
    #[arg(long, value_enum, default_value_t = UnitArg::Byte)]
    unit: UnitArg,
    /// Size of one save slot; carves the buffer into slot regions
    #[arg(long, requires = "slot_count")]
    slot_size: Option<usize>,
    /// Number of save slots
    #[arg(long, requires = "slot_size")]
    slot_count: Option<usize>,
    /// Offset of the first slot (bytes before it become the header region)
    #[arg(long, default_value_t = 0)]
    slot_offset: usize,
    /// Leave the header region out of the comparison
    #[arg(long)]
    no_header: bool,
    /// Leave bytes after the last slot out of the comparison
    #[arg(long)]
    no_unassigned: bool,
    /// Emit the report as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(changed) => process::exit(if changed { 1 } else { 0 }),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(2);
        }
    }
}

fn run(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let size = match cli.size {
        Some(s) => s,
        None => fs::metadata(&cli.current)?.len() as usize,
    };
    let current = load_buffer(&cli.current, size)?;
    let comparison = load_buffer(&cli.comparison, size)?;

    let regions = build_regions(cli, size)?;
    let mut flags = CompareFlags::SLOTS;
    if !cli.no_header {
        flags |= CompareFlags::HEADER;
    }
    if !cli.no_unassigned {
        flags |= CompareFlags::UNASSIGNED;
    }

    let label = format!("{} vs {}", cli.current.display(), cli.comparison.display());
    let report = ComparisonSession::new(
        label,
        current.as_slice(),
        comparison.as_slice(),
        regions,
        flags,
        cli.unit.into(),
    )
    .run();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print_summary();
    }
    Ok(!report.unchanged())
}

/// Carve the buffer into header/slot/unassigned regions, or fall back to
/// one region spanning the whole file.
fn build_regions(cli: &Cli, size: usize) -> Result<Vec<Region>, String> {
    let (Some(slot_size), Some(slot_count)) = (cli.slot_size, cli.slot_count) else {
        return Ok(vec![Region::new("file", RegionKind::Slot, 0, size)]);
    };

    let end = cli.slot_offset + slot_size * slot_count;
    if slot_size == 0 || end > size {
        return Err(format!(
            "{slot_count} slots of {slot_size} bytes at offset {} do not fit in {size} bytes",
            cli.slot_offset
        ));
    }

    let mut regions = Vec::new();
    if cli.slot_offset > 0 {
        regions.push(Region::new("header", RegionKind::Header, 0, cli.slot_offset));
    }
    for i in 0..slot_count {
        regions.push(Region::new(
            format!("slot {}", i + 1),
            RegionKind::Slot,
            cli.slot_offset + i * slot_size,
            slot_size,
        ));
    }
    if end < size {
        regions.push(Region::new(
            "unassigned",
            RegionKind::Unassigned,
            end,
            size - end,
        ));
    }
    Ok(regions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("srmdiff").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_whole_file_fallback() {
        let cli = parse(&["a.srm", "b.srm"]);
        let regions = build_regions(&cli, 8192).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].len, 8192);
    }

    #[test]
    fn test_slot_carving() {
        let cli = parse(&[
            "a.srm",
            "b.srm",
            "--slot-size",
            "64",
            "--slot-count",
            "3",
            "--slot-offset",
            "16",
        ]);
        let regions = build_regions(&cli, 256).unwrap();
        assert_eq!(regions.len(), 5);
        assert_eq!(regions[0].name, "header");
        assert_eq!(regions[0].len, 16);
        assert_eq!(regions[3].name, "slot 3");
        assert_eq!(regions[3].offset, 16 + 2 * 64);
        assert_eq!(regions[4].name, "unassigned");
        assert_eq!(regions[4].offset, 208);
        assert_eq!(regions[4].len, 48);
    }

    #[test]
    fn test_oversized_slots_rejected() {
        let cli = parse(&["a.srm", "b.srm", "--slot-size", "8192", "--slot-count", "2"]);
        assert!(build_regions(&cli, 8192).is_err());
    }
}
