//! Comparison reporting — aggregates region diffs into totals and a
//! printable summary.

use serde::{Deserialize, Serialize};

use crate::diff::{RegionDiff, Unit};
use crate::session::CompareFlags;

/// Summary of one comparison session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Descriptive label (e.g. "before/after boss fight").
    pub label: String,
    pub unit: Unit,
    pub flags: CompareFlags,
    /// Total number of differing units across all regions.
    pub changed_units: u64,
    /// Number of regions holding at least one difference.
    pub changed_regions: u64,
    /// How many changed units toggled at most one bit.
    pub single_bit_changes: u64,
    /// Per-region details, in region declaration order.
    pub region_diffs: Vec<RegionDiff>,
}

impl ComparisonReport {
    /// Create a new empty report.
    pub fn new(label: impl Into<String>, unit: Unit, flags: CompareFlags) -> Self {
        Self {
            label: label.into(),
            unit,
            flags,
            changed_units: 0,
            changed_regions: 0,
            single_bit_changes: 0,
            region_diffs: Vec::new(),
        }
    }

    /// Record the differences of one region.
    pub fn add_region(&mut self, diff: RegionDiff) {
        self.changed_regions += 1;
        self.changed_units += diff.changed_units() as u64;
        self.single_bit_changes += diff
            .changes
            .iter()
            .filter(|c| c.change.single_bit)
            .count() as u64;
        self.region_diffs.push(diff);
    }

    /// True if the pass found no differences.
    pub fn unchanged(&self) -> bool {
        self.changed_units == 0
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n============================================================");
        println!("Comparison: {}", self.label);
        println!("Unit: {}", self.unit);
        if self.unchanged() {
            println!("No differences.");
            println!("============================================================");
            return;
        }
        println!(
            "Changed: {} units in {} regions ({} single-bit)",
            self.changed_units, self.changed_regions, self.single_bit_changes
        );
        for diff in &self.region_diffs {
            println!(
                "--- {} (offset 0x{:04X}, {} bytes, {} changed)",
                diff.marker.name,
                diff.marker.offset,
                diff.marker.len,
                diff.changed_units()
            );
            for c in &diff.changes {
                let label = c.label.as_deref().unwrap_or("");
                println!(
                    "  0x{:04X} {:<16} {:#06X} -> {:#06X}  delta {}{}  bits {}{}",
                    c.offset,
                    label,
                    c.comparison,
                    c.current,
                    c.change.sign,
                    c.change.magnitude,
                    c.change.flipped_bits,
                    if c.change.single_bit { "  [flag?]" } else { "" }
                );
            }
        }
        println!("============================================================");
    }
}
