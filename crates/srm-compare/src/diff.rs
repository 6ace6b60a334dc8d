//! Span diffing at a caller-chosen unit granularity.
//!
//! Walks two equal-length byte spans representing the same logical
//! region of the "current" and "comparison" snapshots and reports every
//! differing unit. The engine is endian-agnostic: units are read
//! positionally, and reversed-order sources are materialized through the
//! marshaler before they reach it.

use serde::{Deserialize, Serialize};

use crate::classify::{Classification, classify};

/// Comparison granularity in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum Unit {
    #[strum(serialize = "byte")]
    Byte,
    #[strum(serialize = "word")]
    Word,
    #[strum(serialize = "dword")]
    DWord,
}

impl Unit {
    pub fn width(self) -> usize {
        match self {
            Unit::Byte => 1,
            Unit::Word => 2,
            Unit::DWord => 4,
        }
    }
}

/// One-time signal that a named sub-range holds at least one difference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionMarker {
    pub name: String,
    /// Base offset of the region within the whole buffer.
    pub offset: usize,
    pub len: usize,
}

/// A single changed unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeDescriptor {
    /// Absolute offset of the unit within the whole buffer.
    pub offset: usize,
    /// Semantic name for the offset, when the caller can resolve one.
    pub label: Option<String>,
    /// Width actually compared at this position, in bytes.
    pub width: usize,
    pub current: u32,
    pub comparison: u32,
    pub change: Classification,
}

/// All differences found in one region: the marker first, then one
/// descriptor per changed unit, in offset order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionDiff {
    pub marker: RegionMarker,
    pub changes: Vec<ChangeDescriptor>,
}

impl RegionDiff {
    /// Number of differing units in the region.
    pub fn changed_units(&self) -> usize {
        self.changes.len()
    }
}

/// Compare two spans of the same region at the given granularity.
///
/// Returns `None` when the spans are identical, including the
/// zero-length span: no marker, no descriptors, not an error. A trailing
/// remainder shorter than the unit width is compared per byte, so every
/// byte of an odd-sized region is still covered.
///
/// Both spans must be the same length. Unequal lengths mean the caller
/// paired mismatched layout slices, which is a programming error; this
/// panics rather than returning a recoverable error.
pub fn diff_region(
    current: &[u8],
    comparison: &[u8],
    name: &str,
    base_offset: usize,
    unit: Unit,
    mut label_for: impl FnMut(usize) -> Option<String>,
) -> Option<RegionDiff> {
    assert_eq!(
        current.len(),
        comparison.len(),
        "region '{name}': current and comparison span lengths differ"
    );

    let mut changes = Vec::new();
    let mut pos = 0usize;
    while pos < current.len() {
        let remaining = current.len() - pos;
        let width = if remaining < unit.width() { 1 } else { unit.width() };
        let cur = read_unit(&current[pos..pos + width]);
        let cmp = read_unit(&comparison[pos..pos + width]);
        if cur != cmp {
            let offset = base_offset + pos;
            changes.push(ChangeDescriptor {
                offset,
                label: label_for(offset),
                width,
                current: cur,
                comparison: cmp,
                change: classify(cur, cmp),
            });
        }
        pos += width;
    }

    if changes.is_empty() {
        return None;
    }
    Some(RegionDiff {
        marker: RegionMarker {
            name: name.into(),
            offset: base_offset,
            len: current.len(),
        },
        changes,
    })
}

/// Positional (little-endian) read of one unit.
fn read_unit(span: &[u8]) -> u32 {
    let mut out = 0u32;
    for &b in span.iter().rev() {
        out = (out << 8) | u32::from(b);
    }
    out
}
