//! Single-use comparison sessions.
//!
//! A session pairs the current and comparison buffers with a region
//! list, a flag set selecting which region kinds participate, and a
//! granularity. It is created per invocation, run once, and discarded;
//! no state survives the pass.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::diff::{Unit, diff_region};
use crate::report::ComparisonReport;

/// What a region holds, for flag-based selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum RegionKind {
    /// One save slot's progress record.
    #[strum(serialize = "slot")]
    Slot,
    /// File header / checksum area.
    #[strum(serialize = "header")]
    Header,
    /// Bytes outside any named structure.
    #[strum(serialize = "unassigned")]
    Unassigned,
}

/// A named contiguous sub-range of the save buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub kind: RegionKind,
    pub offset: usize,
    pub len: usize,
}

impl Region {
    pub fn new(name: impl Into<String>, kind: RegionKind, offset: usize, len: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            offset,
            len,
        }
    }
}

bitflags! {
    /// Region kinds taking part in a comparison pass.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CompareFlags: u8 {
        const SLOTS = 0x01;
        const HEADER = 0x02;
        const UNASSIGNED = 0x04;
    }
}

impl CompareFlags {
    /// Whether regions of `kind` are selected.
    pub fn selects(self, kind: RegionKind) -> bool {
        match kind {
            RegionKind::Slot => self.contains(Self::SLOTS),
            RegionKind::Header => self.contains(Self::HEADER),
            RegionKind::Unassigned => self.contains(Self::UNASSIGNED),
        }
    }
}

// Manual serde impl for CompareFlags
impl Serialize for CompareFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CompareFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(CompareFlags::from_bits_truncate(bits))
    }
}

/// Callback resolving a semantic name for an absolute offset inside a
/// region.
pub type Labeler<'a> = &'a dyn Fn(&Region, usize) -> Option<String>;

/// One comparison pass over two snapshots.
pub struct ComparisonSession<'a> {
    label: String,
    current: &'a [u8],
    comparison: &'a [u8],
    regions: Vec<Region>,
    flags: CompareFlags,
    unit: Unit,
    labeler: Option<Labeler<'a>>,
}

impl<'a> ComparisonSession<'a> {
    /// Pair two buffers for comparison.
    ///
    /// Panics if the buffers differ in length or a region reaches past
    /// the buffer end; both sides must describe the same layout, so
    /// either is a programming error in the caller.
    pub fn new(
        label: impl Into<String>,
        current: &'a [u8],
        comparison: &'a [u8],
        regions: Vec<Region>,
        flags: CompareFlags,
        unit: Unit,
    ) -> Self {
        assert_eq!(
            current.len(),
            comparison.len(),
            "current and comparison buffer lengths differ"
        );
        for region in &regions {
            assert!(
                region
                    .offset
                    .checked_add(region.len)
                    .is_some_and(|end| end <= current.len()),
                "region '{}' reaches past the buffer end",
                region.name
            );
        }
        Self {
            label: label.into(),
            current,
            comparison,
            regions,
            flags,
            unit,
            labeler: None,
        }
    }

    /// Attach an offset-to-name resolver.
    pub fn with_labeler(mut self, labeler: Labeler<'a>) -> Self {
        self.labeler = Some(labeler);
        self
    }

    /// Run the pass and consume the session.
    ///
    /// Selected regions are walked in declaration order; each one with a
    /// difference contributes its marker and descriptors to the report.
    pub fn run(self) -> ComparisonReport {
        let mut report = ComparisonReport::new(self.label, self.unit, self.flags);
        for region in &self.regions {
            if !self.flags.selects(region.kind) {
                continue;
            }
            let cur = &self.current[region.offset..region.offset + region.len];
            let cmp = &self.comparison[region.offset..region.offset + region.len];
            let labeler = self.labeler;
            let diff = diff_region(cur, cmp, &region.name, region.offset, self.unit, |off| {
                labeler.and_then(|l| l(region, off))
            });
            if let Some(diff) = diff {
                report.add_region(diff);
            }
        }
        report
    }
}
