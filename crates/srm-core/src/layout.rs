//! Declarative record layouts for fixed-size save buffers.
//!
//! A layout maps a flat byte buffer onto named, typed, byte-order-aware
//! fields. Layouts are authored once per console/game by the surrounding
//! layer and walked by ordinary code; nothing here inspects types at
//! runtime.

use serde::{Deserialize, Serialize};

use crate::marshal::MarshalError;

/// Byte-order marker for a packed integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reorder {
    /// Reverse the field's bytes in a reordering pass.
    Swap,
    /// Copy positionally even in a reordering pass.
    Keep,
}

/// Reversal policy for a nested record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Descend {
    /// Reverse integer fields at every nesting level.
    Recurse,
    /// Reverse this sub-record's own integer fields; records nested
    /// inside it copy positionally.
    TopOnly,
    /// Copy the whole sub-record positionally.
    Keep,
}

/// Field kinds understood by the marshaler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Packed unsigned integer, `width` bytes wide. Widths 1 through 4
    /// are supported, including the 3-byte width some consoles pack
    /// counters into.
    UInt { width: usize, reorder: Reorder },
    /// Opaque bytes, copied verbatim in every pass.
    Bytes { len: usize },
    /// Nested sub-record.
    Record { layout: RecordLayout, descend: Descend },
}

impl FieldKind {
    /// Number of buffer bytes the field occupies.
    pub fn width(&self) -> usize {
        match self {
            FieldKind::UInt { width, .. } => *width,
            FieldKind::Bytes { len } => *len,
            FieldKind::Record { layout, .. } => layout.size(),
        }
    }
}

/// One named field at a fixed offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub offset: usize,
    pub kind: FieldKind,
}

impl FieldDef {
    /// Packed integer field that reverses in a reordering pass.
    pub fn uint(name: impl Into<String>, offset: usize, width: usize) -> Self {
        Self {
            name: name.into(),
            offset,
            kind: FieldKind::UInt {
                width,
                reorder: Reorder::Swap,
            },
        }
    }

    /// Packed integer field excluded from reordering.
    pub fn uint_keep(name: impl Into<String>, offset: usize, width: usize) -> Self {
        Self {
            name: name.into(),
            offset,
            kind: FieldKind::UInt {
                width,
                reorder: Reorder::Keep,
            },
        }
    }

    /// Opaque byte run.
    pub fn bytes(name: impl Into<String>, offset: usize, len: usize) -> Self {
        Self {
            name: name.into(),
            offset,
            kind: FieldKind::Bytes { len },
        }
    }

    /// Nested sub-record.
    pub fn record(
        name: impl Into<String>,
        offset: usize,
        layout: RecordLayout,
        descend: Descend,
    ) -> Self {
        Self {
            name: name.into(),
            offset,
            kind: FieldKind::Record { layout, descend },
        }
    }
}

/// Ordered field table describing one record.
///
/// Fields must be declared in offset order and tile the record exactly:
/// each field starts where the previous one ended. Gaps belong in
/// explicit `Bytes` fields so every buffer byte is accounted for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordLayout {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl RecordLayout {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Total size in bytes (sum of field widths).
    pub fn size(&self) -> usize {
        self.fields.iter().map(|f| f.kind.width()).sum()
    }

    /// Check the tiling invariant and integer widths, recursively.
    ///
    /// A field starting anywhere other than the end of the previous
    /// field is a `LayoutMismatch`; an integer width outside 1..=4 is an
    /// `UnsupportedField`. Both are authoring errors in the layout
    /// table, expected to be caught by the layout's own tests.
    pub fn validate(&self) -> Result<(), MarshalError> {
        let mut cursor = 0usize;
        for field in &self.fields {
            if field.offset != cursor {
                return Err(MarshalError::LayoutMismatch {
                    layout: self.name.clone(),
                    expected: cursor,
                    actual: field.offset,
                });
            }
            match &field.kind {
                FieldKind::UInt { width, .. } => {
                    if !(1..=4).contains(width) {
                        return Err(MarshalError::UnsupportedField {
                            field: field.name.clone(),
                            width: *width,
                        });
                    }
                }
                FieldKind::Bytes { .. } => {}
                FieldKind::Record { layout, .. } => layout.validate()?,
            }
            cursor += field.kind.width();
        }
        Ok(())
    }
}
