//! Buffer to record marshaling with selective byte-order reversal.
//!
//! Source hardware stores multi-byte counters in its own order; the
//! marshaler walks a [`RecordLayout`] over the raw bytes and produces a
//! [`Record`] of host values, reversing the fields the layout marks for
//! it. Serializing goes the other way and restores the source order, so
//! an edited record can be written back bit-for-bit compatible.
//!
//! [`RecordLayout`]: crate::layout::RecordLayout

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::{Descend, FieldKind, RecordLayout, Reorder};

/// Marshaling failures.
///
/// All of these are layout-authoring defects rather than runtime
/// conditions; they are meant to be caught by the layout's tests, not
/// handled gracefully in shipped code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarshalError {
    #[error("layout '{layout}': byte span mismatch (expected {expected}, actual {actual})")]
    LayoutMismatch {
        layout: String,
        expected: usize,
        actual: usize,
    },

    #[error("field '{field}': unsupported integer width {width}")]
    UnsupportedField { field: String, width: usize },

    #[error("field '{field}': record value does not match the layout")]
    ValueMismatch { field: String },
}

/// Materialized field value in host representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// Packed integer widened into a host word (top bytes zero for
    /// widths below 4).
    UInt(u32),
    /// Verbatim copy of an opaque byte run.
    Bytes(Vec<u8>),
    /// Nested sub-record.
    Record(Record),
}

/// Materialized record: the layout's fields in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Widened integer value of a `UInt` field.
    pub fn uint(&self, name: &str) -> Option<u32> {
        match self.get(name)? {
            Value::UInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Contents of a `Bytes` field.
    pub fn bytes(&self, name: &str) -> Option<&[u8]> {
        match self.get(name)? {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Nested sub-record.
    pub fn record(&self, name: &str) -> Option<&Record> {
        match self.get(name)? {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Replace the value of a `UInt` field. Returns false when no such
    /// field exists.
    pub fn set_uint(&mut self, name: &str, value: u32) -> bool {
        for (n, v) in &mut self.fields {
            if n == name {
                if let Value::UInt(slot) = v {
                    *slot = value;
                    return true;
                }
            }
        }
        false
    }

    /// Fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }
}

/// How a traversal level treats multi-byte integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Reverse marked integers here and recurse the policy downward.
    Swap,
    /// Reverse marked integers here; nested records copy positionally.
    SwapTop,
    /// Positional copy throughout.
    Positional,
}

impl Mode {
    fn swaps_here(self) -> bool {
        !matches!(self, Mode::Positional)
    }

    /// Mode for a nested record field under this level.
    fn child(self, descend: Descend) -> Mode {
        match self {
            Mode::Positional | Mode::SwapTop => Mode::Positional,
            Mode::Swap => match descend {
                Descend::Recurse => Mode::Swap,
                Descend::TopOnly => Mode::SwapTop,
                Descend::Keep => Mode::Positional,
            },
        }
    }
}

/// Interpret `buffer` positionally, no reordering.
pub fn materialize_host(buffer: &[u8], layout: &RecordLayout) -> Result<Record, MarshalError> {
    decode(buffer, layout, Mode::Positional)
}

/// Interpret `buffer` reversing the byte order of every integer field
/// the layout marks for reordering.
pub fn materialize_reversed(buffer: &[u8], layout: &RecordLayout) -> Result<Record, MarshalError> {
    decode(buffer, layout, Mode::Swap)
}

/// Produce the raw buffer for a record materialized positionally.
pub fn serialize_host(record: &Record, layout: &RecordLayout) -> Result<Vec<u8>, MarshalError> {
    let mut out = Vec::with_capacity(layout.size());
    encode(record, layout, Mode::Positional, &mut out)?;
    Ok(out)
}

/// Produce the raw buffer in source hardware order for a record
/// materialized with reordering. Inverse of [`materialize_reversed`].
pub fn serialize_reversed(record: &Record, layout: &RecordLayout) -> Result<Vec<u8>, MarshalError> {
    let mut out = Vec::with_capacity(layout.size());
    encode(record, layout, Mode::Swap, &mut out)?;
    Ok(out)
}

fn decode(buffer: &[u8], layout: &RecordLayout, mode: Mode) -> Result<Record, MarshalError> {
    layout.validate()?;
    if buffer.len() != layout.size() {
        return Err(MarshalError::LayoutMismatch {
            layout: layout.name.clone(),
            expected: layout.size(),
            actual: buffer.len(),
        });
    }
    decode_fields(buffer, layout, mode)
}

fn decode_fields(buffer: &[u8], layout: &RecordLayout, mode: Mode) -> Result<Record, MarshalError> {
    let mut fields = Vec::with_capacity(layout.fields.len());
    for field in &layout.fields {
        let span = &buffer[field.offset..field.offset + field.kind.width()];
        let value = match &field.kind {
            FieldKind::UInt { reorder, .. } => {
                let swap = mode.swaps_here() && *reorder == Reorder::Swap;
                Value::UInt(read_packed(span, swap))
            }
            FieldKind::Bytes { .. } => Value::Bytes(span.to_vec()),
            FieldKind::Record { layout: sub, descend } => {
                Value::Record(decode_fields(span, sub, mode.child(*descend))?)
            }
        };
        fields.push((field.name.clone(), value));
    }
    Ok(Record { fields })
}

fn encode(
    record: &Record,
    layout: &RecordLayout,
    mode: Mode,
    out: &mut Vec<u8>,
) -> Result<(), MarshalError> {
    layout.validate()?;
    if record.fields.len() != layout.fields.len() {
        return Err(MarshalError::ValueMismatch {
            field: layout.name.clone(),
        });
    }
    for (field, (name, value)) in layout.fields.iter().zip(&record.fields) {
        if name != &field.name {
            return Err(MarshalError::ValueMismatch {
                field: field.name.clone(),
            });
        }
        match (&field.kind, value) {
            (FieldKind::UInt { width, reorder }, Value::UInt(v)) => {
                if *width < 4 && *v >> (8 * *width) != 0 {
                    return Err(MarshalError::ValueMismatch {
                        field: field.name.clone(),
                    });
                }
                let swap = mode.swaps_here() && *reorder == Reorder::Swap;
                write_packed(out, *width, *v, swap);
            }
            (FieldKind::Bytes { len }, Value::Bytes(b)) => {
                if b.len() != *len {
                    return Err(MarshalError::ValueMismatch {
                        field: field.name.clone(),
                    });
                }
                out.extend_from_slice(b);
            }
            (FieldKind::Record { layout: sub, descend }, Value::Record(r)) => {
                encode(r, sub, mode.child(*descend), out)?;
            }
            _ => {
                return Err(MarshalError::ValueMismatch {
                    field: field.name.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Widen a packed integer span. Positional reads are little-endian;
/// a swapped read reverses the span first, which is the same as reading
/// it big-endian.
fn read_packed(span: &[u8], swap: bool) -> u32 {
    let mut out = 0u32;
    if swap {
        for &b in span {
            out = (out << 8) | u32::from(b);
        }
    } else {
        for &b in span.iter().rev() {
            out = (out << 8) | u32::from(b);
        }
    }
    out
}

fn write_packed(out: &mut Vec<u8>, width: usize, value: u32, swap: bool) {
    let le = value.to_le_bytes();
    if swap {
        out.extend(le[..width].iter().rev());
    } else {
        out.extend_from_slice(&le[..width]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::FieldDef;

    /// A small slot layout exercising every field kind.
    fn slot_layout() -> RecordLayout {
        let stats = RecordLayout::new(
            "stats",
            vec![FieldDef::uint("hp", 0, 2), FieldDef::uint("mp", 2, 2)],
        );
        RecordLayout::new(
            "slot",
            vec![
                FieldDef::uint("level", 0, 1),
                FieldDef::uint("gold", 1, 2),
                FieldDef::uint("exp", 3, 3),
                FieldDef::uint_keep("checksum", 6, 2),
                FieldDef::bytes("name", 8, 4),
                FieldDef::record("stats", 12, stats, Descend::Recurse),
            ],
        )
    }

    fn slot_bytes() -> Vec<u8> {
        vec![
            0x05, // level
            0x12, 0x34, // gold, stored big-endian
            0x01, 0x02, 0x03, // exp, 3-byte big-endian
            0xAB, 0xCD, // checksum, order excluded
            b'L', b'I', b'N', b'K', // name
            0x00, 0x64, // stats.hp big-endian
            0x00, 0x20, // stats.mp big-endian
        ]
    }

    #[test]
    fn test_materialize_host_is_positional() {
        let record = materialize_host(&slot_bytes(), &slot_layout()).unwrap();
        assert_eq!(record.uint("level"), Some(0x05));
        assert_eq!(record.uint("gold"), Some(0x3412));
        assert_eq!(record.uint("exp"), Some(0x0003_0201));
        assert_eq!(record.uint("checksum"), Some(0xCDAB));
        assert_eq!(record.bytes("name"), Some(&b"LINK"[..]));
        assert_eq!(record.record("stats").unwrap().uint("hp"), Some(0x6400));
    }

    #[test]
    fn test_materialize_reversed_swaps_marked_fields() {
        let record = materialize_reversed(&slot_bytes(), &slot_layout()).unwrap();
        assert_eq!(record.uint("level"), Some(0x05));
        assert_eq!(record.uint("gold"), Some(0x1234));
        assert_eq!(record.uint("checksum"), Some(0xCDAB), "keep marker holds");
        assert_eq!(record.bytes("name"), Some(&b"LINK"[..]));
        assert_eq!(record.record("stats").unwrap().uint("hp"), Some(0x0064));
        assert_eq!(record.record("stats").unwrap().uint("mp"), Some(0x0020));
    }

    #[test]
    fn test_three_byte_field_widens_top_byte_zero() {
        let layout = RecordLayout::new("packed", vec![FieldDef::uint("exp", 0, 3)]);
        let record = materialize_reversed(&[0x01, 0x02, 0x03], &layout).unwrap();
        assert_eq!(record.uint("exp"), Some(0x0001_0203));
    }

    #[test]
    fn test_top_only_descend_stops_at_one_level() {
        let inner = RecordLayout::new("inner", vec![FieldDef::uint("deep", 0, 2)]);
        let outer = RecordLayout::new(
            "outer",
            vec![
                FieldDef::uint("shallow", 0, 2),
                FieldDef::record("inner", 2, inner, Descend::Recurse),
            ],
        );
        let layout = RecordLayout::new(
            "top",
            vec![FieldDef::record("outer", 0, outer, Descend::TopOnly)],
        );

        let record = materialize_reversed(&[0x12, 0x34, 0x56, 0x78], &layout).unwrap();
        let outer = record.record("outer").unwrap();
        assert_eq!(outer.uint("shallow"), Some(0x1234), "own field reverses");
        assert_eq!(
            outer.record("inner").unwrap().uint("deep"),
            Some(0x7856),
            "nested record copies positionally"
        );
    }

    #[test]
    fn test_keep_descend_copies_positionally() {
        let inner = RecordLayout::new("inner", vec![FieldDef::uint("v", 0, 2)]);
        let layout = RecordLayout::new(
            "top",
            vec![FieldDef::record("inner", 0, inner, Descend::Keep)],
        );
        let record = materialize_reversed(&[0x12, 0x34], &layout).unwrap();
        assert_eq!(record.record("inner").unwrap().uint("v"), Some(0x3412));
    }

    #[test]
    fn test_wrong_buffer_length_is_layout_mismatch() {
        let result = materialize_reversed(&slot_bytes()[1..], &slot_layout());
        assert!(matches!(
            result,
            Err(MarshalError::LayoutMismatch {
                expected: 16,
                actual: 15,
                ..
            })
        ));
    }

    #[test]
    fn test_unsupported_width_surfaces() {
        let layout = RecordLayout::new("bad", vec![FieldDef::uint("wide", 0, 5)]);
        let result = materialize_reversed(&[0; 5], &layout);
        assert!(matches!(
            result,
            Err(MarshalError::UnsupportedField { width: 5, .. })
        ));
    }

    #[test]
    fn test_reversed_round_trip() {
        let bytes = slot_bytes();
        let layout = slot_layout();
        let record = materialize_reversed(&bytes, &layout).unwrap();
        assert_eq!(serialize_reversed(&record, &layout).unwrap(), bytes);
    }

    #[test]
    fn test_host_round_trip() {
        let bytes = slot_bytes();
        let layout = slot_layout();
        let record = materialize_host(&bytes, &layout).unwrap();
        assert_eq!(serialize_host(&record, &layout).unwrap(), bytes);
    }

    #[test]
    fn test_edit_then_serialize_lands_in_source_order() {
        let layout = slot_layout();
        let mut record = materialize_reversed(&slot_bytes(), &layout).unwrap();
        assert!(record.set_uint("gold", 0xBEEF));

        let bytes = serialize_reversed(&record, &layout).unwrap();
        assert_eq!(&bytes[1..3], &[0xBE, 0xEF], "written back big-endian");
        assert_eq!(bytes[0], 0x05, "neighbors untouched");
        assert_eq!(&bytes[3..6], &[0x01, 0x02, 0x03]);
    }

    #[test]
    fn test_oversized_value_is_value_mismatch() {
        let layout = RecordLayout::new("one", vec![FieldDef::uint("b", 0, 1)]);
        let mut record = materialize_reversed(&[0x00], &layout).unwrap();
        record.set_uint("b", 0x1FF);
        assert!(matches!(
            serialize_reversed(&record, &layout),
            Err(MarshalError::ValueMismatch { .. })
        ));
    }

    #[test]
    fn test_set_uint_rejects_unknown_field() {
        let layout = slot_layout();
        let mut record = materialize_reversed(&slot_bytes(), &layout).unwrap();
        assert!(!record.set_uint("mana", 1));
    }
}
