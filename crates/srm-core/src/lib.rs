//! srm-core: Record layouts and byte-order marshaling for SRAM snapshots
//!
//! This crate contains the layout model and marshaling logic with no I/O
//! dependencies. It is designed to be pure and testable: materializing a
//! record and serializing it back are functions of the buffer and the
//! layout alone.

pub mod buffer;
pub mod layout;
pub mod marshal;

pub use buffer::RawBuffer;
pub use layout::{Descend, FieldDef, FieldKind, RecordLayout, Reorder};
pub use marshal::{
    MarshalError, Record, Value, materialize_host, materialize_reversed, serialize_host,
    serialize_reversed,
};
