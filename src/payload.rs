//! # Decoded Result Columns
//!
//! Readers accumulate into append-only sinks and surrender them as a
//! [`Payload`] when decoding completes. Three base shapes compose:
//!
//! | Shape | Representation |
//! |-------|----------------|
//! | flat numeric | one `Vec<T>` per primitive width ([`FlatColumn`]) |
//! | variable-length bytes | byte vector + `u32` offsets vector of length `N + 1` |
//! | nested structure | offsets vector over a child payload, or a list of child payloads |
//!
//! Every offsets vector starts at 0, is monotone non-decreasing, and its
//! final value equals the element (or byte) count of the payload one level
//! down. Booleans are stored as bytes, normalized to 0/1 at read time.

use eyre::Result;

use crate::buffer::EventBuffer;

/// Primitive column element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl PrimitiveKind {
    /// Wire width in bytes.
    pub fn width(&self) -> usize {
        match self {
            PrimitiveKind::Bool | PrimitiveKind::I8 | PrimitiveKind::U8 => 1,
            PrimitiveKind::I16 | PrimitiveKind::U16 => 2,
            PrimitiveKind::I32 | PrimitiveKind::U32 | PrimitiveKind::F32 => 4,
            PrimitiveKind::I64 | PrimitiveKind::U64 | PrimitiveKind::F64 => 8,
        }
    }
}

/// A flat column of one primitive type. Booleans are kept as 0/1 bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum FlatColumn {
    Bool(Vec<u8>),
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    I64(Vec<i64>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl FlatColumn {
    pub fn new(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Bool => FlatColumn::Bool(Vec::new()),
            PrimitiveKind::I8 => FlatColumn::I8(Vec::new()),
            PrimitiveKind::U8 => FlatColumn::U8(Vec::new()),
            PrimitiveKind::I16 => FlatColumn::I16(Vec::new()),
            PrimitiveKind::U16 => FlatColumn::U16(Vec::new()),
            PrimitiveKind::I32 => FlatColumn::I32(Vec::new()),
            PrimitiveKind::U32 => FlatColumn::U32(Vec::new()),
            PrimitiveKind::I64 => FlatColumn::I64(Vec::new()),
            PrimitiveKind::U64 => FlatColumn::U64(Vec::new()),
            PrimitiveKind::F32 => FlatColumn::F32(Vec::new()),
            PrimitiveKind::F64 => FlatColumn::F64(Vec::new()),
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        match self {
            FlatColumn::Bool(_) => PrimitiveKind::Bool,
            FlatColumn::I8(_) => PrimitiveKind::I8,
            FlatColumn::U8(_) => PrimitiveKind::U8,
            FlatColumn::I16(_) => PrimitiveKind::I16,
            FlatColumn::U16(_) => PrimitiveKind::U16,
            FlatColumn::I32(_) => PrimitiveKind::I32,
            FlatColumn::U32(_) => PrimitiveKind::U32,
            FlatColumn::I64(_) => PrimitiveKind::I64,
            FlatColumn::U64(_) => PrimitiveKind::U64,
            FlatColumn::F32(_) => PrimitiveKind::F32,
            FlatColumn::F64(_) => PrimitiveKind::F64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FlatColumn::Bool(v) => v.len(),
            FlatColumn::I8(v) => v.len(),
            FlatColumn::U8(v) => v.len(),
            FlatColumn::I16(v) => v.len(),
            FlatColumn::U16(v) => v.len(),
            FlatColumn::I32(v) => v.len(),
            FlatColumn::U32(v) => v.len(),
            FlatColumn::I64(v) => v.len(),
            FlatColumn::U64(v) => v.len(),
            FlatColumn::F32(v) => v.len(),
            FlatColumn::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode exactly one element from the buffer and append it.
    pub fn read_from(&mut self, buffer: &mut EventBuffer<'_>) -> Result<()> {
        match self {
            FlatColumn::Bool(v) => v.push(buffer.read_bool()? as u8),
            FlatColumn::I8(v) => v.push(buffer.read_i8()?),
            FlatColumn::U8(v) => v.push(buffer.read_u8()?),
            FlatColumn::I16(v) => v.push(buffer.read_i16()?),
            FlatColumn::U16(v) => v.push(buffer.read_u16()?),
            FlatColumn::I32(v) => v.push(buffer.read_i32()?),
            FlatColumn::U32(v) => v.push(buffer.read_u32()?),
            FlatColumn::I64(v) => v.push(buffer.read_i64()?),
            FlatColumn::U64(v) => v.push(buffer.read_u64()?),
            FlatColumn::F32(v) => v.push(buffer.read_f32()?),
            FlatColumn::F64(v) => v.push(buffer.read_f64()?),
        }
        Ok(())
    }

    /// Move the accumulated column out, leaving an empty column of the same
    /// kind behind.
    pub fn take(&mut self) -> FlatColumn {
        std::mem::replace(self, FlatColumn::new(self.kind()))
    }
}

/// The structured result a reader hands back from `finish`.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Nothing was recorded (empty readers, discarded object prefixes).
    None,
    /// Flat primitive column, one element per read.
    Flat(FlatColumn),
    /// Variable-length byte payloads: `offsets[i]..offsets[i + 1]` brackets
    /// entry `i` inside `bytes`.
    Bytes { offsets: Vec<u32>, bytes: Vec<u8> },
    /// Variable-length list over a child column: `offsets[i + 1] -
    /// offsets[i]` children belong to entry `i`.
    List {
        offsets: Vec<u32>,
        items: Box<Payload>,
    },
    /// Heterogeneous fields read side by side, one payload per field.
    Record(Vec<Payload>),
    /// Map entries: shared offsets over parallel key and value columns.
    Map {
        offsets: Vec<u32>,
        keys: Box<Payload>,
        values: Box<Payload>,
    },
    /// Retained object references: ids and bit words one per object, plus
    /// the process-id references of objects that carried one
    /// (`pidf_offsets[i + 1] - pidf_offsets[i]` is 0 or 1).
    ObjectRefs {
        unique_ids: Vec<u32>,
        bits: Vec<u32>,
        pidf: Vec<u16>,
        pidf_offsets: Vec<u32>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::EventBuffer;

    #[test]
    fn primitive_kind_widths() {
        assert_eq!(PrimitiveKind::Bool.width(), 1);
        assert_eq!(PrimitiveKind::I8.width(), 1);
        assert_eq!(PrimitiveKind::U16.width(), 2);
        assert_eq!(PrimitiveKind::I32.width(), 4);
        assert_eq!(PrimitiveKind::F32.width(), 4);
        assert_eq!(PrimitiveKind::U64.width(), 8);
        assert_eq!(PrimitiveKind::F64.width(), 8);
    }

    #[test]
    fn flat_column_round_trips_kind() {
        for kind in [
            PrimitiveKind::Bool,
            PrimitiveKind::I8,
            PrimitiveKind::U8,
            PrimitiveKind::I16,
            PrimitiveKind::U16,
            PrimitiveKind::I32,
            PrimitiveKind::U32,
            PrimitiveKind::I64,
            PrimitiveKind::U64,
            PrimitiveKind::F32,
            PrimitiveKind::F64,
        ] {
            let column = FlatColumn::new(kind);
            assert_eq!(column.kind(), kind);
            assert!(column.is_empty());
        }
    }

    #[test]
    fn bool_column_normalizes_nonzero() {
        let data = [0x00, 0x07, 0x01];
        let offsets = [0u32, 3];
        let mut buf = EventBuffer::new(&data, &offsets).unwrap();

        let mut column = FlatColumn::new(PrimitiveKind::Bool);
        for _ in 0..3 {
            column.read_from(&mut buf).unwrap();
        }
        assert_eq!(column, FlatColumn::Bool(vec![0, 1, 1]));
    }

    #[test]
    fn take_leaves_empty_column_of_same_kind() {
        let data = [0x00, 0x00, 0x00, 0x2A];
        let offsets = [0u32, 4];
        let mut buf = EventBuffer::new(&data, &offsets).unwrap();

        let mut column = FlatColumn::new(PrimitiveKind::I32);
        column.read_from(&mut buf).unwrap();

        let taken = column.take();
        assert_eq!(taken, FlatColumn::I32(vec![42]));
        assert_eq!(column.kind(), PrimitiveKind::I32);
        assert!(column.is_empty());
    }
}
