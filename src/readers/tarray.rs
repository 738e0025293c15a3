//! Counted primitive arrays: a 4-byte element count followed by that many
//! big-endian primitives, with no byte-count or version header of their
//! own.

use eyre::Result;

use crate::buffer::EventBuffer;
use crate::payload::{FlatColumn, Payload, PrimitiveKind};
use crate::readers::{last_offset, ElementRead};

pub struct TArrayReader {
    name: String,
    offsets: Vec<u32>,
    column: FlatColumn,
}

impl TArrayReader {
    pub fn new(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self {
            name: name.into(),
            offsets: vec![0],
            column: FlatColumn::new(kind),
        }
    }
}

impl ElementRead for TArrayReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, buffer: &mut EventBuffer<'_>) -> Result<()> {
        let size = buffer.read_u32()?;
        self.offsets.push(last_offset(&self.offsets) + size);
        for _ in 0..size {
            self.column.read_from(buffer)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Payload {
        Payload::List {
            offsets: std::mem::replace(&mut self.offsets, vec![0]),
            items: Box::new(Payload::Flat(self.column.take())),
        }
    }
}
