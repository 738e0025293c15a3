//! Fixed-width primitive fields: one big-endian value per occurrence,
//! accumulated into a flat column. Booleans come in as one byte and are
//! normalized to 0/1.

use eyre::Result;

use crate::buffer::EventBuffer;
use crate::payload::{FlatColumn, Payload, PrimitiveKind};
use crate::readers::ElementRead;

pub struct PrimitiveReader {
    name: String,
    column: FlatColumn,
}

impl PrimitiveReader {
    pub fn new(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self {
            name: name.into(),
            column: FlatColumn::new(kind),
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.column.kind()
    }
}

impl ElementRead for PrimitiveReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, buffer: &mut EventBuffer<'_>) -> Result<()> {
        self.column.read_from(buffer)
    }

    fn finish(&mut self) -> Payload {
        Payload::Flat(self.column.take())
    }
}
