//! Placeholder for fields the schema layer chose to drop: consumes no
//! bytes, yields no payload.

use eyre::Result;

use crate::buffer::EventBuffer;
use crate::payload::Payload;
use crate::readers::ElementRead;

pub struct EmptyReader {
    name: String,
}

impl EmptyReader {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ElementRead for EmptyReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, _buffer: &mut EventBuffer<'_>) -> Result<()> {
        Ok(())
    }

    fn finish(&mut self) -> Payload {
        Payload::None
    }
}
