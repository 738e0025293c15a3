//! The standard serialized-object prefix: a version word, a unique id, a
//! bits word, and a process-id reference iff the referenced bit is set.
//!
//! Two modes, chosen at construction: discard (advance the cursor, record
//! nothing) or retain (record id, bits, and the reference triple). Reference
//! resolution is a higher layer's concern; the raw words are surfaced
//! verbatim.

use eyre::Result;

use crate::buffer::{EventBuffer, IS_REFERENCED};
use crate::payload::Payload;
use crate::readers::ElementRead;

pub struct TObjectReader {
    name: String,
    retain: bool,
    unique_ids: Vec<u32>,
    bits: Vec<u32>,
    pidf: Vec<u16>,
    pidf_offsets: Vec<u32>,
}

impl TObjectReader {
    pub fn new(name: impl Into<String>, retain: bool) -> Self {
        Self {
            name: name.into(),
            retain,
            unique_ids: Vec::new(),
            bits: Vec::new(),
            pidf: Vec::new(),
            pidf_offsets: vec![0],
        }
    }
}

impl ElementRead for TObjectReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, buffer: &mut EventBuffer<'_>) -> Result<()> {
        buffer.read_version()?;

        let unique_id = buffer.read_u32()?;
        let bits = buffer.read_u32()?;

        if bits & IS_REFERENCED != 0 {
            if self.retain {
                self.pidf.push(buffer.read_u16()?);
            } else {
                buffer.skip(2)?;
            }
        }

        if self.retain {
            self.unique_ids.push(unique_id);
            self.bits.push(bits);
            self.pidf_offsets.push(self.pidf.len() as u32);
        }
        Ok(())
    }

    fn finish(&mut self) -> Payload {
        if !self.retain {
            return Payload::None;
        }
        Payload::ObjectRefs {
            unique_ids: std::mem::take(&mut self.unique_ids),
            bits: std::mem::take(&mut self.bits),
            pidf: std::mem::take(&mut self.pidf),
            pidf_offsets: std::mem::replace(&mut self.pidf_offsets, vec![0]),
        }
    }
}
