//! String payloads: a one-byte length (escaping to four bytes at 255)
//! followed by raw bytes, accumulated into a shared byte vector with an
//! offsets column.
//!
//! Two flavors differ only in their wrapping. The plain string field never
//! carries a byte-count header. The library string does when it stands
//! alone (`with_header`), and drops it when an enclosing container already
//! consumed one for the whole run.

use eyre::{ensure, Result};

use crate::buffer::EventBuffer;
use crate::payload::Payload;
use crate::readers::ElementRead;

pub struct TStringReader {
    name: String,
    offsets: Vec<u32>,
    bytes: Vec<u8>,
}

impl TStringReader {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            offsets: vec![0],
            bytes: Vec::new(),
        }
    }
}

impl ElementRead for TStringReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, buffer: &mut EventBuffer<'_>) -> Result<()> {
        let len = buffer.read_string_length()?;
        self.bytes.extend_from_slice(buffer.read_bytes(len as usize)?);
        self.offsets.push(self.bytes.len() as u32);
        Ok(())
    }

    fn finish(&mut self) -> Payload {
        Payload::Bytes {
            offsets: std::mem::replace(&mut self.offsets, vec![0]),
            bytes: std::mem::take(&mut self.bytes),
        }
    }
}

pub struct StlStringReader {
    name: String,
    with_header: bool,
    offsets: Vec<u32>,
    bytes: Vec<u8>,
}

impl StlStringReader {
    pub fn new(name: impl Into<String>, with_header: bool) -> Self {
        Self {
            name: name.into(),
            with_header,
            offsets: vec![0],
            bytes: Vec::new(),
        }
    }

    fn read_body(&mut self, buffer: &mut EventBuffer<'_>) -> Result<()> {
        let len = buffer.read_string_length()?;
        self.bytes.extend_from_slice(buffer.read_bytes(len as usize)?);
        self.offsets.push(self.bytes.len() as u32);
        Ok(())
    }
}

impl ElementRead for StlStringReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, buffer: &mut EventBuffer<'_>) -> Result<()> {
        if self.with_header {
            buffer.read_byte_count()?;
            buffer.read_version()?;
        }
        self.read_body(buffer)
    }

    fn read_count(&mut self, buffer: &mut EventBuffer<'_>, count: i64) -> Result<u32> {
        if count == 0 {
            return Ok(0);
        }
        if count < 0 {
            ensure!(
                self.with_header,
                "{}: negative element count requires a byte-count header",
                self.name
            );
            let nbytes = buffer.read_byte_count()?;
            buffer.read_version()?;

            // the byte count includes the 2-byte version word
            let end = buffer.position() + nbytes as usize - 2;
            let mut consumed = 0;
            while buffer.position() < end {
                self.read_body(buffer)?;
                consumed += 1;
            }
            return Ok(consumed);
        }

        if self.with_header {
            buffer.read_byte_count()?;
            buffer.read_version()?;
        }
        for _ in 0..count {
            self.read_body(buffer)?;
        }
        Ok(count as u32)
    }

    fn read_until(&mut self, buffer: &mut EventBuffer<'_>, end: usize) -> Result<u32> {
        if buffer.position() == end {
            return Ok(0);
        }
        if self.with_header {
            buffer.read_byte_count()?;
            buffer.read_version()?;
        }
        let mut consumed = 0;
        while buffer.position() < end {
            self.read_body(buffer)?;
            consumed += 1;
        }
        Ok(consumed)
    }

    fn finish(&mut self) -> Payload {
        Payload::Bytes {
            offsets: std::mem::replace(&mut self.offsets, vec![0]),
            bytes: std::mem::take(&mut self.bytes),
        }
    }
}
