//! Library containers: variable-length sequences and maps.
//!
//! Both own their element readers and an offsets column, and both expose
//! all three recursion entry points. The header question is the subtle
//! part: a standalone container carries a byte-count header per occurrence,
//! but a container nested under another container shares its parent's
//! header and reads bare bodies. The `with_header` construction flag
//! records which situation this reader was built for; `read` always
//! consumes a header (the standalone case), while `read_count` and
//! `read_until` consult the flag because they are exactly the entry points
//! an enclosing container drives.
//!
//! A sequence header is byte count + version. A map header is byte count +
//! 8 opaque bytes, skipped without interpretation.

use eyre::{ensure, Result};
use tracing::trace;

use crate::buffer::EventBuffer;
use crate::payload::Payload;
use crate::readers::{last_offset, ElementRead, Reader};

pub struct StlSeqReader {
    name: String,
    with_header: bool,
    element: Box<Reader>,
    offsets: Vec<u32>,
}

impl StlSeqReader {
    pub fn new(name: impl Into<String>, with_header: bool, element: Reader) -> Self {
        Self {
            name: name.into(),
            with_header,
            element: Box::new(element),
            offsets: vec![0],
        }
    }

    /// One sequence body: element count, then that many elements. The
    /// element reader is driven through `read_count` so nested containers
    /// consume their shared header once.
    fn read_body(&mut self, buffer: &mut EventBuffer<'_>) -> Result<()> {
        let size = buffer.read_u32()?;
        self.offsets.push(last_offset(&self.offsets) + size);
        self.element.read_count(buffer, i64::from(size))?;
        Ok(())
    }
}

impl ElementRead for StlSeqReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, buffer: &mut EventBuffer<'_>) -> Result<()> {
        buffer.read_byte_count()?;
        buffer.read_version()?;
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
            trace!(reader = %self.name, consumed, "header-delimited sequence run");
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
        Payload::List {
            offsets: std::mem::replace(&mut self.offsets, vec![0]),
            items: Box::new(self.element.finish()),
        }
    }
}

/// How a map's entries are laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapLayout {
    /// Key, value, key, value: one interleaved pair per entry.
    Objectwise,
    /// All keys contiguous, then all values contiguous.
    Memberwise,
}

pub struct StlMapReader {
    name: String,
    with_header: bool,
    layout: MapLayout,
    key: Box<Reader>,
    value: Box<Reader>,
    offsets: Vec<u32>,
}

impl StlMapReader {
    pub fn new(
        name: impl Into<String>,
        with_header: bool,
        layout: MapLayout,
        key: Reader,
        value: Reader,
    ) -> Self {
        Self {
            name: name.into(),
            with_header,
            layout,
            key: Box::new(key),
            value: Box::new(value),
            offsets: vec![0],
        }
    }

    fn read_header(buffer: &mut EventBuffer<'_>) -> Result<u32> {
        let nbytes = buffer.read_byte_count()?;
        buffer.skip(8)?;
        Ok(nbytes)
    }

    fn read_body(&mut self, buffer: &mut EventBuffer<'_>) -> Result<()> {
        let size = buffer.read_u32()?;
        self.offsets.push(last_offset(&self.offsets) + size);

        match self.layout {
            MapLayout::Objectwise => {
                for _ in 0..size {
                    self.key.read(buffer)?;
                    self.value.read(buffer)?;
                }
            }
            MapLayout::Memberwise => {
                self.key.read_count(buffer, i64::from(size))?;
                self.value.read_count(buffer, i64::from(size))?;
            }
        }
        Ok(())
    }
}

impl ElementRead for StlMapReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, buffer: &mut EventBuffer<'_>) -> Result<()> {
        Self::read_header(buffer)?;
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
            let nbytes = Self::read_header(buffer)?;

            // the byte count includes the 8 opaque preamble bytes
            let end = buffer.position() + nbytes as usize - 8;
            let mut consumed = 0;
            while buffer.position() < end {
                self.read_body(buffer)?;
                consumed += 1;
            }
            trace!(reader = %self.name, consumed, "header-delimited map run");
            return Ok(consumed);
        }

        if self.with_header {
            Self::read_header(buffer)?;
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
            Self::read_header(buffer)?;
        }
        let mut consumed = 0;
        while buffer.position() < end {
            self.read_body(buffer)?;
            consumed += 1;
        }
        Ok(consumed)
    }

    fn finish(&mut self) -> Payload {
        Payload::Map {
            offsets: std::mem::replace(&mut self.offsets, vec![0]),
            keys: Box::new(self.key.finish()),
            values: Box::new(self.value.finish()),
        }
    }
}
