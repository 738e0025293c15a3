//! Wrappers and aggregates: the byte-count+version wrapper, the
//! object-header wrapper, the bare field group, and the named-class body.
//!
//! The two wrappers are the format's length-validation points: each records
//! where its body must end and fails the decode if the wrapped reader lands
//! anywhere else. Catching the drift here, at the innermost counted region,
//! names the reader that actually misread instead of letting the error
//! surface events later at the driver.

use eyre::{ensure, Result};

use crate::buffer::EventBuffer;
use crate::payload::Payload;
use crate::readers::{ElementRead, Reader};

/// Byte count + version, then one body whose length must match the count.
pub struct NBytesVersionReader {
    name: String,
    element: Box<Reader>,
}

impl NBytesVersionReader {
    pub fn new(name: impl Into<String>, element: Reader) -> Self {
        Self {
            name: name.into(),
            element: Box::new(element),
        }
    }
}

impl ElementRead for NBytesVersionReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, buffer: &mut EventBuffer<'_>) -> Result<()> {
        let nbytes = buffer.read_byte_count()?;
        ensure!(
            nbytes >= 2,
            "{}: byte count {} cannot cover its version word",
            self.name,
            nbytes
        );
        buffer.read_version()?;

        // the byte count includes the 2-byte version word
        let expected = nbytes as usize - 2;
        let start = buffer.position();
        self.element.read(buffer)?;
        let consumed = buffer.position() - start;

        ensure!(
            consumed == expected,
            "invalid read length for {}: expected {}, got {}",
            self.element.name(),
            expected,
            consumed
        );
        Ok(())
    }

    fn finish(&mut self) -> Payload {
        self.element.finish()
    }
}

/// Object header (byte count, tag, optional class name), then one body
/// that must end exactly where the header said the object ends.
pub struct ObjectHeaderReader {
    name: String,
    element: Box<Reader>,
}

impl ObjectHeaderReader {
    pub fn new(name: impl Into<String>, element: Reader) -> Self {
        Self {
            name: name.into(),
            element: Box::new(element),
        }
    }
}

impl ElementRead for ObjectHeaderReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, buffer: &mut EventBuffer<'_>) -> Result<()> {
        let header = buffer.read_object_header()?;
        let start = buffer.position();
        self.element.read(buffer)?;

        ensure!(
            buffer.position() == header.end,
            "invalid read length for {}: expected {}, got {}",
            self.element.name(),
            header.end.saturating_sub(start),
            buffer.position() - start
        );
        Ok(())
    }

    fn finish(&mut self) -> Payload {
        self.element.finish()
    }
}

/// Ordered heterogeneous fields, no header of its own.
pub struct GroupReader {
    name: String,
    members: Vec<Reader>,
}

impl GroupReader {
    pub fn new(name: impl Into<String>, members: impl IntoIterator<Item = Reader>) -> Self {
        Self {
            name: name.into(),
            members: members.into_iter().collect(),
        }
    }
}

impl ElementRead for GroupReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, buffer: &mut EventBuffer<'_>) -> Result<()> {
        for member in &mut self.members {
            member.read(buffer)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Payload {
        Payload::Record(self.members.iter_mut().map(ElementRead::finish).collect())
    }
}

/// A named class body: one byte-count+version header bracketing the
/// members in declared order. Behaves like the byte-count wrapper around a
/// group, kept as its own variant because every user-defined record starts
/// this way.
pub struct ClassBodyReader {
    name: String,
    members: Vec<Reader>,
}

impl ClassBodyReader {
    pub fn new(name: impl Into<String>, members: impl IntoIterator<Item = Reader>) -> Self {
        Self {
            name: name.into(),
            members: members.into_iter().collect(),
        }
    }
}

impl ElementRead for ClassBodyReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, buffer: &mut EventBuffer<'_>) -> Result<()> {
        let nbytes = buffer.read_byte_count()?;
        ensure!(
            nbytes >= 2,
            "{}: byte count {} cannot cover its version word",
            self.name,
            nbytes
        );
        buffer.read_version()?;

        // the byte count includes the 2-byte version word
        let expected = nbytes as usize - 2;
        let start = buffer.position();
        for member in &mut self.members {
            member.read(buffer)?;
        }
        let consumed = buffer.position() - start;

        ensure!(
            consumed == expected,
            "invalid read length for {}: expected {}, got {}",
            self.name,
            expected,
            consumed
        );
        Ok(())
    }

    fn finish(&mut self) -> Payload {
        Payload::Record(self.members.iter_mut().map(ElementRead::finish).collect())
    }
}
