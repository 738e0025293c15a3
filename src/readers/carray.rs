//! C-style arrays: a fixed or unsized repetition of one element shape,
//! with no length information of its own on the wire.
//!
//! A positive `flat_size` repeats the element exactly that many times per
//! occurrence (the declared dimensions of the field, flattened). A
//! non-positive `flat_size` means the size is not stored anywhere: the
//! element reader is driven until the end of the current event, located
//! from the per-event offset table. That only works when nothing follows
//! the array inside the event, which the schema layer enforces.
//!
//! The array is a leaf of the count protocol: driving it with `read_count`
//! or `read_until` has no defined wire meaning and is rejected.

use eyre::{bail, Result};
use tracing::trace;

use crate::buffer::EventBuffer;
use crate::payload::Payload;
use crate::readers::{last_offset, ElementRead, Reader};

pub struct CArrayReader {
    name: String,
    flat_size: i64,
    element: Box<Reader>,
    offsets: Vec<u32>,
}

impl CArrayReader {
    pub fn new(name: impl Into<String>, flat_size: i64, element: Reader) -> Self {
        Self {
            name: name.into(),
            flat_size,
            element: Box::new(element),
            offsets: vec![0],
        }
    }
}

impl ElementRead for CArrayReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, buffer: &mut EventBuffer<'_>) -> Result<()> {
        if self.flat_size > 0 {
            self.element.read_count(buffer, self.flat_size)?;
        } else {
            let end = buffer.end_of_current_event()?;
            trace!(reader = %self.name, end, "unsized array, reading to event end");
            let consumed = self.element.read_until(buffer, end)?;
            self.offsets.push(last_offset(&self.offsets) + consumed);
        }
        Ok(())
    }

    fn read_count(&mut self, _buffer: &mut EventBuffer<'_>, _count: i64) -> Result<u32> {
        bail!("{}: count-driven reads of a c-style array are not supported", self.name);
    }

    fn read_until(&mut self, _buffer: &mut EventBuffer<'_>, _end: usize) -> Result<u32> {
        bail!("{}: range-driven reads of a c-style array are not supported", self.name);
    }

    fn finish(&mut self) -> Payload {
        if self.flat_size > 0 {
            self.element.finish()
        } else {
            Payload::List {
                offsets: std::mem::replace(&mut self.offsets, vec![0]),
                items: Box::new(self.element.finish()),
            }
        }
    }
}
