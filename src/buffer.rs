//! # Binary Event Buffer
//!
//! This module provides `EventBuffer`, the cursor abstraction over one
//! branch's contiguous byte blob. All multi-byte values on the wire are
//! big-endian; the buffer decodes them into host integers and floats and
//! advances a single mutable cursor.
//!
//! ## Blob Layout
//!
//! ```text
//! +-----------+-----------+-----------+----
//! | event 0   | event 1   | event 2   | ...
//! +-----------+-----------+-----------+----
//! ^           ^           ^
//! offsets[0]  offsets[1]  offsets[2]
//! ```
//!
//! The offset table has `E + 1` entries for `E` events; `offsets[i + 1] -
//! offsets[i]` is event `i`'s byte length. The driver guarantees the cursor
//! sits on `offsets[i]` when event `i` starts and checks it lands on
//! `offsets[i + 1]` when it ends.
//!
//! ## Format-Specific Headers
//!
//! | Header | Encoding |
//! |--------|----------|
//! | byte count | `u32`, bit 30 (`BYTE_COUNT_MASK`) is a mandatory marker, low 30 bits count the bytes that follow (version word included) |
//! | version | `i16` |
//! | short string | `u8` length; `255` escapes to a `u32` length; then raw bytes |
//! | object header | byte count, `u32` tag; tag `NEW_CLASS_TAG` is followed by a null-terminated class name |
//! | object prefix | `i16` version, `u32` unique id, `u32` bits, `u16` pid ref iff `IS_REFERENCED` |
//!
//! ## Error Handling
//!
//! Reads past the end of the blob and byte counts without the marker bit
//! return errors; the per-event length validation in the driver is the
//! semantic backstop for everything else.

use eyre::{ensure, eyre, Result};

/// Object-header tag announcing a class name not seen before in the stream.
pub const NEW_CLASS_TAG: u32 = 0xFFFF_FFFF;
/// Mandatory marker bit of a byte-count word.
pub const BYTE_COUNT_MASK: u32 = 0x4000_0000;
/// Bit set on object-header tags that index a previously seen class.
pub const CLASS_MASK: u32 = 0x8000_0000;
/// Largest representable byte count (low 30 bits of the byte-count word).
pub const MAX_BYTE_COUNT: u32 = 0x3FFF_FFFF;
/// Object bit flag: the instance is referenced elsewhere in the stream and
/// carries a 2-byte process-id reference after its bits word.
pub const IS_REFERENCED: u32 = 1 << 4;
/// Version-word bit flag marking a container streamed memberwise. Variant
/// selection happens at construction time here; the constant is exposed for
/// consumers inspecting raw version words.
pub const STREAMED_MEMBERWISE: u16 = 1 << 14;

/// Decoded object header: where the object's bytes end, and the class name
/// if the tag announced a new class.
#[derive(Debug)]
pub struct ObjectHeader<'a> {
    /// Absolute cursor position at which the object's payload ends.
    pub end: usize,
    /// Class name bytes (without the terminating zero) when the tag was
    /// `NEW_CLASS_TAG`; back-reference tags carry no name.
    pub class_name: Option<&'a [u8]>,
}

/// Cursor over one branch's byte blob and its per-event offset table.
#[derive(Debug)]
pub struct EventBuffer<'a> {
    data: &'a [u8],
    offsets: &'a [u32],
    cursor: usize,
}

impl<'a> EventBuffer<'a> {
    pub fn new(data: &'a [u8], offsets: &'a [u32]) -> Result<Self> {
        ensure!(
            offsets.len() >= 2,
            "event offset table needs at least 2 entries, got {}",
            offsets.len()
        );
        ensure!(
            offsets[0] == 0,
            "event offsets must start at 0, got {}",
            offsets[0]
        );
        ensure!(
            offsets.windows(2).all(|w| w[0] <= w[1]),
            "event offsets must be monotone non-decreasing"
        );
        let total = offsets[offsets.len() - 1] as usize;
        ensure!(
            total == data.len(),
            "event offsets end at {} but data is {} bytes",
            total,
            data.len()
        );
        Ok(Self {
            data,
            offsets,
            cursor: 0,
        })
    }

    /// Number of events delimited by the offset table.
    pub fn entry_count(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn set_position(&mut self, pos: usize) {
        self.cursor = pos;
    }

    /// Absolute start of event `i`.
    pub fn event_start(&self, i: usize) -> usize {
        self.offsets[i] as usize
    }

    /// Absolute end of event `i`.
    pub fn event_end(&self, i: usize) -> usize {
        self.offsets[i + 1] as usize
    }

    /// End of the event the cursor currently sits in: the first event
    /// boundary strictly past the cursor. Used by unsized c-style arrays,
    /// which carry no element count of their own.
    pub fn end_of_current_event(&self) -> Result<usize> {
        self.offsets
            .iter()
            .map(|&off| off as usize)
            .find(|&off| off > self.cursor)
            .ok_or_else(|| {
                eyre!(
                    "cursor {} is at or past the final event boundary {}",
                    self.cursor,
                    self.data.len()
                )
            })
    }

    /// Consume `n` raw bytes, returning them as a slice of the blob.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.cursor.checked_add(n).ok_or_else(|| {
            eyre!("byte length {} overflows at position {}", n, self.cursor)
        })?;
        let bytes = self.data.get(self.cursor..end).ok_or_else(|| {
            eyre!(
                "unexpected end of data: need {} bytes at position {}, only {} remain",
                n,
                self.cursor,
                self.data.len().saturating_sub(self.cursor)
            )
        })?;
        self.cursor = end;
        Ok(bytes)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.read_bytes(n).map(|_| ())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        bytes
            .try_into()
            .map_err(|_| eyre!("insufficient data for {}-byte read", N))
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let [b] = self.read_array::<1>()?;
        Ok(b)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_be_bytes(self.read_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_be_bytes(self.read_array()?))
    }

    /// Boolean wire value: one byte, any nonzero value decodes as true.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// 2-byte signed version word. No validation.
    pub fn read_version(&mut self) -> Result<i16> {
        self.read_i16()
    }

    /// 4-byte byte-count word. The marker bit is mandatory; the returned
    /// value counts the bytes that follow this word, version included.
    pub fn read_byte_count(&mut self) -> Result<u32> {
        let pos = self.cursor;
        let raw = self.read_u32()?;
        ensure!(
            raw & BYTE_COUNT_MASK != 0,
            "invalid byte count at position {}: marker bit missing (raw 0x{:08X})",
            pos,
            raw
        );
        Ok(raw & MAX_BYTE_COUNT)
    }

    /// Length prefix used by string payloads: one byte, with `255` escaping
    /// to a 4-byte length.
    pub fn read_string_length(&mut self) -> Result<u32> {
        let short = self.read_u8()?;
        if short == 255 {
            self.read_u32()
        } else {
            Ok(u32::from(short))
        }
    }

    /// Bytes up to the next zero byte. The cursor advances past the zero;
    /// the returned slice excludes it.
    pub fn read_null_terminated_bytes(&mut self) -> Result<&'a [u8]> {
        let rest = &self.data[self.cursor.min(self.data.len())..];
        let len = rest.iter().position(|&b| b == 0).ok_or_else(|| {
            eyre!("unterminated name at position {}", self.cursor)
        })?;
        let bytes = &rest[..len];
        self.cursor += len + 1;
        Ok(bytes)
    }

    /// Object header: byte count, 4-byte tag, and a null-terminated class
    /// name iff the tag is the new-class sentinel. Back-reference tags name
    /// a previously seen class by index and carry nothing further.
    pub fn read_object_header(&mut self) -> Result<ObjectHeader<'a>> {
        let nbytes = self.read_byte_count()?;
        let end = self.cursor + nbytes as usize;
        let tag = self.read_u32()?;
        let class_name = if tag == NEW_CLASS_TAG {
            Some(self.read_null_terminated_bytes()?)
        } else {
            None
        };
        Ok(ObjectHeader { end, class_name })
    }

    /// Consume a serialized object prefix (version, unique id, bits, and the
    /// process-id reference when the referenced bit is set) without
    /// recording any of it.
    pub fn skip_object_prefix(&mut self) -> Result<()> {
        self.read_version()?;
        self.read_u32()?;
        let bits = self.read_u32()?;
        if bits & IS_REFERENCED != 0 {
            self.skip(2)?;
        }
        Ok(())
    }
}
