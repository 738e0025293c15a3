//! # Reader Variants
//!
//! One reader decodes one field of a serialized record. Readers compose: a
//! sequence reader owns an element reader, a map reader owns a key and a
//! value reader, wrappers own the reader for their body. The recursion
//! protocol has three entry points:
//!
//! | Entry point | Used for |
//! |-------------|----------|
//! | `read` | one occurrence of the field, headers included |
//! | `read_count` | `n` occurrences back to back; header-carrying variants consume their header once, not `n` times (memberwise layouts, fixed c-style arrays) |
//! | `read_until` | as many occurrences as fit before an absolute end position (unsized c-style arrays) |
//!
//! A negative `read_count` is the "unknown count, header-delimited" sentinel:
//! the variant reads its own byte-count header and consumes bodies until the
//! counted region ends. Only variants constructed `with_header` can honor it.
//!
//! Built-ins form the closed [`Reader`] sum; externally supplied readers
//! implement [`ElementRead`] and slot in through [`Reader::custom`]. The
//! recursion only ever sees the shared capability surface.

use eyre::{ensure, Result};

use crate::buffer::EventBuffer;
use crate::payload::Payload;

mod carray;
mod empty;
mod primitive;
mod stl;
mod string;
mod tarray;
mod tobject;
mod wrap;

#[cfg(test)]
mod tests;

pub use carray::CArrayReader;
pub use empty::EmptyReader;
pub use primitive::PrimitiveReader;
pub use stl::{MapLayout, StlMapReader, StlSeqReader};
pub use string::{StlStringReader, TStringReader};
pub use tarray::TArrayReader;
pub use tobject::TObjectReader;
pub use wrap::{ClassBodyReader, GroupReader, NBytesVersionReader, ObjectHeaderReader};

use crate::payload::PrimitiveKind;

/// Capability surface shared by every reader variant.
pub trait ElementRead {
    /// Debug label, used verbatim in errors and traces.
    fn name(&self) -> &str;

    /// Decode exactly one occurrence of this field from the cursor.
    fn read(&mut self, buffer: &mut EventBuffer<'_>) -> Result<()>;

    /// Decode `count` occurrences back to back, returning how many were
    /// consumed. Negative counts are the header-delimited sentinel and are
    /// only meaningful to variants that own a byte-count header; the default
    /// rejects them and otherwise loops `read`.
    fn read_count(&mut self, buffer: &mut EventBuffer<'_>, count: i64) -> Result<u32> {
        ensure!(
            count >= 0,
            "{}: negative element count requires a byte-count header",
            self.name()
        );
        for _ in 0..count {
            self.read(buffer)?;
        }
        Ok(count as u32)
    }

    /// Decode occurrences until the cursor reaches the absolute position
    /// `end`, returning how many were consumed.
    fn read_until(&mut self, buffer: &mut EventBuffer<'_>, end: usize) -> Result<u32> {
        let mut consumed = 0;
        while buffer.position() < end {
            self.read(buffer)?;
            consumed += 1;
        }
        Ok(consumed)
    }

    /// Surrender the accumulated sinks.
    fn finish(&mut self) -> Payload;
}

/// The closed set of built-in readers, plus an escape hatch for externally
/// supplied implementations. Built-ins dispatch statically; custom readers
/// go through the trait object. Composition always stores `Reader`, so a
/// custom reader can sit anywhere a built-in can.
pub enum Reader {
    Primitive(PrimitiveReader),
    TObject(TObjectReader),
    TString(TStringReader),
    StlString(StlStringReader),
    StlSeq(StlSeqReader),
    StlMap(StlMapReader),
    TArray(TArrayReader),
    NBytesVersion(NBytesVersionReader),
    ObjectHeader(ObjectHeaderReader),
    Group(GroupReader),
    ClassBody(ClassBodyReader),
    CArray(CArrayReader),
    Empty(EmptyReader),
    Custom(Box<dyn ElementRead>),
}

impl Reader {
    pub fn primitive(name: impl Into<String>, kind: PrimitiveKind) -> Reader {
        Reader::Primitive(PrimitiveReader::new(name, kind))
    }

    pub fn tobject(name: impl Into<String>, retain: bool) -> Reader {
        Reader::TObject(TObjectReader::new(name, retain))
    }

    pub fn tstring(name: impl Into<String>) -> Reader {
        Reader::TString(TStringReader::new(name))
    }

    pub fn stl_string(name: impl Into<String>, with_header: bool) -> Reader {
        Reader::StlString(StlStringReader::new(name, with_header))
    }

    pub fn stl_sequence(name: impl Into<String>, with_header: bool, element: Reader) -> Reader {
        Reader::StlSeq(StlSeqReader::new(name, with_header, element))
    }

    pub fn stl_map(
        name: impl Into<String>,
        with_header: bool,
        layout: MapLayout,
        key: Reader,
        value: Reader,
    ) -> Reader {
        Reader::StlMap(StlMapReader::new(name, with_header, layout, key, value))
    }

    pub fn tarray(name: impl Into<String>, kind: PrimitiveKind) -> Reader {
        Reader::TArray(TArrayReader::new(name, kind))
    }

    pub fn nbytes_version(name: impl Into<String>, element: Reader) -> Reader {
        Reader::NBytesVersion(NBytesVersionReader::new(name, element))
    }

    pub fn object_header(name: impl Into<String>, element: Reader) -> Reader {
        Reader::ObjectHeader(ObjectHeaderReader::new(name, element))
    }

    pub fn group(name: impl Into<String>, members: impl IntoIterator<Item = Reader>) -> Reader {
        Reader::Group(GroupReader::new(name, members))
    }

    pub fn class_body(
        name: impl Into<String>,
        members: impl IntoIterator<Item = Reader>,
    ) -> Reader {
        Reader::ClassBody(ClassBodyReader::new(name, members))
    }

    pub fn c_array(name: impl Into<String>, flat_size: i64, element: Reader) -> Reader {
        Reader::CArray(CArrayReader::new(name, flat_size, element))
    }

    pub fn empty(name: impl Into<String>) -> Reader {
        Reader::Empty(EmptyReader::new(name))
    }

    pub fn custom(reader: impl ElementRead + 'static) -> Reader {
        Reader::Custom(Box::new(reader))
    }
}

impl ElementRead for Reader {
    fn name(&self) -> &str {
        match self {
            Reader::Primitive(r) => r.name(),
            Reader::TObject(r) => r.name(),
            Reader::TString(r) => r.name(),
            Reader::StlString(r) => r.name(),
            Reader::StlSeq(r) => r.name(),
            Reader::StlMap(r) => r.name(),
            Reader::TArray(r) => r.name(),
            Reader::NBytesVersion(r) => r.name(),
            Reader::ObjectHeader(r) => r.name(),
            Reader::Group(r) => r.name(),
            Reader::ClassBody(r) => r.name(),
            Reader::CArray(r) => r.name(),
            Reader::Empty(r) => r.name(),
            Reader::Custom(r) => r.name(),
        }
    }

    fn read(&mut self, buffer: &mut EventBuffer<'_>) -> Result<()> {
        match self {
            Reader::Primitive(r) => r.read(buffer),
            Reader::TObject(r) => r.read(buffer),
            Reader::TString(r) => r.read(buffer),
            Reader::StlString(r) => r.read(buffer),
            Reader::StlSeq(r) => r.read(buffer),
            Reader::StlMap(r) => r.read(buffer),
            Reader::TArray(r) => r.read(buffer),
            Reader::NBytesVersion(r) => r.read(buffer),
            Reader::ObjectHeader(r) => r.read(buffer),
            Reader::Group(r) => r.read(buffer),
            Reader::ClassBody(r) => r.read(buffer),
            Reader::CArray(r) => r.read(buffer),
            Reader::Empty(r) => r.read(buffer),
            Reader::Custom(r) => r.read(buffer),
        }
    }

    fn read_count(&mut self, buffer: &mut EventBuffer<'_>, count: i64) -> Result<u32> {
        match self {
            Reader::Primitive(r) => r.read_count(buffer, count),
            Reader::TObject(r) => r.read_count(buffer, count),
            Reader::TString(r) => r.read_count(buffer, count),
            Reader::StlString(r) => r.read_count(buffer, count),
            Reader::StlSeq(r) => r.read_count(buffer, count),
            Reader::StlMap(r) => r.read_count(buffer, count),
            Reader::TArray(r) => r.read_count(buffer, count),
            Reader::NBytesVersion(r) => r.read_count(buffer, count),
            Reader::ObjectHeader(r) => r.read_count(buffer, count),
            Reader::Group(r) => r.read_count(buffer, count),
            Reader::ClassBody(r) => r.read_count(buffer, count),
            Reader::CArray(r) => r.read_count(buffer, count),
            Reader::Empty(r) => r.read_count(buffer, count),
            Reader::Custom(r) => r.read_count(buffer, count),
        }
    }

    fn read_until(&mut self, buffer: &mut EventBuffer<'_>, end: usize) -> Result<u32> {
        match self {
            Reader::Primitive(r) => r.read_until(buffer, end),
            Reader::TObject(r) => r.read_until(buffer, end),
            Reader::TString(r) => r.read_until(buffer, end),
            Reader::StlString(r) => r.read_until(buffer, end),
            Reader::StlSeq(r) => r.read_until(buffer, end),
            Reader::StlMap(r) => r.read_until(buffer, end),
            Reader::TArray(r) => r.read_until(buffer, end),
            Reader::NBytesVersion(r) => r.read_until(buffer, end),
            Reader::ObjectHeader(r) => r.read_until(buffer, end),
            Reader::Group(r) => r.read_until(buffer, end),
            Reader::ClassBody(r) => r.read_until(buffer, end),
            Reader::CArray(r) => r.read_until(buffer, end),
            Reader::Empty(r) => r.read_until(buffer, end),
            Reader::Custom(r) => r.read_until(buffer, end),
        }
    }

    fn finish(&mut self) -> Payload {
        match self {
            Reader::Primitive(r) => r.finish(),
            Reader::TObject(r) => r.finish(),
            Reader::TString(r) => r.finish(),
            Reader::StlString(r) => r.finish(),
            Reader::StlSeq(r) => r.finish(),
            Reader::StlMap(r) => r.finish(),
            Reader::TArray(r) => r.finish(),
            Reader::NBytesVersion(r) => r.finish(),
            Reader::ObjectHeader(r) => r.finish(),
            Reader::Group(r) => r.finish(),
            Reader::ClassBody(r) => r.finish(),
            Reader::CArray(r) => r.finish(),
            Reader::Empty(r) => r.finish(),
            Reader::Custom(r) => r.finish(),
        }
    }
}

impl std::fmt::Debug for Reader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let variant = match self {
            Reader::Primitive(_) => "Primitive",
            Reader::TObject(_) => "TObject",
            Reader::TString(_) => "TString",
            Reader::StlString(_) => "StlString",
            Reader::StlSeq(_) => "StlSeq",
            Reader::StlMap(_) => "StlMap",
            Reader::TArray(_) => "TArray",
            Reader::NBytesVersion(_) => "NBytesVersion",
            Reader::ObjectHeader(_) => "ObjectHeader",
            Reader::Group(_) => "Group",
            Reader::ClassBody(_) => "ClassBody",
            Reader::CArray(_) => "CArray",
            Reader::Empty(_) => "Empty",
            Reader::Custom(_) => "Custom",
        };
        f.debug_struct("Reader")
            .field("variant", &variant)
            .field("name", &self.name())
            .finish()
    }
}

/// Last value of an offsets vector. Offsets vectors are seeded with a
/// leading 0, so this is total element count so far.
pub(crate) fn last_offset(offsets: &[u32]) -> u32 {
    offsets.last().copied().unwrap_or(0)
}
