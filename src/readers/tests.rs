//! Tests for the reader variants

use super::*;
use crate::buffer::{EventBuffer, BYTE_COUNT_MASK, IS_REFERENCED};
use crate::payload::{FlatColumn, Payload, PrimitiveKind};

/// Big-endian wire builder for test payloads.
struct Wire(Vec<u8>);

impl Wire {
    fn new() -> Self {
        Wire(Vec::new())
    }

    fn u8(&mut self, v: u8) -> &mut Self {
        self.0.push(v);
        self
    }

    fn u16(&mut self, v: u16) -> &mut Self {
        self.0.extend(v.to_be_bytes());
        self
    }

    fn u32(&mut self, v: u32) -> &mut Self {
        self.0.extend(v.to_be_bytes());
        self
    }

    fn i32(&mut self, v: i32) -> &mut Self {
        self.0.extend(v.to_be_bytes());
        self
    }

    fn f64(&mut self, v: f64) -> &mut Self {
        self.0.extend(v.to_be_bytes());
        self
    }

    fn byte_count(&mut self, n: u32) -> &mut Self {
        self.u32(BYTE_COUNT_MASK | n)
    }

    fn version(&mut self, v: i16) -> &mut Self {
        self.0.extend(v.to_be_bytes());
        self
    }

    fn short_str(&mut self, s: &[u8]) -> &mut Self {
        assert!(s.len() < 255);
        self.u8(s.len() as u8);
        self.0.extend_from_slice(s);
        self
    }

    fn raw(&mut self, s: &[u8]) -> &mut Self {
        self.0.extend_from_slice(s);
        self
    }

    fn single_event(self) -> (Vec<u8>, Vec<u32>) {
        let offsets = vec![0, self.0.len() as u32];
        (self.0, offsets)
    }
}

#[test]
fn primitive_reader_collects_one_value_per_read() {
    let mut wire = Wire::new();
    wire.i32(1).i32(-7);
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::primitive("val", PrimitiveKind::I32);
    reader.read(&mut buf).unwrap();
    reader.read(&mut buf).unwrap();

    assert_eq!(reader.finish(), Payload::Flat(FlatColumn::I32(vec![1, -7])));
}

#[test]
fn tstring_reads_empty_and_short_strings() {
    let mut wire = Wire::new();
    wire.short_str(b"foo").short_str(b"");
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::tstring("tag");
    reader.read(&mut buf).unwrap();
    reader.read(&mut buf).unwrap();

    assert_eq!(
        reader.finish(),
        Payload::Bytes {
            offsets: vec![0, 3, 3],
            bytes: b"foo".to_vec(),
        }
    );
}

#[test]
fn tstring_length_boundary_at_255_escapes_to_u32() {
    let mut wire = Wire::new();
    wire.u8(254).raw(&[b'a'; 254]);
    wire.u8(255).u32(255).raw(&[b'b'; 255]);
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::tstring("tag");
    reader.read(&mut buf).unwrap();
    reader.read(&mut buf).unwrap();

    let Payload::Bytes { offsets, bytes } = reader.finish() else {
        panic!("expected a bytes payload");
    };
    assert_eq!(offsets, vec![0, 254, 509]);
    assert_eq!(bytes.len(), 509);
    assert_eq!(&bytes[..254], &[b'a'; 254][..]);
    assert_eq!(&bytes[254..], &[b'b'; 255][..]);
}

#[test]
fn stl_string_with_header_consumes_header_per_read() {
    let mut wire = Wire::new();
    // byte count covers version + length byte + payload
    wire.byte_count(2 + 1 + 3).version(1).short_str(b"abc");
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::stl_string("s", true);
    reader.read(&mut buf).unwrap();
    assert_eq!(buf.position(), data.len());

    assert_eq!(
        reader.finish(),
        Payload::Bytes {
            offsets: vec![0, 3],
            bytes: b"abc".to_vec(),
        }
    );
}

#[test]
fn stl_string_read_count_consumes_header_once() {
    let mut wire = Wire::new();
    wire.byte_count(2 + 3 + 3).version(1);
    wire.short_str(b"ab").short_str(b"cd");
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::stl_string("s", true);
    assert_eq!(reader.read_count(&mut buf, 2).unwrap(), 2);
    assert_eq!(buf.position(), data.len());

    assert_eq!(
        reader.finish(),
        Payload::Bytes {
            offsets: vec![0, 2, 4],
            bytes: b"abcd".to_vec(),
        }
    );
}

#[test]
fn stl_string_negative_count_requires_header() {
    let data = [0u8; 4];
    let offsets = [0u32, 4];
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::stl_string("s", false);
    let err = reader.read_count(&mut buf, -1).unwrap_err();
    assert!(err.to_string().contains("byte-count header"));
    assert!(err.to_string().contains('s'));
}

#[test]
fn stl_seq_read_decodes_header_count_and_elements() {
    let mut wire = Wire::new();
    wire.byte_count(2 + 4 + 16).version(1);
    wire.u32(2).f64(1.0).f64(2.0);
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::stl_sequence("e", true, Reader::primitive("e", PrimitiveKind::F64));
    reader.read(&mut buf).unwrap();
    assert_eq!(buf.position(), data.len());

    assert_eq!(
        reader.finish(),
        Payload::List {
            offsets: vec![0, 2],
            items: Box::new(Payload::Flat(FlatColumn::F64(vec![1.0, 2.0]))),
        }
    );
}

#[test]
fn stl_seq_read_count_zero_consumes_nothing() {
    let data = [0u8; 8];
    let offsets = [0u32, 8];
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::stl_sequence("e", true, Reader::primitive("e", PrimitiveKind::F64));
    assert_eq!(reader.read_count(&mut buf, 0).unwrap(), 0);
    assert_eq!(buf.position(), 0);
}

#[test]
fn stl_seq_read_count_consumes_shared_header_once() {
    let mut wire = Wire::new();
    // one header, then two bare bodies
    wire.byte_count(2 + 2 * (4 + 8)).version(1);
    wire.u32(1).f64(1.5);
    wire.u32(1).f64(2.5);
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::stl_sequence("e", true, Reader::primitive("e", PrimitiveKind::F64));
    assert_eq!(reader.read_count(&mut buf, 2).unwrap(), 2);
    assert_eq!(buf.position(), data.len());

    assert_eq!(
        reader.finish(),
        Payload::List {
            offsets: vec![0, 1, 2],
            items: Box::new(Payload::Flat(FlatColumn::F64(vec![1.5, 2.5]))),
        }
    );
}

#[test]
fn stl_seq_negative_count_is_header_delimited() {
    let mut wire = Wire::new();
    wire.byte_count(2 + 2 * (4 + 8)).version(1);
    wire.u32(1).f64(1.5);
    wire.u32(1).f64(2.5);
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::stl_sequence("e", true, Reader::primitive("e", PrimitiveKind::F64));
    assert_eq!(reader.read_count(&mut buf, -1).unwrap(), 2);
    assert_eq!(buf.position(), data.len());
}

#[test]
fn stl_seq_negative_count_without_header_fails() {
    let data = [0u8; 4];
    let offsets = [0u32, 4];
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::stl_sequence("e", false, Reader::primitive("e", PrimitiveKind::F64));
    let err = reader.read_count(&mut buf, -1).unwrap_err();
    assert!(err.to_string().contains("byte-count header"));
}

#[test]
fn stl_seq_read_until_handles_empty_range_before_header() {
    let data = [0u8; 4];
    let offsets = [0u32, 4];
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::stl_sequence("e", true, Reader::primitive("e", PrimitiveKind::F64));
    assert_eq!(reader.read_until(&mut buf, 0).unwrap(), 0);
    assert_eq!(buf.position(), 0);
}

#[test]
fn stl_map_objectwise_interleaves_keys_and_values() {
    let mut wire = Wire::new();
    wire.byte_count(8 + 4 + 2 * (4 + 8)).raw(&[0u8; 8]);
    wire.u32(2);
    wire.i32(10).f64(1.5);
    wire.i32(20).f64(2.5);
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::stl_map(
        "m",
        true,
        MapLayout::Objectwise,
        Reader::primitive("key", PrimitiveKind::I32),
        Reader::primitive("val", PrimitiveKind::F64),
    );
    reader.read(&mut buf).unwrap();
    assert_eq!(buf.position(), data.len());

    assert_eq!(
        reader.finish(),
        Payload::Map {
            offsets: vec![0, 2],
            keys: Box::new(Payload::Flat(FlatColumn::I32(vec![10, 20]))),
            values: Box::new(Payload::Flat(FlatColumn::F64(vec![1.5, 2.5]))),
        }
    );
}

#[test]
fn stl_map_memberwise_reads_key_column_then_value_column() {
    let mut wire = Wire::new();
    wire.byte_count(8 + 4 + 2 * 4 + 2 * 8).raw(&[0u8; 8]);
    wire.u32(2);
    wire.i32(10).i32(20);
    wire.f64(1.5).f64(2.5);
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::stl_map(
        "m",
        true,
        MapLayout::Memberwise,
        Reader::primitive("key", PrimitiveKind::I32),
        Reader::primitive("val", PrimitiveKind::F64),
    );
    reader.read(&mut buf).unwrap();
    assert_eq!(buf.position(), data.len());

    assert_eq!(
        reader.finish(),
        Payload::Map {
            offsets: vec![0, 2],
            keys: Box::new(Payload::Flat(FlatColumn::I32(vec![10, 20]))),
            values: Box::new(Payload::Flat(FlatColumn::F64(vec![1.5, 2.5]))),
        }
    );
}

#[test]
fn stl_map_negative_count_is_header_delimited() {
    let mut wire = Wire::new();
    // two bare map bodies of one entry each behind a shared header
    wire.byte_count(8 + 2 * (4 + 4 + 8)).raw(&[0u8; 8]);
    wire.u32(1).i32(10).f64(1.5);
    wire.u32(1).i32(20).f64(2.5);
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::stl_map(
        "m",
        true,
        MapLayout::Objectwise,
        Reader::primitive("key", PrimitiveKind::I32),
        Reader::primitive("val", PrimitiveKind::F64),
    );
    assert_eq!(reader.read_count(&mut buf, -1).unwrap(), 2);
    assert_eq!(buf.position(), data.len());
}

#[test]
fn tarray_reads_count_prefixed_primitives() {
    let mut wire = Wire::new();
    wire.u32(3).i32(1).i32(2).i32(3);
    wire.u32(0);
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::tarray("a", PrimitiveKind::I32);
    reader.read(&mut buf).unwrap();
    reader.read(&mut buf).unwrap();

    assert_eq!(
        reader.finish(),
        Payload::List {
            offsets: vec![0, 3, 3],
            items: Box::new(Payload::Flat(FlatColumn::I32(vec![1, 2, 3]))),
        }
    );
}

#[test]
fn nbytes_version_wrapper_accepts_exact_child_length() {
    let mut wire = Wire::new();
    wire.byte_count(2 + 4).version(3).i32(99);
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::nbytes_version("wrap", Reader::primitive("val", PrimitiveKind::I32));
    reader.read(&mut buf).unwrap();
    assert_eq!(reader.finish(), Payload::Flat(FlatColumn::I32(vec![99])));
}

#[test]
fn nbytes_version_wrapper_reports_child_length_mismatch() {
    let mut wire = Wire::new();
    // declares 6 body bytes, child consumes only 4
    wire.byte_count(2 + 6).version(3).i32(99).u16(0);
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::nbytes_version("wrap", Reader::primitive("val", PrimitiveKind::I32));
    let err = reader.read(&mut buf).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("val"), "unexpected message: {msg}");
    assert!(msg.contains("expected 6"), "unexpected message: {msg}");
    assert!(msg.contains("got 4"), "unexpected message: {msg}");
}

#[test]
fn object_header_wrapper_reads_class_name_indirection() {
    let mut wire = Wire::new();
    // byte count covers tag + name + body
    wire.byte_count(4 + 3 + 4);
    wire.u32(0xFFFF_FFFF).raw(b"Ev\0").i32(7);
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::object_header("obj", Reader::primitive("val", PrimitiveKind::I32));
    reader.read(&mut buf).unwrap();
    assert_eq!(buf.position(), data.len());
    assert_eq!(reader.finish(), Payload::Flat(FlatColumn::I32(vec![7])));
}

#[test]
fn object_header_wrapper_accepts_back_reference_tags() {
    let mut wire = Wire::new();
    wire.byte_count(4 + 4);
    wire.u32(0x8000_0002).i32(7);
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::object_header("obj", Reader::primitive("val", PrimitiveKind::I32));
    reader.read(&mut buf).unwrap();
    assert_eq!(buf.position(), data.len());
}

#[test]
fn object_header_wrapper_reports_end_mismatch() {
    let mut wire = Wire::new();
    // declares one byte more than the child will consume
    wire.byte_count(4 + 5);
    wire.u32(0x8000_0002).i32(7).u8(0);
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::object_header("obj", Reader::primitive("val", PrimitiveKind::I32));
    let err = reader.read(&mut buf).unwrap_err();
    assert!(err.to_string().contains("val"));
}

#[test]
fn group_reads_members_in_declared_order() {
    let mut wire = Wire::new();
    wire.i32(5).short_str(b"xy");
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::group(
        "g",
        [
            Reader::primitive("id", PrimitiveKind::I32),
            Reader::tstring("tag"),
        ],
    );
    reader.read(&mut buf).unwrap();

    assert_eq!(
        reader.finish(),
        Payload::Record(vec![
            Payload::Flat(FlatColumn::I32(vec![5])),
            Payload::Bytes {
                offsets: vec![0, 2],
                bytes: b"xy".to_vec(),
            },
        ])
    );
}

#[test]
fn class_body_consumes_header_and_validates_member_span() {
    let mut wire = Wire::new();
    wire.byte_count(2 + 4 + 3).version(2);
    wire.i32(5).short_str(b"xy");
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::class_body(
        "Ev",
        [
            Reader::primitive("id", PrimitiveKind::I32),
            Reader::tstring("tag"),
        ],
    );
    reader.read(&mut buf).unwrap();
    assert_eq!(buf.position(), data.len());
}

#[test]
fn class_body_reports_member_span_mismatch() {
    let mut wire = Wire::new();
    wire.byte_count(2 + 4 + 4).version(2);
    wire.i32(5).short_str(b"xy");
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::class_body(
        "Ev",
        [
            Reader::primitive("id", PrimitiveKind::I32),
            Reader::tstring("tag"),
        ],
    );
    let err = reader.read(&mut buf).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("Ev"), "unexpected message: {msg}");
    assert!(msg.contains("expected 8"), "unexpected message: {msg}");
    assert!(msg.contains("got 7"), "unexpected message: {msg}");
}

#[test]
fn carray_fixed_drives_the_element_count_protocol() {
    let mut wire = Wire::new();
    // fixed array of 2 sequences under one shared header
    wire.byte_count(2 + 2 * (4 + 8)).version(1);
    wire.u32(1).f64(1.0);
    wire.u32(1).f64(2.0);
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::c_array(
        "arr",
        2,
        Reader::stl_sequence("arr", true, Reader::primitive("arr", PrimitiveKind::F64)),
    );
    reader.read(&mut buf).unwrap();
    assert_eq!(buf.position(), data.len());

    // fixed arrays pass the element payload through untouched
    assert_eq!(
        reader.finish(),
        Payload::List {
            offsets: vec![0, 1, 2],
            items: Box::new(Payload::Flat(FlatColumn::F64(vec![1.0, 2.0]))),
        }
    );
}

#[test]
fn carray_unsized_reads_to_the_event_end() {
    let mut wire = Wire::new();
    wire.f64(1.0).f64(2.0).f64(3.0);
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::c_array("arr", -1, Reader::primitive("arr", PrimitiveKind::F64));
    reader.read(&mut buf).unwrap();
    assert_eq!(buf.position(), data.len());

    assert_eq!(
        reader.finish(),
        Payload::List {
            offsets: vec![0, 3],
            items: Box::new(Payload::Flat(FlatColumn::F64(vec![1.0, 2.0, 3.0]))),
        }
    );
}

#[test]
fn carray_rejects_count_and_range_entry_points() {
    let data = [0u8; 8];
    let offsets = [0u32, 8];
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::c_array("arr", 2, Reader::primitive("arr", PrimitiveKind::F64));
    assert!(reader.read_count(&mut buf, 2).is_err());
    assert!(reader.read_until(&mut buf, 8).is_err());
}

#[test]
fn tobject_discard_mode_advances_without_recording() {
    let mut wire = Wire::new();
    wire.version(1).u32(5).u32(IS_REFERENCED).u16(7);
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::tobject("obj", false);
    reader.read(&mut buf).unwrap();
    assert_eq!(buf.position(), data.len());
    assert_eq!(reader.finish(), Payload::None);
}

#[test]
fn tobject_retain_mode_records_reference_words() {
    let mut wire = Wire::new();
    wire.version(1).u32(5).u32(IS_REFERENCED).u16(7);
    wire.version(1).u32(6).u32(0);
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::tobject("obj", true);
    reader.read(&mut buf).unwrap();
    reader.read(&mut buf).unwrap();

    assert_eq!(
        reader.finish(),
        Payload::ObjectRefs {
            unique_ids: vec![5, 6],
            bits: vec![IS_REFERENCED, 0],
            pidf: vec![7],
            pidf_offsets: vec![0, 1, 1],
        }
    );
}

#[test]
fn empty_reader_consumes_nothing() {
    let data = [0xAAu8; 4];
    let offsets = [0u32, 4];
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::empty("gap");
    reader.read(&mut buf).unwrap();
    assert_eq!(buf.position(), 0);
    assert_eq!(reader.finish(), Payload::None);
}

#[test]
fn custom_readers_slot_into_composition() {
    /// Skips a fixed-width trailer the built-ins have no notion of.
    struct TrailerSkipReader {
        name: String,
    }

    impl ElementRead for TrailerSkipReader {
        fn name(&self) -> &str {
            &self.name
        }

        fn read(&mut self, buffer: &mut EventBuffer<'_>) -> eyre::Result<()> {
            buffer.skip(4)
        }

        fn finish(&mut self) -> Payload {
            Payload::None
        }
    }

    let mut wire = Wire::new();
    wire.i32(11).u32(0xDEAD_BEEF);
    let (data, offsets) = wire.single_event();
    let mut buf = EventBuffer::new(&data, &offsets).unwrap();

    let mut reader = Reader::group(
        "g",
        [
            Reader::primitive("id", PrimitiveKind::I32),
            Reader::custom(TrailerSkipReader {
                name: "trailer".to_string(),
            }),
        ],
    );
    reader.read(&mut buf).unwrap();
    assert_eq!(buf.position(), data.len());

    assert_eq!(
        reader.finish(),
        Payload::Record(vec![Payload::Flat(FlatColumn::I32(vec![11])), Payload::None])
    );
}
