//! # rootcol - Columnar Decoder for Hierarchical Binary Branch Payloads
//!
//! rootcol decodes the hierarchical big-endian serialization used to
//! persist arbitrarily nested records inside columnar event containers.
//! Each event is a contiguous byte range produced by a recursive dump
//! routine: a record writes its version header, then its fields in declared
//! order, each field delegating to its own encoding. rootcol walks that
//! recursion in reverse and accumulates every leaf into flat, columnar
//! arrays instead of materializing per-event objects.
//!
//! ## Quick Start
//!
//! ```ignore
//! use rootcol::{decode, PrimitiveKind, Reader};
//!
//! // vector<double> branch: per-event byte-count header, element count,
//! // then the elements
//! let mut root = Reader::stl_sequence(
//!     "energies",
//!     true,
//!     Reader::primitive("energies", PrimitiveKind::F64),
//! );
//! let payload = decode(&data, &event_offsets, &mut root)?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────┐
//! │     Driver (per-event validation)     │
//! ├───────────────────────────────────────┤
//! │  Reader tree (closed sum + customs)   │
//! ├───────────────────────────────────────┤
//! │  EventBuffer (big-endian cursor)      │
//! ├───────────────────────────────────────┤
//! │  Payload sinks (columns + offsets)    │
//! └───────────────────────────────────────┘
//!   Registry/SchemaNode build reader trees
//!   from the metadata layer's descriptions.
//! ```
//!
//! ## Why the Recursion Protocol Matters
//!
//! Simple branches decode with `read` alone. The format's hard cases need
//! two more entry points:
//!
//! - *Memberwise storage* writes one header for a whole run of containers,
//!   then each field's column contiguously; the outer reader drives inner
//!   readers with `read_count`, which consumes the shared header once.
//! - *Unsized c-style arrays* store no element count anywhere; the reader
//!   is driven with `read_until` toward the current event's end position,
//!   which only the per-event offset table knows.
//!
//! ## Guarantees
//!
//! - Every event must decode to exactly its declared byte length; any
//!   disagreement fails the whole decode rather than shifting silently
//!   into garbage.
//! - Byte-count headers are validated for their marker bit; wrapped bodies
//!   are validated against their declared lengths.
//! - All offsets columns start at 0, grow monotonically, and end at the
//!   child payload's length.
//!
//! ## Module Overview
//!
//! - [`buffer`]: cursor over one branch blob, big-endian reads, header
//!   decoding
//! - [`payload`]: columnar result shapes handed back to the caller
//! - [`readers`]: the reader variants and their composition rules
//! - [`driver`]: per-event decode loop and length validation
//! - [`schema`] / [`registry`]: factory surface turning schema node trees
//!   into reader trees, open to user extensions

pub mod buffer;
pub mod driver;
pub mod payload;
pub mod readers;
pub mod registry;
pub mod schema;

pub use buffer::{EventBuffer, ObjectHeader};
pub use driver::{decode, decode_fixed_stride};
pub use payload::{FlatColumn, Payload, PrimitiveKind};
pub use readers::{ElementRead, MapLayout, Reader};
pub use registry::{ReaderFactory, Registry};
pub use schema::SchemaNode;
