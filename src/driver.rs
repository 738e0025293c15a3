//! # Decode Driver
//!
//! Walks the per-event offset table, invokes the root reader once per
//! event, and enforces the one invariant everything else leans on: each
//! event must consume exactly its declared byte length. A mismatch means
//! some reader in the tree disagreed with the producer about the format,
//! and continuing would decode garbage silently; the whole call fails and
//! all partially built sinks are discarded.
//!
//! `decode` is synchronous and single-threaded. Independent branches can be
//! decoded in parallel by building independent reader trees over
//! independent buffers.

use eyre::{ensure, Result};
use tracing::trace;

use crate::buffer::EventBuffer;
use crate::payload::Payload;
use crate::readers::ElementRead;

/// Decode one branch: `offsets` has `E + 1` entries delimiting `E` events
/// inside `data`. Returns the root reader's payload; its shape is whatever
/// the root's `finish` produces.
pub fn decode<R>(data: &[u8], offsets: &[u32], root: &mut R) -> Result<Payload>
where
    R: ElementRead + ?Sized,
{
    let mut buffer = EventBuffer::new(data, offsets)?;

    for event in 0..buffer.entry_count() {
        let start = buffer.position();
        let expected = buffer.event_end(event) - buffer.event_start(event);
        trace!(event, start, expected, "decoding event");

        root.read(&mut buffer)?;

        let consumed = buffer.position() - start;
        ensure!(
            consumed == expected,
            "invalid read length for {} at event {}: expected {}, got {}",
            root.name(),
            event,
            expected,
            consumed
        );
    }

    Ok(root.finish())
}

/// Decode a branch of fixed-size records: derives the offset table from a
/// constant per-event byte length and delegates to [`decode`].
pub fn decode_fixed_stride<R>(data: &[u8], stride: usize, root: &mut R) -> Result<Payload>
where
    R: ElementRead + ?Sized,
{
    ensure!(stride > 0, "event stride cannot be 0");
    ensure!(
        data.len() % stride == 0,
        "data length {} is not a multiple of event stride {}",
        data.len(),
        stride
    );
    ensure!(
        data.len() <= u32::MAX as usize,
        "data length {} exceeds the offset table's u32 range",
        data.len()
    );

    let events = data.len() / stride;
    let offsets: Vec<u32> = (0..=events).map(|i| (i * stride) as u32).collect();
    decode(data, &offsets, root)
}
