// src/logger.rs
//! Snapshot line rendering.
//!
//! One line per emitted snapshot:
//!
//! ```text
//! <seq>, <SYM>, [(price, size), ...], [(price, size), ...]
//! ```
//!
//! Bids first, asks second, each list best-first and already truncated to
//! the visible depth by the caller. An empty side renders as `[]`. Lines are
//! built once into an owned buffer so the replay loop never formats through
//! `fmt::Display` on the hot path.

use bytes::Bytes;

use crate::book::{Level, Symbol};

#[inline(always)]
fn push_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(s.as_bytes());
}

fn push_levels(out: &mut Vec<u8>, num: &mut itoa::Buffer, levels: &[Level]) {
    out.push(b'[');
    for (i, lvl) in levels.iter().enumerate() {
        if i != 0 {
            push_str(out, ", ");
        }
        out.push(b'(');
        push_str(out, num.format(lvl.price));
        push_str(out, ", ");
        push_str(out, num.format(lvl.size));
        out.push(b')');
    }
    out.push(b']');
}

/// Renders one snapshot line, newline included.
pub fn encode_snapshot_line(seq: u32, symbol: Symbol, bids: &[Level], asks: &[Level]) -> Bytes {
    let mut out = Vec::with_capacity(24 + (bids.len() + asks.len()) * 24);
    let mut num = itoa::Buffer::new();

    push_str(&mut out, num.format(seq));
    push_str(&mut out, ", ");
    out.extend_from_slice(symbol.as_bytes());
    push_str(&mut out, ", ");
    push_levels(&mut out, &mut num, bids);
    push_str(&mut out, ", ");
    push_levels(&mut out, &mut num, asks);
    out.push(b'\n');

    Bytes::from(out)
}
