// src/parser.rs
//! Wire decoding: the length-prefixed frame envelope and the tagged message
//! bodies inside it.
//!
//! Every frame is `seq: u32 | msg_size: u32 | body[msg_size]`, all integers
//! little-endian. The body starts with a one-byte kind tag; field layouts per
//! kind are fixed except for an optional reserved tail after an update's
//! price, which differs between recorded stream dialects (see [`Wire`]).
//! Bytes the body declares beyond the fields a kind defines are absorbed by
//! the envelope, never interpreted.

use std::io::Read;

use anyhow::{bail, Context, Result};
use bytes::Buf;
use thiserror::Error;

use crate::book::{OrderId, Side, Symbol};
use crate::engine::Event;

/// Frame header: sequence number plus body length, 4 bytes each.
pub const HEADER_LEN: usize = 8;

/// Stream dialect knobs.
#[derive(Clone, Copy, Debug)]
pub struct Wire {
    /// Reserved bytes after an update's price field. One recorded dialect
    /// pads four, the other none. Either way the envelope skips whatever
    /// the fields leave unconsumed, so this only matters when the declared
    /// body size is tight.
    pub update_tail: usize,
}

impl Default for Wire {
    fn default() -> Self {
        Wire { update_tail: 0 }
    }
}

/// Malformed-input failures. All fatal: resynchronizing a framed stream
/// after a bad record is guesswork.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown message tag {tag:#04x}")]
    UnknownTag { tag: u8 },
    #[error("unknown side byte {side:#04x}")]
    UnknownSide { side: u8 },
    #[error("message body truncated, {missing} byte(s) short")]
    Truncated { missing: usize },
}

/// One framed record: the envelope's sequence number and its decoded event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    pub seq: u32,
    pub event: Event,
}

/// Pulls frames off a byte stream until a clean end of input.
///
/// End of input is only clean on a frame boundary: running dry inside a
/// header or a declared body is an error.
pub struct FrameReader<R> {
    rd: R,
    wire: Wire,
    body: Vec<u8>,
    consumed: u64,
}

impl<R: Read> FrameReader<R> {
    pub fn new(rd: R, wire: Wire) -> Self {
        Self {
            rd,
            wire,
            body: Vec::new(),
            consumed: 0,
        }
    }

    /// Bytes consumed so far, headers included.
    #[inline]
    pub fn bytes_read(&self) -> u64 {
        self.consumed
    }

    /// The next frame, or `None` once the stream ends cleanly.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut header = [0u8; HEADER_LEN];
        if !read_or_eof(&mut self.rd, &mut header)
            .with_context(|| format!("frame header at byte {}", self.consumed))?
        {
            return Ok(None);
        }

        let mut h = &header[..];
        let seq = h.get_u32_le();
        let size = h.get_u32_le() as usize;

        self.body.resize(size, 0);
        self.rd
            .read_exact(&mut self.body)
            .with_context(|| format!("frame {seq}: reading {size}-byte body"))?;
        self.consumed += (HEADER_LEN + size) as u64;

        let event = decode_message(&self.body, self.wire).with_context(|| format!("frame {seq}"))?;
        Ok(Some(Frame { seq, event }))
    }
}

/// Fills `buf` fully, or reports a clean end of input if not a single byte
/// was available.
fn read_or_eof<R: Read>(rd: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = match rd.read(&mut buf[filled..]) {
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        if n == 0 {
            if filled == 0 {
                return Ok(false);
            }
            bail!("stream ends mid-record ({filled} of {} bytes)", buf.len());
        }
        filled += n;
    }
    Ok(true)
}

/// Decodes one message body, tag byte first.
///
/// Consumes exactly the fields the kind defines plus its reserved padding;
/// anything left over in `body` is the envelope's concern.
pub fn decode_message(body: &[u8], wire: Wire) -> Result<Event, DecodeError> {
    let mut buf = body;
    let tag = take_u8(&mut buf)?;
    match tag {
        b'A' => {
            let (symbol, order_id, side) = take_preamble(&mut buf)?;
            let size = take_u64(&mut buf)?;
            let price = take_i32(&mut buf)?;
            Ok(Event::Add {
                symbol,
                order_id,
                side,
                size,
                price,
            })
        }
        b'U' => {
            let (symbol, order_id, side) = take_preamble(&mut buf)?;
            let size = take_u64(&mut buf)?;
            let price = take_i32(&mut buf)?;
            skip(&mut buf, wire.update_tail)?;
            Ok(Event::Update {
                symbol,
                order_id,
                side,
                size,
                price,
            })
        }
        b'D' => {
            let (symbol, order_id, side) = take_preamble(&mut buf)?;
            Ok(Event::Delete {
                symbol,
                order_id,
                side,
            })
        }
        b'E' => {
            let (symbol, order_id, side) = take_preamble(&mut buf)?;
            let traded = take_u64(&mut buf)?;
            Ok(Event::Execute {
                symbol,
                order_id,
                side,
                traded,
            })
        }
        other => Err(DecodeError::UnknownTag { tag: other }),
    }
}

// Fields shared by every kind: symbol, order id, side, 3 reserved bytes.
fn take_preamble(buf: &mut &[u8]) -> Result<(Symbol, OrderId, Side), DecodeError> {
    let symbol = take_symbol(buf)?;
    let order_id = take_u64(buf)?;
    let side = take_side(buf)?;
    skip(buf, 3)?;
    Ok((symbol, order_id, side))
}

#[inline]
fn need(buf: &[u8], n: usize) -> Result<(), DecodeError> {
    if buf.len() < n {
        Err(DecodeError::Truncated {
            missing: n - buf.len(),
        })
    } else {
        Ok(())
    }
}

#[inline]
fn take_u8(buf: &mut &[u8]) -> Result<u8, DecodeError> {
    need(buf, 1)?;
    Ok(buf.get_u8())
}

#[inline]
fn take_u64(buf: &mut &[u8]) -> Result<u64, DecodeError> {
    need(buf, 8)?;
    Ok(buf.get_u64_le())
}

#[inline]
fn take_i32(buf: &mut &[u8]) -> Result<i32, DecodeError> {
    need(buf, 4)?;
    Ok(buf.get_i32_le())
}

#[inline]
fn take_symbol(buf: &mut &[u8]) -> Result<Symbol, DecodeError> {
    need(buf, 3)?;
    let mut raw = [0u8; 3];
    buf.copy_to_slice(&mut raw);
    Ok(Symbol::new(raw))
}

#[inline]
fn take_side(buf: &mut &[u8]) -> Result<Side, DecodeError> {
    need(buf, 1)?;
    match buf.get_u8() {
        b'B' => Ok(Side::Buy),
        b'S' => Ok(Side::Sell),
        other => Err(DecodeError::UnknownSide { side: other }),
    }
}

#[inline]
fn skip(buf: &mut &[u8], n: usize) -> Result<(), DecodeError> {
    need(buf, n)?;
    buf.advance(n);
    Ok(())
}

/// Wire encoders, the mirror of [`decode_message`]. Used to fabricate
/// stream files for tests and benches.
pub mod encode {
    use bytes::BufMut;

    use crate::book::{OrderId, Price, Qty, Side, Symbol};

    fn side_byte(side: Side) -> u8 {
        match side {
            Side::Buy => b'B',
            Side::Sell => b'S',
        }
    }

    fn put_preamble(out: &mut Vec<u8>, tag: u8, symbol: Symbol, order_id: OrderId, side: Side) {
        out.put_u8(tag);
        out.put_slice(symbol.as_bytes());
        out.put_u64_le(order_id);
        out.put_u8(side_byte(side));
        out.put_bytes(0, 3);
    }

    /// Wraps a message body in the frame envelope.
    pub fn frame(seq: u32, body: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + body.len());
        out.put_u32_le(seq);
        out.put_u32_le(body.len() as u32);
        out.put_slice(body);
        out
    }

    pub fn add(symbol: Symbol, order_id: OrderId, side: Side, size: Qty, price: Price) -> Vec<u8> {
        let mut out = Vec::with_capacity(28);
        put_preamble(&mut out, b'A', symbol, order_id, side);
        out.put_u64_le(size);
        out.put_i32_le(price);
        out
    }

    /// `tail` is the dialect's reserved padding after the price.
    pub fn update(
        symbol: Symbol,
        order_id: OrderId,
        side: Side,
        size: Qty,
        price: Price,
        tail: usize,
    ) -> Vec<u8> {
        let mut out = Vec::with_capacity(28 + tail);
        put_preamble(&mut out, b'U', symbol, order_id, side);
        out.put_u64_le(size);
        out.put_i32_le(price);
        out.put_bytes(0, tail);
        out
    }

    pub fn delete(symbol: Symbol, order_id: OrderId, side: Side) -> Vec<u8> {
        let mut out = Vec::with_capacity(16);
        put_preamble(&mut out, b'D', symbol, order_id, side);
        out
    }

    pub fn execute(symbol: Symbol, order_id: OrderId, side: Side, traded: Qty) -> Vec<u8> {
        let mut out = Vec::with_capacity(24);
        put_preamble(&mut out, b'E', symbol, order_id, side);
        out.put_u64_le(traded);
        out
    }
}
