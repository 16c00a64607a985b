// src/replay.rs
//! The replay loop: pull frames off a recorded stream, apply each event,
//! and append a depth-truncated snapshot line for every event that
//! disturbed the visible top of its book.
//!
//! Any decode or apply failure aborts the run with the offending frame in
//! the error chain. Nothing is written for the failing frame.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use serde_json::json;
use tracing::debug;

use crate::book::{BookKey, Side, Symbol};
use crate::engine::Engine;
use crate::logger;
use crate::metrics::Metrics;
use crate::parser::{FrameReader, Wire};

const ORDER_RESERVE: usize = 65_536;

/// Tuning for one run.
#[derive(Clone, Copy, Debug)]
pub struct ReplayOptions {
    /// Ranks considered visible. An event whose best disturbed rank is at
    /// or beyond this depth emits nothing.
    pub depth: usize,
    pub wire: Wire,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            depth: 2,
            wire: Wire::default(),
        }
    }
}

/// Replays a framed stream, writing snapshot lines to `out`. Returns the
/// final engine state and the run counters.
pub fn replay<R: Read, W: Write>(
    input: R,
    out: &mut W,
    opts: ReplayOptions,
) -> Result<(Engine, Metrics)> {
    let mut frames = FrameReader::new(input, opts.wire);
    let mut engine = Engine::new();
    engine.reserve_orders(ORDER_RESERVE);
    let mut metrics = Metrics::new();

    while let Some(frame) = frames.next_frame()? {
        metrics.record(&frame.event);

        let rank = engine
            .apply(frame.event)
            .with_context(|| format!("frame {}: applying {:?}", frame.seq, frame.event))?;

        if rank < opts.depth {
            // snapshots are labeled with the event's symbol even when the
            // mutation landed under the order's stored one
            let symbol = frame.event.symbol();
            let bids = engine.book().top(
                BookKey {
                    symbol,
                    side: Side::Buy,
                },
                opts.depth,
            );
            let asks = engine.book().top(
                BookKey {
                    symbol,
                    side: Side::Sell,
                },
                opts.depth,
            );
            let line = logger::encode_snapshot_line(frame.seq, symbol, bids, asks);
            out.write_all(&line).context("writing snapshot line")?;
            metrics.inc_snapshot();
        } else {
            metrics.inc_suppressed();
        }
    }

    metrics.bytes = frames.bytes_read();
    debug!("stream end after {} frames", metrics.frames);
    Ok((engine, metrics))
}

/// Replays an in-memory stream image (an mmap'd file or a test fixture).
pub fn replay_bytes<W: Write>(
    bytes: &[u8],
    out: &mut W,
    opts: ReplayOptions,
) -> Result<(Engine, Metrics)> {
    replay(bytes, out, opts)
}

/// Full final book image for every symbol as a JSON document, untruncated
/// and sorted by symbol. Symbols whose books drained to nothing are left out.
pub fn final_snapshot_json(engine: &Engine) -> String {
    let mut symbols: Vec<Symbol> = engine.book().iter().map(|(key, _)| key.symbol).collect();
    symbols.sort();
    symbols.dedup();

    let mut books = serde_json::Map::new();
    for symbol in symbols {
        let bids = engine.book().levels(BookKey {
            symbol,
            side: Side::Buy,
        });
        let asks = engine.book().levels(BookKey {
            symbol,
            side: Side::Sell,
        });
        if bids.is_empty() && asks.is_empty() {
            continue;
        }
        books.insert(symbol.to_string(), json!({ "bids": bids, "asks": asks }));
    }

    json!({ "symbols": books }).to_string()
}
