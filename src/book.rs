// src/book.rs
//! Price-aggregated book state.
//!
//! Each `(symbol, side)` pair owns an independent ladder of price levels kept
//! sorted best-first: descending prices for bids, ascending for asks. A level
//! is a distinct price plus the summed size of every live order resting there.
//! Levels are born on the first positive delta at a new price and die when
//! their size drains back to zero.
//!
//! [`LevelBook::apply`] is the single mutation entry point. It returns the
//! rank of the level it touched (0 = best), which is what snapshot gating
//! upstream keys on.
//!
//! ## Example
//!
//! ```rust
//! use bookfeed::book::{BookKey, Level, LevelBook, Side, Symbol};
//!
//! let mut book = LevelBook::new();
//! let key = BookKey { symbol: Symbol::new(*b"VOD"), side: Side::Buy };
//!
//! book.apply(key, 100, 1000).unwrap();
//! let rank = book.apply(key, 50, 1005).unwrap();
//! assert_eq!(rank, 0); // the better bid lands at the front
//! assert_eq!(
//!     book.levels(key),
//!     &[Level { price: 1005, size: 50 }, Level { price: 1000, size: 100 }]
//! );
//! ```

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub type OrderId = u64;
pub type Price = i32;
pub type Qty = u64;

/// Book side. Also fixes the sort direction of the side's ladder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Orders `a` relative to `b` within this side's ladder: asks ascend,
    /// bids descend, so `Less` always means closer to the top of the book.
    #[inline]
    pub fn cmp_prices(self, a: Price, b: Price) -> Ordering {
        match self {
            Side::Sell => a.cmp(&b),
            Side::Buy => b.cmp(&a),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("Buy"),
            Side::Sell => f.write_str("Sell"),
        }
    }
}

/// Instrument code exactly as it travels on the wire: three raw bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol([u8; 3]);

impl Symbol {
    #[inline]
    pub const fn new(raw: [u8; 3]) -> Self {
        Symbol(raw)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 3] {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii() && !b.is_ascii_control() {
                char::from(b)
            } else {
                '?'
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({self})")
    }
}

/// One price level: a distinct price and the size aggregated across every
/// live order resting at it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Level {
    pub price: Price,
    pub size: Qty,
}

/// Addresses one ladder. Ladders never mix symbols or sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BookKey {
    pub symbol: Symbol,
    pub side: Side,
}

/// Book-side consistency failures. All fatal: the stream claimed exposure
/// the book does not hold.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookError {
    #[error("level {price} on {symbol}/{side} holds {have}, cannot remove {want}")]
    LevelUnderflow {
        symbol: Symbol,
        side: Side,
        price: Price,
        have: Qty,
        want: Qty,
    },
    #[error("no level at {price} on {symbol}/{side} to remove size from")]
    MissingLevel {
        symbol: Symbol,
        side: Side,
        price: Price,
    },
    #[error("level {price} on {symbol}/{side} overflows its aggregated size")]
    SizeOverflow {
        symbol: Symbol,
        side: Side,
        price: Price,
    },
}

/// Sorted price-level ladders, one per `(symbol, side)`.
#[derive(Debug, Default)]
pub struct LevelBook {
    ladders: hashbrown::HashMap<BookKey, Vec<Level>>,
}

impl LevelBook {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// All levels under `key`, best price first. Empty slice for an unknown
    /// or fully drained ladder.
    #[inline]
    pub fn levels(&self, key: BookKey) -> &[Level] {
        self.ladders.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The best `depth` levels under `key`, best first.
    #[inline]
    pub fn top(&self, key: BookKey, depth: usize) -> &[Level] {
        let all = self.levels(key);
        &all[..depth.min(all.len())]
    }

    /// Every ladder currently held, drained ones included.
    pub fn iter(&self) -> impl Iterator<Item = (BookKey, &[Level])> + '_ {
        self.ladders.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Applies a signed size delta at `price` and returns the rank of the
    /// level it touched (0 = best).
    ///
    /// A positive delta at an unseen price inserts a level at its sorted
    /// position. A negative delta must land on an existing level holding at
    /// least that much size; draining a level to zero removes it, pulling
    /// deeper levels up one rank. A non-positive delta at an unseen price
    /// means the stream and the book disagree, which is unrecoverable.
    pub fn apply(&mut self, key: BookKey, delta: i64, price: Price) -> Result<usize, BookError> {
        let ladder = self.ladders.entry(key).or_default();
        match ladder.binary_search_by(|lvl| key.side.cmp_prices(lvl.price, price)) {
            Ok(rank) => {
                let lvl = &mut ladder[rank];
                if delta >= 0 {
                    let Some(grown) = lvl.size.checked_add(delta as Qty) else {
                        return Err(BookError::SizeOverflow {
                            symbol: key.symbol,
                            side: key.side,
                            price,
                        });
                    };
                    lvl.size = grown;
                } else {
                    let take = delta.unsigned_abs();
                    if take > lvl.size {
                        return Err(BookError::LevelUnderflow {
                            symbol: key.symbol,
                            side: key.side,
                            price,
                            have: lvl.size,
                            want: take,
                        });
                    }
                    lvl.size -= take;
                    if lvl.size == 0 {
                        ladder.remove(rank);
                    }
                }
                Ok(rank)
            }
            Err(rank) => {
                if delta <= 0 {
                    return Err(BookError::MissingLevel {
                        symbol: key.symbol,
                        side: key.side,
                        price,
                    });
                }
                ladder.insert(
                    rank,
                    Level {
                        price,
                        size: delta as Qty,
                    },
                );
                Ok(rank)
            }
        }
    }
}

impl LevelBook {
    /// Panics unless every ladder is strictly sorted best-first with no
    /// zero-size levels. Test support.
    pub fn assert_invariants(&self) {
        for (key, ladder) in self.ladders.iter() {
            for lvl in ladder {
                assert!(
                    lvl.size > 0,
                    "zero-size level {} on {}/{}",
                    lvl.price,
                    key.symbol,
                    key.side
                );
            }
            for pair in ladder.windows(2) {
                assert_eq!(
                    key.side.cmp_prices(pair[0].price, pair[1].price),
                    Ordering::Less,
                    "ladder {}/{} out of order at {} vs {}",
                    key.symbol,
                    key.side,
                    pair[0].price,
                    pair[1].price
                );
            }
        }
    }
}
