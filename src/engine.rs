// src/engine.rs
//! Event application. One decoded event mutates the order table and the
//! level book as a unit; the two structures are only ever touched through
//! [`Engine::apply`], which keeps them consistent or fails fatally.
//!
//! `apply` returns the best (numerically lowest) ladder rank the event
//! disturbed. An event that moved two levels, as an update can, reports the
//! better of the two. The caller gates snapshot emission on that rank.

use thiserror::Error;

use crate::book::{BookError, BookKey, LevelBook, OrderId, Price, Qty, Side, Symbol};
use crate::orders::{OpenOrder, OrderError, OrderKey, OrderTable};

/// One decoded order event, in stream order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Add {
        symbol: Symbol,
        order_id: OrderId,
        side: Side,
        size: Qty,
        price: Price,
    },
    Update {
        symbol: Symbol,
        order_id: OrderId,
        side: Side,
        size: Qty,
        price: Price,
    },
    Delete {
        symbol: Symbol,
        order_id: OrderId,
        side: Side,
    },
    Execute {
        symbol: Symbol,
        order_id: OrderId,
        side: Side,
        traded: Qty,
    },
}

impl Event {
    /// The symbol the message was labeled with on the wire.
    #[inline]
    pub fn symbol(&self) -> Symbol {
        match *self {
            Event::Add { symbol, .. }
            | Event::Update { symbol, .. }
            | Event::Delete { symbol, .. }
            | Event::Execute { symbol, .. } => symbol,
        }
    }
}

/// Anything that stops a replay. No variant is recoverable: once the stream
/// and the book disagree, every later snapshot would be wrong.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApplyError {
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error(transparent)]
    Book(#[from] BookError),
    /// A message size too large to book as a signed delta.
    #[error("order {order_id}/{side} size {size} exceeds the book's signed delta range")]
    OversizedOrder {
        order_id: OrderId,
        side: Side,
        size: Qty,
    },
}

/// A wire size as a signed book delta. Sizes past `i64::MAX` have no signed
/// form; they abort the run before any state is touched, which also keeps
/// every stored size inside the signed range.
fn signed_qty(order_id: OrderId, side: Side, size: Qty) -> Result<i64, ApplyError> {
    match i64::try_from(size) {
        Ok(delta) => Ok(delta),
        Err(_) => Err(ApplyError::OversizedOrder { order_id, side, size }),
    }
}

/// Order table plus level book, mutated in lockstep.
#[derive(Debug, Default)]
pub struct Engine {
    orders: OrderTable,
    book: LevelBook,
}

impl Engine {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn reserve_orders(&mut self, n: usize) {
        self.orders.reserve(n);
    }

    #[inline]
    pub fn orders(&self) -> &OrderTable {
        &self.orders
    }

    #[inline]
    pub fn book(&self) -> &LevelBook {
        &self.book
    }

    /// Applies one event and returns the best rank it disturbed.
    ///
    /// Adds trust the message fields. Updates re-price against the order's
    /// previous state: the old exposure is reversed where it actually rests
    /// before the new exposure lands, so a symbol relabel or price move can
    /// never strand size at the old level. Deletes and executes act on the
    /// stored order, not on the message labels.
    pub fn apply(&mut self, event: Event) -> Result<usize, ApplyError> {
        match event {
            Event::Add {
                symbol,
                order_id,
                side,
                size,
                price,
            } => {
                let delta = signed_qty(order_id, side, size)?;
                self.orders
                    .insert(OrderKey { order_id, side }, OpenOrder { symbol, price, size });
                let rank = self.book.apply(BookKey { symbol, side }, delta, price)?;
                Ok(rank)
            }

            Event::Update {
                symbol,
                order_id,
                side,
                size,
                price,
            } => {
                let delta = signed_qty(order_id, side, size)?;
                let key = OrderKey { order_id, side };
                let prev = self.orders.get(key)?;
                self.orders.insert(key, OpenOrder { symbol, price, size });
                // stored sizes passed through signed_qty, so the cast holds
                let reversed = self.book.apply(
                    BookKey {
                        symbol: prev.symbol,
                        side,
                    },
                    -(prev.size as i64),
                    prev.price,
                )?;
                let placed = self.book.apply(BookKey { symbol, side }, delta, price)?;
                Ok(reversed.min(placed))
            }

            Event::Delete { order_id, side, .. } => {
                let order = self.orders.remove(OrderKey { order_id, side })?;
                let rank = self.book.apply(
                    BookKey {
                        symbol: order.symbol,
                        side,
                    },
                    -(order.size as i64),
                    order.price,
                )?;
                Ok(rank)
            }

            Event::Execute {
                order_id,
                side,
                traded,
                ..
            } => {
                let key = OrderKey { order_id, side };
                let order = self.orders.get(key)?;
                // reduce bounds traded by the stored size, so the cast holds
                self.orders.reduce(key, traded)?;
                let rank = self.book.apply(
                    BookKey {
                        symbol: order.symbol,
                        side,
                    },
                    -(traded as i64),
                    order.price,
                )?;
                Ok(rank)
            }
        }
    }
}

impl Engine {
    /// Panics unless the book and the order table agree exactly. Test support.
    pub fn assert_invariants(&self) {
        self.book.assert_invariants();

        // every level's size must equal the sum of live orders resting there
        let mut agg: hashbrown::HashMap<(Symbol, Side, Price), Qty> = hashbrown::HashMap::new();
        for (key, order) in self.orders.iter() {
            *agg.entry((order.symbol, key.side, order.price)).or_insert(0) += order.size;
        }

        for (key, ladder) in self.book.iter() {
            for lvl in ladder {
                let want = agg
                    .remove(&(key.symbol, key.side, lvl.price))
                    .unwrap_or_default();
                assert_eq!(
                    lvl.size, want,
                    "level {} on {}/{} disagrees with live orders",
                    lvl.price, key.symbol, key.side
                );
            }
        }

        // whatever is left must be zero-size stragglers (a size-0 update
        // leaves the order live without book exposure)
        for ((symbol, side, price), want) in agg {
            assert_eq!(
                want, 0,
                "orders at {price} on {symbol}/{side} have no level behind them"
            );
        }
    }
}
