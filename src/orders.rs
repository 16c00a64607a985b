// src/orders.rs
//! Live-order tracking keyed by wire identity.
//!
//! The stream addresses orders by `(order_id, side)`, never by id alone, so
//! the same numeric id may be live on both sides at once. The table holds
//! the authoritative size and price for each live order; the book's level
//! sizes are derived from it.

use hashbrown::HashMap;
use thiserror::Error;

use crate::book::{OrderId, Price, Qty, Side, Symbol};

/// Identity of a resting order as the feed addresses it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OrderKey {
    pub order_id: OrderId,
    pub side: Side,
}

/// Current state of one live order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenOrder {
    pub symbol: Symbol,
    pub price: Price,
    pub size: Qty,
}

/// Order-table failures. Both are fatal to a replay.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// The stream referenced an identity never added, or already removed.
    #[error("order {order_id}/{side} is not live")]
    NotFound { order_id: OrderId, side: Side },
    /// An execution larger than the order's remaining size.
    #[error("execution of {executed} exceeds remaining size {remaining} of order {order_id}/{side}")]
    OversizedExecution {
        order_id: OrderId,
        side: Side,
        remaining: Qty,
        executed: Qty,
    },
}

#[derive(Debug, Default)]
pub struct OrderTable {
    orders: HashMap<OrderKey, OpenOrder>,
}

impl OrderTable {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn reserve(&mut self, n: usize) {
        self.orders.reserve(n);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OrderKey, &OpenOrder)> + '_ {
        self.orders.iter()
    }

    /// Registers `order` under `key`, replacing any previous entry with the
    /// same identity.
    #[inline]
    pub fn insert(&mut self, key: OrderKey, order: OpenOrder) {
        self.orders.insert(key, order);
    }

    /// Looks up a live order.
    #[inline]
    pub fn get(&self, key: OrderKey) -> Result<OpenOrder, OrderError> {
        self.orders.get(&key).copied().ok_or(OrderError::NotFound {
            order_id: key.order_id,
            side: key.side,
        })
    }

    /// Removes a live order, returning its final state.
    #[inline]
    pub fn remove(&mut self, key: OrderKey) -> Result<OpenOrder, OrderError> {
        self.orders.remove(&key).ok_or(OrderError::NotFound {
            order_id: key.order_id,
            side: key.side,
        })
    }

    /// Shrinks an order by an executed amount and returns the size left.
    /// Draining an order to zero removes it from the table.
    pub fn reduce(&mut self, key: OrderKey, executed: Qty) -> Result<Qty, OrderError> {
        let order = match self.orders.get_mut(&key) {
            Some(o) => o,
            None => {
                return Err(OrderError::NotFound {
                    order_id: key.order_id,
                    side: key.side,
                })
            }
        };
        if executed > order.size {
            return Err(OrderError::OversizedExecution {
                order_id: key.order_id,
                side: key.side,
                remaining: order.size,
                executed,
            });
        }
        order.size -= executed;
        let remaining = order.size;
        if remaining == 0 {
            self.orders.remove(&key);
        }
        Ok(remaining)
    }
}
