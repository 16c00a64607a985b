//! # bookfeed - Order Book Reconstruction Engine
//!
//! This crate rebuilds limit order books from recorded order-event streams
//! and logs a truncated snapshot every time an event disturbs the visible
//! top of a book. Processing is strictly single-threaded and sequential:
//! each event's effect depends on every event before it, so frames are
//! decoded, applied, and logged in stream order.
//!
//! ## Architecture
//!
//! - **Parser**: frame envelope plus tagged message-body decoding
//! - **OrderTable**: live orders keyed by `(order_id, side)`
//! - **LevelBook**: sorted price-level ladders, one per `(symbol, side)`
//! - **Engine**: applies one event to table and book as a unit, reporting
//!   the best rank it disturbed
//! - **Replay**: the decode/apply/emit loop plus run counters
//!
//! ## Example
//!
//! ```rust
//! use bookfeed::book::{Side, Symbol};
//! use bookfeed::engine::{Engine, Event};
//!
//! let mut engine = Engine::new();
//! let rank = engine
//!     .apply(Event::Add {
//!         symbol: Symbol::new(*b"VOD"),
//!         order_id: 1,
//!         side: Side::Buy,
//!         size: 100,
//!         price: 1043,
//!     })
//!     .unwrap();
//!
//! // a brand-new best level always ranks 0
//! assert_eq!(rank, 0);
//! ```
pub mod book;
pub mod engine;
pub mod logger;
pub mod metrics;
pub mod orders;
pub mod parser;
pub mod replay;
