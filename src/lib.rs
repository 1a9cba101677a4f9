//! # SmartBook Reconciliation Engine
//!
//! Reconstructs a unified limit-order-book view of a trading venue by
//! fusing three out-of-order, partially redundant market-data feeds:
//!
//! - **L3 updates** — per-order events (`Add`, `Modify`, `Cancel`) with
//!   stable order identifiers.
//! - **L2 snapshots** — full aggregated price-ladder snapshots.
//! - **Trade prints** — public executions (aggressor side undisclosed).
//!
//! In real venues these feeds arrive with independent latencies. The
//! [`ReconciliationEngine`](reconciliation::engine::ReconciliationEngine)
//! maintains a **SmartBook**: a best-effort, per-order book that tracks
//! the most current observable state by guessing order-level changes
//! when one feed leads another, then reconciling those guesses when the
//! lagging feeds confirm or contradict them.
//!
//! ## Status
//!
//! This crate implements the reconciliation engine and the L3/L2 book
//! data structures it manipulates. Matching, routing and persistence are
//! out of scope — see the module docs under [`reconciliation`].

pub mod reconciliation;
pub mod replay;

pub use reconciliation::callbacks::OrderBookCallbacks;
pub use reconciliation::engine::{EngineConfig, ReconciliationEngine};
pub use reconciliation::error::OrderBookError;
pub use reconciliation::l2_book::L2Book;
pub use reconciliation::l3_book::L3Book;
pub use reconciliation::trade_container::TradeContainer;
pub use reconciliation::types::{Action, Order, OrderId, OrderInfo, Price, Quantity, Side, Timestamp};
