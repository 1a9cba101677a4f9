//! Append-only history of public trade prints.

use super::types::{Timestamp, Trade};
use std::sync::RwLock;

/// Bounded-reserve trade tape. Grounded on the original `TradeContainer`:
/// a flat, append-only vector pre-reserved to `max_trades` so steady-state
/// ingestion never reallocates.
pub struct TradeContainer {
    trades: RwLock<Vec<Trade>>,
    max_trades: usize,
}

impl TradeContainer {
    /// Creates an empty tape pre-reserved for `max_trades` entries.
    #[must_use]
    pub fn new(max_trades: usize) -> Self {
        Self {
            trades: RwLock::new(Vec::with_capacity(max_trades)),
            max_trades,
        }
    }

    /// Appends a trade print. Once `max_trades` is reached the oldest
    /// print is dropped to make room — this is a tape, not an archive.
    pub fn add_trade(&self, trade: Trade) {
        let mut trades = self.trades.write().expect("trade tape lock poisoned");
        if trades.len() == self.max_trades {
            trades.remove(0);
        }
        trades.push(trade);
    }

    /// All trades currently retained, oldest first.
    #[must_use]
    pub fn trades(&self) -> Vec<Trade> {
        self.trades.read().expect("trade tape lock poisoned").clone()
    }

    /// Trades with `timestamp > ts`, oldest first.
    #[must_use]
    pub fn trades_after(&self, ts: Timestamp) -> Vec<Trade> {
        self.trades
            .read()
            .expect("trade tape lock poisoned")
            .iter()
            .filter(|t| t.timestamp > ts)
            .copied()
            .collect()
    }

    /// The most recently received trade, if any.
    #[must_use]
    pub fn last_trade(&self) -> Option<Trade> {
        self.trades.read().expect("trade tape lock poisoned").last().copied()
    }

    /// Discards the whole tape.
    pub fn clear(&self) {
        self.trades.write().expect("trade tape lock poisoned").clear();
    }

    /// True when no trades have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trades.read().expect("trade tape lock poisoned").is_empty()
    }

    /// Number of trades currently retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trades.read().expect("trade tape lock poisoned").len()
    }
}
