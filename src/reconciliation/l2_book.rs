//! The aggregated (L2) book: a price ladder of resting quantity with no
//! per-order detail, rebuilt wholesale from each snapshot.

use super::types::{Price, Quantity};
use crossbeam_skiplist::SkipMap;

/// A full L2 snapshot: one aggregate quantity per price on each side.
pub struct L2Book {
    bids: SkipMap<u128, Quantity>,
    asks: SkipMap<u128, Quantity>,
}

impl Default for L2Book {
    fn default() -> Self {
        Self::new()
    }
}

impl L2Book {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bids: SkipMap::new(),
            asks: SkipMap::new(),
        }
    }

    /// Sets (or replaces) the aggregate quantity resting at a bid price.
    pub fn add_bid_level(&self, price: Price, quantity: Quantity) {
        self.bids.insert(price.as_ticks(), quantity);
    }

    /// Sets (or replaces) the aggregate quantity resting at an ask price.
    pub fn add_ask_level(&self, price: Price, quantity: Quantity) {
        self.asks.insert(price.as_ticks(), quantity);
    }

    /// Discards the whole snapshot. Called at the start of every new
    /// L2 message — this feed carries full replacement snapshots, not
    /// incremental deltas.
    pub fn clear(&self) {
        self.bids.clear();
        self.asks.clear();
    }

    /// Highest bid price in the current snapshot.
    #[must_use]
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.iter().next_back().map(|e| Price::from_ticks(*e.key()))
    }

    /// Lowest ask price in the current snapshot.
    #[must_use]
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.iter().next().map(|e| Price::from_ticks(*e.key()))
    }

    /// Aggregate bid quantity at `price`, or `None` if that price is
    /// not present in the current snapshot.
    #[must_use]
    pub fn bid_quantity_at_price(&self, price: Price) -> Option<Quantity> {
        self.bids.get(&price.as_ticks()).map(|e| *e.value())
    }

    /// Aggregate ask quantity at `price`, or `None` if that price is
    /// not present in the current snapshot.
    #[must_use]
    pub fn ask_quantity_at_price(&self, price: Price) -> Option<Quantity> {
        self.asks.get(&price.as_ticks()).map(|e| *e.value())
    }

    /// True when the snapshot has no levels on either side.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Bid price levels as `(price, quantity)` pairs, highest first.
    #[must_use]
    pub fn bid_levels(&self) -> Vec<(Price, Quantity)> {
        self.bids
            .iter()
            .rev()
            .map(|e| (Price::from_ticks(*e.key()), *e.value()))
            .collect()
    }

    /// Ask price levels as `(price, quantity)` pairs, lowest first.
    #[must_use]
    pub fn ask_levels(&self) -> Vec<(Price, Quantity)> {
        self.asks
            .iter()
            .map(|e| (Price::from_ticks(*e.key()), *e.value()))
            .collect()
    }
}
