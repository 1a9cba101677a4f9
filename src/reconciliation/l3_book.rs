//! The per-order (L3) book: a price ladder of [`PriceLevel`]s plus an
//! order-id index for O(1) lookup, grounded on the teacher's
//! `SkipMap` + `DashMap` `order_locations` design in `book.rs`.

use super::error::OrderBookError;
use super::level::PriceLevel;
use super::types::{Action, Order, OrderId, OrderInfo, Price, Quantity, Side, Timestamp};
use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// A full per-order limit order book for one instrument.
///
/// Bids and asks are each a concurrent ordered map keyed by raw price
/// ticks; `bids` is read back-to-front (`next_back`) so the highest
/// price is best, `asks` front-to-back so the lowest price is best.
pub struct L3Book {
    bids: SkipMap<u128, Arc<PriceLevel>>,
    asks: SkipMap<u128, Arc<PriceLevel>>,
    order_locations: DashMap<OrderId, (Price, Side)>,
}

impl Default for L3Book {
    fn default() -> Self {
        Self::new()
    }
}

impl L3Book {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bids: SkipMap::new(),
            asks: SkipMap::new(),
            order_locations: DashMap::new(),
        }
    }

    fn side_book(&self, side: Side) -> &SkipMap<u128, Arc<PriceLevel>> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    /// Best (highest) resting bid price.
    #[must_use]
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.iter().next_back().map(|e| Price::from_ticks(*e.key()))
    }

    /// Best (lowest) resting ask price.
    #[must_use]
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.iter().next().map(|e| Price::from_ticks(*e.key()))
    }

    /// True when the book has no resting orders on either side.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// True when the best bid is at or above the best ask — both feeds
    /// momentarily disagree and the reconciliation engine should prefer
    /// the ask side (see `SPEC_FULL.md` Design Notes).
    #[must_use]
    pub fn is_order_book_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => bid >= ask,
            _ => false,
        }
    }

    /// Aggregate resting quantity at `price` on `side`, or `None` if no
    /// level exists there.
    #[must_use]
    pub fn level_quantity(&self, side: Side, price: Price) -> Option<Quantity> {
        self.side_book(side).get(&price.as_ticks()).map(|e| e.value().total_qty())
    }

    /// Resting orders at `price` on `side`, oldest first, or an empty
    /// vector if no level exists there.
    #[must_use]
    pub fn level_orders_fifo(&self, side: Side, price: Price) -> Vec<Order> {
        self.side_book(side)
            .get(&price.as_ticks())
            .map(|e| e.value().orders_fifo())
            .unwrap_or_default()
    }

    /// All levels on `side` as `(price, quantity)` pairs, best first.
    #[must_use]
    pub fn levels(&self, side: Side) -> Vec<(Price, Quantity)> {
        let book = self.side_book(side);
        let iter: Box<dyn Iterator<Item = _>> = match side {
            Side::Buy => Box::new(book.iter().rev()),
            Side::Sell => Box::new(book.iter()),
        };
        iter.map(|e| (Price::from_ticks(*e.key()), e.value().total_qty())).collect()
    }

    /// Total number of resting orders across both sides.
    #[must_use]
    pub fn total_orders(&self) -> usize {
        self.order_locations.len()
    }

    /// True when `order_id` currently rests in the book.
    #[must_use]
    pub fn has_order(&self, order_id: OrderId) -> bool {
        self.order_locations.contains_key(&order_id)
    }

    /// Looks up a resting order by id.
    #[must_use]
    pub fn find_order(&self, order_id: OrderId) -> Option<Order> {
        let (price, side) = *self.order_locations.get(&order_id)?;
        self.side_book(side).get(&price.as_ticks())?.value().get(order_id)
    }

    fn level_or_insert(&self, side: Side, price: Price) -> Arc<PriceLevel> {
        self.side_book(side)
            .get_or_insert_with(price.as_ticks(), || Arc::new(PriceLevel::new()))
            .value()
            .clone()
    }

    /// Adds a new resting order. Rejects market orders (`price <= 0`) and
    /// duplicate ids.
    pub fn add_order(&self, order_id: OrderId, side: Side, size: Quantity, price: Price) -> bool {
        if self.order_locations.contains_key(&order_id) {
            debug!(%order_id, "addOrder: duplicate id, rejecting");
            return false;
        }
        if !price.is_valid_limit() {
            debug!(%order_id, "addOrder: rejecting market order");
            return false;
        }
        trace!(%order_id, %side, %price, %size, "addOrder");
        let level = self.level_or_insert(side, price);
        level.push(Order {
            id: order_id,
            side,
            price,
            size,
            timestamp: Timestamp::new(0),
        });
        self.order_locations.insert(order_id, (price, side));
        true
    }

    fn remove_level_if_empty(&self, side: Side, price: Price) {
        let book = self.side_book(side);
        if let Some(entry) = book.get(&price.as_ticks())
            && entry.value().is_empty()
        {
            trace!(%price, %side, "removing emptied price level");
            entry.remove();
        }
    }

    /// Cancels a resting order outright.
    pub fn cancel_order(&self, order_id: OrderId) -> bool {
        let Some((_, (price, side))) = self.order_locations.remove(&order_id) else {
            return false;
        };
        trace!(%order_id, "cancelOrder");
        if let Some(entry) = self.side_book(side).get(&price.as_ticks()) {
            entry.value().remove(order_id);
        }
        self.remove_level_if_empty(side, price);
        true
    }

    /// Adjusts a resting order's size in place. `new_size` must be `> 0`.
    pub fn modify_order_size(&self, order_id: OrderId, new_size: Quantity) -> bool {
        if new_size.as_u64() == 0 {
            return false;
        }
        let Some((price, side)) = self.order_locations.get(&order_id).map(|e| *e) else {
            return false;
        };
        let Some(entry) = self.side_book(side).get(&price.as_ticks()) else {
            return false;
        };
        entry.value().resize(order_id, new_size)
    }

    /// Rewrites the id a resting order is known by, without disturbing
    /// its price, size or FIFO position. Used to fold a confirmed
    /// synthetic guess into the real id reported by the L3 feed.
    pub fn modify_order_id(&self, order_id: OrderId, new_id: OrderId) -> bool {
        let Some((_, (price, side))) = self.order_locations.remove(&order_id) else {
            return false;
        };
        let Some(entry) = self.side_book(side).get(&price.as_ticks()) else {
            return false;
        };
        if entry.value().rewrite_id(order_id, new_id) {
            self.order_locations.insert(new_id, (price, side));
            true
        } else {
            self.order_locations.insert(order_id, (price, side));
            false
        }
    }

    /// Modifies a resting order's size and/or price.
    ///
    /// An amend-down (same price, strictly smaller size) updates the
    /// order in place and preserves its queue priority. Anything else —
    /// a price change or a size increase — is a cancel followed by a
    /// fresh add, which goes to the back of the new level's queue.
    pub fn modify_order(&self, order_id: OrderId, new_size: Quantity, new_price: Price) -> bool {
        let Some(order) = self.find_order(order_id) else {
            return false;
        };
        if order.price == new_price && order.size > new_size {
            trace!(%order_id, "amending down in place");
            return self.modify_order_size(order_id, new_size);
        }
        trace!(%order_id, "replacing (cancel + add)");
        let side = order.side;
        self.cancel_order(order_id);
        self.add_order(order_id, side, new_size, new_price)
    }

    /// Applies an execution of `executed_size` against a specific
    /// resting order. Fully filled orders are cancelled outright.
    pub fn execute_order(&self, order_id: OrderId, executed_size: Quantity) -> bool {
        if executed_size.as_u64() == 0 {
            return false;
        }
        let Some(order) = self.find_order(order_id) else {
            return false;
        };
        if order.size == executed_size {
            return self.cancel_order(order_id);
        }
        if order.size < executed_size {
            return false;
        }
        self.modify_order_size(order_id, order.size.saturating_sub(executed_size))
    }

    /// Walks the FIFO at `price` consuming `quantity`, producing one
    /// [`OrderInfo`] execution record per resting order touched (oldest
    /// first). Orders fully consumed are removed; the last one touched
    /// may be left partially filled.
    ///
    /// `is_guess` marks the produced records as unconfirmed — used when
    /// a trade print arrives before the L3 feed reports the fills it
    /// implies.
    pub fn execute_at_price(&self, price: Price, quantity: Quantity, is_guess: bool) -> Vec<OrderInfo> {
        let is_ask = self.best_ask() == Some(price);
        let is_bid = self.best_bid() == Some(price);
        if !is_ask && !is_bid {
            debug!(%price, "executeAtPrice: price is not a best on either side");
        }
        let side = if is_ask { Side::Sell } else { Side::Buy };
        let Some(entry) = self.side_book(side).get(&price.as_ticks()) else {
            debug!(%price, "executeAtPrice: no level at price");
            return Vec::new();
        };
        let level = entry.value().clone();
        let mut remaining = quantity.as_u64();
        let mut executions = Vec::new();
        for order in level.orders_fifo() {
            if remaining == 0 {
                break;
            }
            let exec_qty = remaining.min(order.size.as_u64());
            let mut info = OrderInfo::new(
                order.id,
                order.side,
                price,
                Quantity::new(exec_qty),
                Action::Execution,
                order.timestamp,
            );
            info.original_qty = order.size;
            if is_guess {
                info.is_guess = true;
                info.is_pending = true;
            }
            executions.push(info);
            self.execute_order(order.id, Quantity::new(exec_qty));
            remaining -= exec_qty;
        }
        executions
    }

    /// Parses a limit price and rejects non-positive (market) values.
    pub fn parse_limit_price(raw: &str) -> Result<Price, OrderBookError> {
        let price = Price::from_decimal_str(raw)?;
        if !price.is_valid_limit() {
            return Err(OrderBookError::InvalidPrice(raw.to_string()));
        }
        Ok(price)
    }

    /// Discards all resting orders on both sides.
    pub fn clear(&self) {
        self.bids.clear();
        self.asks.clear();
        self.order_locations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_rejects_duplicate_and_market_orders() {
        let book = L3Book::new();
        assert!(book.add_order(OrderId::new(1), Side::Buy, Quantity::new(10), Price::from_ticks(100)));
        assert!(!book.add_order(OrderId::new(1), Side::Buy, Quantity::new(10), Price::from_ticks(100)));
        assert!(!book.add_order(OrderId::new(2), Side::Buy, Quantity::new(10), Price::ZERO));
    }

    #[test]
    fn best_bid_ask_and_crossed_detection() {
        let book = L3Book::new();
        book.add_order(OrderId::new(1), Side::Buy, Quantity::new(10), Price::from_ticks(100));
        book.add_order(OrderId::new(2), Side::Buy, Quantity::new(10), Price::from_ticks(105));
        book.add_order(OrderId::new(3), Side::Sell, Quantity::new(10), Price::from_ticks(110));
        assert_eq!(book.best_bid(), Some(Price::from_ticks(105)));
        assert_eq!(book.best_ask(), Some(Price::from_ticks(110)));
        assert!(!book.is_order_book_crossed());

        book.add_order(OrderId::new(4), Side::Buy, Quantity::new(10), Price::from_ticks(120));
        assert!(book.is_order_book_crossed());
    }

    #[test]
    fn cancel_removes_order_and_empties_level() {
        let book = L3Book::new();
        book.add_order(OrderId::new(1), Side::Buy, Quantity::new(10), Price::from_ticks(100));
        assert!(book.cancel_order(OrderId::new(1)));
        assert!(!book.has_order(OrderId::new(1)));
        assert_eq!(book.best_bid(), None);
        assert!(!book.cancel_order(OrderId::new(1)));
    }

    #[test]
    fn modify_order_amends_down_in_place() {
        let book = L3Book::new();
        book.add_order(OrderId::new(1), Side::Buy, Quantity::new(10), Price::from_ticks(100));
        book.add_order(OrderId::new(2), Side::Buy, Quantity::new(10), Price::from_ticks(100));
        assert!(book.modify_order(OrderId::new(1), Quantity::new(4), Price::from_ticks(100)));
        let order = book.find_order(OrderId::new(1)).unwrap();
        assert_eq!(order.size.as_u64(), 4);
    }

    #[test]
    fn modify_order_price_change_loses_priority() {
        let book = L3Book::new();
        book.add_order(OrderId::new(1), Side::Buy, Quantity::new(10), Price::from_ticks(100));
        assert!(book.modify_order(OrderId::new(1), Quantity::new(10), Price::from_ticks(99)));
        assert_eq!(book.find_order(OrderId::new(1)).unwrap().price, Price::from_ticks(99));
        assert_eq!(book.best_bid(), Some(Price::from_ticks(99)));
    }

    #[test]
    fn modify_order_id_preserves_rest_of_order() {
        let book = L3Book::new();
        book.add_order(OrderId::new(-1), Side::Buy, Quantity::new(10), Price::from_ticks(100));
        assert!(book.modify_order_id(OrderId::new(-1), OrderId::new(42)));
        assert!(!book.has_order(OrderId::new(-1)));
        let order = book.find_order(OrderId::new(42)).unwrap();
        assert_eq!(order.size.as_u64(), 10);
    }

    #[test]
    fn execute_order_partial_then_full() {
        let book = L3Book::new();
        book.add_order(OrderId::new(1), Side::Buy, Quantity::new(10), Price::from_ticks(100));
        assert!(book.execute_order(OrderId::new(1), Quantity::new(4)));
        assert_eq!(book.find_order(OrderId::new(1)).unwrap().size.as_u64(), 6);
        assert!(book.execute_order(OrderId::new(1), Quantity::new(6)));
        assert!(!book.has_order(OrderId::new(1)));
    }

    #[test]
    fn execute_at_price_walks_fifo_oldest_first() {
        let book = L3Book::new();
        book.add_order(OrderId::new(1), Side::Sell, Quantity::new(5), Price::from_ticks(100));
        book.add_order(OrderId::new(2), Side::Sell, Quantity::new(5), Price::from_ticks(100));
        let executions = book.execute_at_price(Price::from_ticks(100), Quantity::new(7), false);
        assert_eq!(executions.len(), 2);
        assert_eq!(executions[0].order_id, OrderId::new(1));
        assert_eq!(executions[0].size.as_u64(), 5);
        assert_eq!(executions[1].order_id, OrderId::new(2));
        assert_eq!(executions[1].size.as_u64(), 2);
        assert_eq!(book.find_order(OrderId::new(2)).unwrap().size.as_u64(), 3);
        assert!(!book.has_order(OrderId::new(1)));
    }
}
