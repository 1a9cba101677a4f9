//! A single L3 price level: an order FIFO plus its aggregate statistics.

use super::order_queue::OrderQueue;
use super::types::{Order, OrderId, Quantity};
use std::sync::atomic::{AtomicU64, Ordering};

/// A price level in the L3 book: price, aggregate quantity, order count,
/// and the FIFO of resting orders.
///
/// Invariants (checked in `#[cfg(test)]`, maintained by every mutator in
/// this module): `total_qty == sum(orders.size)`, `order_count == orders.len()`,
/// and a level with `order_count == 0` is never kept around by its owning
/// `L3Book` — it is removed instead.
#[derive(Debug)]
pub struct PriceLevel {
    total_qty: AtomicU64,
    order_count: AtomicU64,
    orders: OrderQueue,
}

impl PriceLevel {
    /// Creates an empty level.
    #[must_use]
    pub fn new() -> Self {
        Self {
            total_qty: AtomicU64::new(0),
            order_count: AtomicU64::new(0),
            orders: OrderQueue::new(),
        }
    }

    /// Aggregate resting quantity at this level.
    #[must_use]
    pub fn total_qty(&self) -> Quantity {
        Quantity::new(self.total_qty.load(Ordering::Relaxed))
    }

    /// Number of orders resting at this level.
    #[must_use]
    pub fn order_count(&self) -> u64 {
        self.order_count.load(Ordering::Relaxed)
    }

    /// True when no orders remain at this level.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order_count() == 0
    }

    /// Appends an order to the tail of this level's FIFO.
    pub fn push(&self, order: Order) {
        self.total_qty.fetch_add(order.size.as_u64(), Ordering::Relaxed);
        self.order_count.fetch_add(1, Ordering::Relaxed);
        self.orders.push(order);
    }

    /// Removes an order from this level. Returns the removed order.
    pub fn remove(&self, id: OrderId) -> Option<Order> {
        let order = self.orders.remove(id)?;
        self.total_qty.fetch_sub(order.size.as_u64(), Ordering::Relaxed);
        self.order_count.fetch_sub(1, Ordering::Relaxed);
        Some(order)
    }

    /// Looks up an order by id without removing it.
    #[must_use]
    pub fn get(&self, id: OrderId) -> Option<Order> {
        self.orders.get(id)
    }

    /// Adjusts a resting order's size in place, preserving its FIFO
    /// position. Used for amend-down and for partial-fill bookkeeping.
    /// Returns `false` if the order is not present.
    pub fn resize(&self, id: OrderId, new_size: Quantity) -> bool {
        let Some(mut order) = self.orders.get(id) else {
            return false;
        };
        let old = order.size;
        order.size = new_size;
        self.orders.replace(order);
        if new_size >= old {
            self.total_qty
                .fetch_add((new_size.as_u64()) - old.as_u64(), Ordering::Relaxed);
        } else {
            self.total_qty
                .fetch_sub(old.as_u64() - new_size.as_u64(), Ordering::Relaxed);
        }
        true
    }

    /// Rewrites the id of a resting order without disturbing its FIFO
    /// position or size.
    pub fn rewrite_id(&self, old_id: OrderId, new_id: OrderId) -> bool {
        self.orders.rewrite_id(old_id, new_id)
    }

    /// Orders resting at this level in price-time priority (FIFO) order.
    #[must_use]
    pub fn orders_fifo(&self) -> Vec<Order> {
        self.orders.iter_fifo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciliation::types::{Price, Side, Timestamp};

    fn order(id: i64, size: u64) -> Order {
        Order {
            id: OrderId::new(id),
            side: Side::Buy,
            price: Price::from_ticks(100),
            size: Quantity::new(size),
            timestamp: Timestamp::new(1),
        }
    }

    #[test]
    fn push_and_remove_track_aggregates() {
        let level = PriceLevel::new();
        level.push(order(1, 10));
        level.push(order(2, 20));
        assert_eq!(level.total_qty().as_u64(), 30);
        assert_eq!(level.order_count(), 2);

        let removed = level.remove(OrderId::new(1)).unwrap();
        assert_eq!(removed.size.as_u64(), 10);
        assert_eq!(level.total_qty().as_u64(), 20);
        assert_eq!(level.order_count(), 1);
    }

    #[test]
    fn resize_preserves_fifo_order() {
        let level = PriceLevel::new();
        level.push(order(1, 10));
        level.push(order(2, 20));
        assert!(level.resize(OrderId::new(1), Quantity::new(5)));
        assert_eq!(level.total_qty().as_u64(), 25);
        let fifo = level.orders_fifo();
        assert_eq!(fifo[0].id, OrderId::new(1));
        assert_eq!(fifo[1].id, OrderId::new(2));
    }

    #[test]
    fn rewrite_id_keeps_position_and_size() {
        let level = PriceLevel::new();
        level.push(order(-1, 10));
        level.push(order(2, 20));
        level.push(order(3, 30));
        assert!(level.rewrite_id(OrderId::new(-1), OrderId::new(99)));
        assert!(level.get(OrderId::new(-1)).is_none());
        let rewritten = level.get(OrderId::new(99)).unwrap();
        assert_eq!(rewritten.size.as_u64(), 10);
        assert_eq!(level.order_count(), 3);
        assert_eq!(level.total_qty().as_u64(), 60);

        let fifo = level.orders_fifo();
        let ids: Vec<i64> = fifo.iter().map(|o| o.id.as_i64()).collect();
        assert_eq!(ids, vec![99, 2, 3]);
    }
}
