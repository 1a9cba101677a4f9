//! FIFO of orders resting at a single price level.
//!
//! Grounded on the hybrid `DashMap` + `SegQueue` design the teacher's
//! `pricelevel` dependency uses for its own `OrderQueue`: a map gives O(1)
//! lookup/removal by id, a queue of arrival sequence numbers preserves
//! FIFO order. Order ids can be rewritten in place (a synthetic guess
//! confirmed by a real id) without disturbing that arrival position,
//! since the queue holds a stable sequence number rather than the id
//! itself — only `seq_to_id` is repointed.
//!
//! A `pop` that finds its sequence number already retired (cancelled out
//! of order) simply skips it and tries the next.

use super::types::{Order, OrderId};
use crossbeam::queue::SegQueue;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// A FIFO queue of orders with O(1) lookup by id and price-time priority
/// preserved via a stable arrival-sequence queue.
#[derive(Debug, Default)]
pub struct OrderQueue {
    orders: DashMap<OrderId, Order>,
    order_ids: SegQueue<u64>,
    seq_to_id: DashMap<u64, OrderId>,
    id_to_seq: DashMap<OrderId, u64>,
    next_seq: AtomicU64,
}

impl OrderQueue {
    /// Creates a new, empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
            order_ids: SegQueue::new(),
            seq_to_id: DashMap::new(),
            id_to_seq: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Appends an order to the tail of the queue.
    pub fn push(&self, order: Order) {
        let id = order.id;
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.orders.insert(id, order);
        self.seq_to_id.insert(seq, id);
        self.id_to_seq.insert(id, seq);
        self.order_ids.push(seq);
    }

    /// O(1) lookup by id.
    #[must_use]
    pub fn get(&self, id: OrderId) -> Option<Order> {
        self.orders.get(&id).map(|entry| entry.value().clone())
    }

    /// Removes an order by id. Its sequence number lingers in the FIFO
    /// queue until popped and found retired.
    #[must_use]
    pub fn remove(&self, id: OrderId) -> Option<Order> {
        if let Some((_, seq)) = self.id_to_seq.remove(&id) {
            self.seq_to_id.remove(&seq);
        }
        self.orders.remove(&id).map(|(_, order)| order)
    }

    /// Replaces the stored order for `id` (used for in-place amend-down and
    /// partial-fill size updates; never changes FIFO position).
    pub fn replace(&self, order: Order) {
        self.orders.insert(order.id, order);
    }

    /// Rewrites the id an order is stored and looked up under, without
    /// touching its position in the FIFO.
    ///
    /// Used to reconcile a synthetic guess with the real id that later
    /// arrives on the L3 feed.
    pub fn rewrite_id(&self, old_id: OrderId, new_id: OrderId) -> bool {
        let Some((_, mut order)) = self.orders.remove(&old_id) else {
            return false;
        };
        order.id = new_id;
        self.orders.insert(new_id, order);
        if let Some((_, seq)) = self.id_to_seq.remove(&old_id) {
            self.seq_to_id.insert(seq, new_id);
            self.id_to_seq.insert(new_id, seq);
        }
        true
    }

    /// Iterates resting orders in FIFO (price-time priority) order.
    ///
    /// Materializes a snapshot vector: the underlying `SegQueue` only
    /// supports destructive pop, and sequence numbers of already-removed
    /// orders are skipped.
    #[must_use]
    pub fn iter_fifo(&self) -> Vec<Order> {
        let mut drained = Vec::with_capacity(self.order_ids.len());
        while let Some(seq) = self.order_ids.pop() {
            drained.push(seq);
        }
        let mut result = Vec::with_capacity(drained.len());
        for seq in &drained {
            if let Some(id) = self.seq_to_id.get(seq)
                && let Some(order) = self.orders.get(id.value())
            {
                result.push(order.value().clone());
            }
        }
        for seq in drained {
            self.order_ids.push(seq);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciliation::types::{Price, Quantity, Side, Timestamp};

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
    fn rewrite_id_preserves_fifo_position_among_other_orders() {
        let queue = OrderQueue::new();
        queue.push(order(-1, 10));
        queue.push(order(2, 20));
        queue.push(order(3, 30));

        assert!(queue.rewrite_id(OrderId::new(-1), OrderId::new(99)));

        let fifo = queue.iter_fifo();
        let ids: Vec<i64> = fifo.iter().map(|o| o.id.as_i64()).collect();
        assert_eq!(ids, vec![99, 2, 3]);
    }
}
