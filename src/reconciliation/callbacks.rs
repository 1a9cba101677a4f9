//! Listener callbacks the reconciliation engine fires on every SmartBook
//! mutation, confirmed or guessed.

use super::l3_book::L3Book;
use super::types::OrderInfo;
use std::sync::Arc;

/// A thread-safe listener callback for a SmartBook mutation.
///
/// Mirrors the `[OrderInfo]` record the original engine prints from its
/// four `onOrder*` hooks — callers inspect `is_guess`/`is_pending` to
/// tell a confirmed record from a provisional one, and the `L3Book`
/// reference lets them inspect book state at the moment of the callback
/// instead of issuing a separate, possibly-stale query.
pub type OrderInfoListener = Arc<dyn Fn(&L3Book, &OrderInfo) + Send + Sync>;

/// The four mutation hooks a `ReconciliationEngine` dispatches to.
///
/// Each slot defaults to `None`; an engine with no callbacks registered
/// simply does not notify anyone — the SmartBook state itself is always
/// queryable directly.
#[derive(Clone, Default)]
pub struct OrderBookCallbacks {
    /// Fired when an order is added to the SmartBook, guessed or confirmed.
    pub on_order_add: Option<OrderInfoListener>,
    /// Fired when a resting order's size or price changes.
    pub on_order_modify: Option<OrderInfoListener>,
    /// Fired when a resting order is removed.
    pub on_order_cancel: Option<OrderInfoListener>,
    /// Fired when an order is (partially or fully) executed.
    pub on_order_execution: Option<OrderInfoListener>,
}

impl OrderBookCallbacks {
    /// Creates a callback bundle with every hook unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the add hook, builder-style.
    #[must_use]
    pub fn on_add<F>(mut self, f: F) -> Self
    where
        F: Fn(&L3Book, &OrderInfo) + Send + Sync + 'static,
    {
        self.on_order_add = Some(Arc::new(f));
        self
    }

    /// Registers the modify hook, builder-style.
    #[must_use]
    pub fn on_modify<F>(mut self, f: F) -> Self
    where
        F: Fn(&L3Book, &OrderInfo) + Send + Sync + 'static,
    {
        self.on_order_modify = Some(Arc::new(f));
        self
    }

    /// Registers the cancel hook, builder-style.
    #[must_use]
    pub fn on_cancel<F>(mut self, f: F) -> Self
    where
        F: Fn(&L3Book, &OrderInfo) + Send + Sync + 'static,
    {
        self.on_order_cancel = Some(Arc::new(f));
        self
    }

    /// Registers the execution hook, builder-style.
    #[must_use]
    pub fn on_execution<F>(mut self, f: F) -> Self
    where
        F: Fn(&L3Book, &OrderInfo) + Send + Sync + 'static,
    {
        self.on_order_execution = Some(Arc::new(f));
        self
    }

    pub(super) fn fire_add(&self, book: &L3Book, info: &OrderInfo) {
        if let Some(f) = &self.on_order_add {
            f(book, info);
        }
    }

    pub(super) fn fire_modify(&self, book: &L3Book, info: &OrderInfo) {
        if let Some(f) = &self.on_order_modify {
            f(book, info);
        }
    }

    pub(super) fn fire_cancel(&self, book: &L3Book, info: &OrderInfo) {
        if let Some(f) = &self.on_order_cancel {
            f(book, info);
        }
    }

    pub(super) fn fire_execution(&self, book: &L3Book, info: &OrderInfo) {
        if let Some(f) = &self.on_order_execution {
            f(book, info);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::types::{Action, OrderId, Price, Quantity, Side, Timestamp};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn fires_only_registered_hooks() {
        let adds = Arc::new(AtomicUsize::new(0));
        let adds2 = adds.clone();
        let callbacks = OrderBookCallbacks::new().on_add(move |_, _| {
            adds2.fetch_add(1, Ordering::Relaxed);
        });

        let info = OrderInfo::new(
            OrderId::new(1),
            Side::Buy,
            Price::from_ticks(100),
            Quantity::new(10),
            Action::Add,
            Timestamp::new(1),
        );
        let book = L3Book::new();

        callbacks.fire_add(&book, &info);
        callbacks.fire_modify(&book, &info);
        callbacks.fire_cancel(&book, &info);
        callbacks.fire_execution(&book, &info);

        assert_eq!(adds.load(Ordering::Relaxed), 1);
    }
}
