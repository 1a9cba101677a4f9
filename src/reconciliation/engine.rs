//! The reconciliation engine: fuses L3 updates, L2 snapshots and trade
//! prints into a single best-effort SmartBook, guessing ahead of a
//! lagging feed and repairing the guess when a later feed confirms or
//! contradicts it.
//!
//! Grounded on `OrderBook.cpp`/`OrderBook.hpp` from the original
//! implementation; state ownership (`smartBook`/`rawL3`/`l2Book`/
//! `trades`/`guesses`/`aggressors`/`guessedExecutions`) and every
//! reconciliation rule below follow that source line for line, adapted
//! to Rust's ownership model (no raw iterators/pointers into the guess
//! map; ids are looked up instead of held).

use super::callbacks::OrderBookCallbacks;
use super::error::OrderBookError;
use super::l2_book::L2Book;
use super::l3_book::L3Book;
use super::trade_container::TradeContainer;
use super::types::{Action, L3Action, OrderId, OrderInfo, Price, Quantity, Side, Timestamp, Trade};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{debug, trace, warn};

/// Tuning knobs for a [`ReconciliationEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Bias applied when a lone L2 reduction is observed with no L3
    /// confirmation: the probability that the reduction is guessed to
    /// be an execution rather than a cancel/modify. Must be in `[0, 1]`.
    pub execution_probability: f64,
    /// Seed for the engine's owned RNG. Fixing this makes the Bernoulli
    /// draws in `guess_order_reduction` reproducible across runs.
    pub rng_seed: u64,
    /// Capacity of the trade tape (see [`TradeContainer`]).
    pub trade_history_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            execution_probability: 0.3,
            rng_seed: 0,
            trade_history_capacity: 10_000,
        }
    }
}

/// The fused per-order reconciliation engine.
///
/// Owns four books — `smart_book` (the reconciled view), `raw_l3` (a
/// literal, never-guessed mirror of the L3 feed), `l2_book` (the last
/// snapshot) and `trades` (the trade tape) — plus the guess-tracking
/// state that bridges them.
pub struct ReconciliationEngine {
    smart_book: L3Book,
    raw_l3: L3Book,
    l2_book: L2Book,
    trades: TradeContainer,
    guesses: dashmap::DashMap<OrderId, OrderInfo>,
    aggressors: Mutex<Vec<OrderInfo>>,
    guessed_executions: Mutex<VecDeque<OrderId>>,
    next_synthetic_id: AtomicI64,
    execution_probability: f64,
    rng: Mutex<StdRng>,
    callbacks: OrderBookCallbacks,
}

impl ReconciliationEngine {
    /// Creates an engine with the given tuning and callback hooks.
    ///
    /// Errors if `config.execution_probability` is outside `[0, 1]`.
    pub fn new(config: EngineConfig, callbacks: OrderBookCallbacks) -> Result<Self, OrderBookError> {
        if !(0.0..=1.0).contains(&config.execution_probability) {
            return Err(OrderBookError::InvalidExecutionProbability(config.execution_probability));
        }
        Ok(Self {
            smart_book: L3Book::new(),
            raw_l3: L3Book::new(),
            l2_book: L2Book::new(),
            trades: TradeContainer::new(config.trade_history_capacity),
            guesses: dashmap::DashMap::new(),
            aggressors: Mutex::new(Vec::new()),
            guessed_executions: Mutex::new(VecDeque::new()),
            next_synthetic_id: AtomicI64::new(-1),
            execution_probability: config.execution_probability,
            rng: Mutex::new(StdRng::seed_from_u64(config.rng_seed)),
            callbacks,
        })
    }

    /// The reconciled, best-effort per-order book.
    #[must_use]
    pub fn smart_book(&self) -> &L3Book {
        &self.smart_book
    }

    /// The literal, unreconciled mirror of the L3 feed.
    #[must_use]
    pub fn raw_l3(&self) -> &L3Book {
        &self.raw_l3
    }

    /// The last applied L2 snapshot.
    #[must_use]
    pub fn l2_book(&self) -> &L2Book {
        &self.l2_book
    }

    /// The trade tape.
    #[must_use]
    pub fn trades(&self) -> &TradeContainer {
        &self.trades
    }

    /// Number of outstanding (unresolved) guesses.
    #[must_use]
    pub fn guess_count(&self) -> usize {
        self.guesses.len()
    }

    /// Number of outstanding aggressor (pending marketable order) records.
    #[must_use]
    pub fn aggressor_count(&self) -> usize {
        self.aggressors.lock().expect("aggressors lock poisoned").len()
    }

    fn next_synthetic_id(&self) -> OrderId {
        OrderId::new(self.next_synthetic_id.fetch_sub(1, Ordering::Relaxed))
    }

    // ---- entry points -----------------------------------------------

    /// Applies one L3 feed event: the raw mirror always receives it
    /// verbatim; the SmartBook receives it only if reconciliation
    /// against an outstanding guess doesn't already account for it.
    pub fn process_l3_update(
        &self,
        action: L3Action,
        order_id: OrderId,
        side: Side,
        price: Price,
        size: Quantity,
        ts: Timestamp,
    ) {
        match action {
            L3Action::Add => {
                self.raw_l3.add_order(order_id, side, size, price);
                if !self.reconcile_add(order_id, side, price, size) {
                    self.smart_book.add_order(order_id, side, size, price);
                    self.callbacks
                        .fire_add(&self.smart_book, &OrderInfo::new(order_id, side, price, size, Action::Add, ts));
                }
            }
            L3Action::Modify => {
                self.raw_l3.modify_order(order_id, size, price);
                if !self.reconcile_modify(order_id, price, size) {
                    self.smart_book.modify_order(order_id, size, price);
                    self.callbacks
                        .fire_modify(&self.smart_book, &OrderInfo::new(order_id, side, price, size, Action::Modify, ts));
                }
            }
            L3Action::Cancel => {
                self.raw_l3.cancel_order(order_id);
                if !self.reconcile_cancel(order_id) {
                    self.smart_book.cancel_order(order_id);
                    self.callbacks
                        .fire_cancel(&self.smart_book, &OrderInfo::new(order_id, side, price, size, Action::Cancel, ts));
                }
            }
        }
    }

    /// Applies a full L2 snapshot: replaces `l2_book` wholesale, then
    /// diffs each side against the SmartBook to infer guesses.
    pub fn process_l2_snapshot(&self, bids: &[(Price, Quantity)], asks: &[(Price, Quantity)], ts: Timestamp) {
        self.l2_book.clear();
        for &(price, qty) in bids {
            self.l2_book.add_bid_level(price, qty);
        }
        for &(price, qty) in asks {
            self.l2_book.add_ask_level(price, qty);
        }
        self.handle_l2_change(Side::Buy, ts);
        self.handle_l2_change(Side::Sell, ts);
    }

    /// Records a trade print and attempts to reconcile it against
    /// outstanding execution guesses; falls back to inferring a fresh
    /// execution when none apply.
    pub fn process_trade(&self, price: Price, quantity: Quantity, ts: Timestamp) {
        self.trades.add_trade(Trade { price, quantity, timestamp: ts });
        if !self.reconcile_trade(price, quantity) {
            self.on_execution(price, quantity, ts, false);
        }
    }

    // ---- reconciliation rules -----------------------------------------

    fn reconcile_add(&self, order_id: OrderId, side: Side, price: Price, size: Quantity) -> bool {
        {
            let mut aggressors = self.aggressors.lock().expect("aggressors lock poisoned");
            if let Some(pos) = aggressors
                .iter()
                .position(|a| a.is_marketable && a.side == side && a.price == price && a.size == size)
            {
                let mut entry = aggressors.remove(pos);
                entry.is_pending = true;
                entry.order_id = order_id;
                self.guesses.insert(order_id, entry);
                trace!(%order_id, "reconcileAdd: matched pending aggressor");
                return true;
            }
        }

        let matched = self
            .guesses
            .iter()
            .find(|e| {
                let g = e.value();
                g.action == Action::Add && g.side == side && g.price == price && g.size == size
            })
            .map(|e| *e.key());
        if let Some(guess_id) = matched {
            if guess_id.is_synthetic() {
                self.smart_book.modify_order_id(guess_id, order_id);
            }
            self.guesses.remove(&guess_id);
            trace!(%order_id, %guess_id, "reconcileAdd: matched passive ADD guess");
            return true;
        }
        false
    }

    fn reconcile_modify(&self, order_id: OrderId, price: Price, size: Quantity) -> bool {
        if let Some(mut guess) = self.guesses.get_mut(&order_id) {
            if guess.action == Action::Execution
                && guess.price == price
                && guess.original_qty.saturating_sub(guess.size) == size
            {
                guess.is_pending = false;
                let is_guess = guess.is_guess;
                drop(guess);
                if !is_guess {
                    self.guesses.remove(&order_id);
                }
                return true;
            }
            if guess.action == Action::Modify && guess.is_guess {
                return true;
            }
        }

        let candidates: Vec<OrderId> = self
            .guesses
            .iter()
            .filter(|e| e.value().action == Action::Add && e.value().price == price)
            .map(|e| *e.key())
            .collect();
        for guess_id in candidates {
            let Some(guess) = self.guesses.get(&guess_id).map(|e| e.value().clone()) else {
                continue;
            };
            if guess.is_guess && self.smart_book.has_order(order_id) {
                self.smart_book.cancel_order(guess.order_id);
                self.guesses.remove(&guess_id);
                return false;
            }
            if guess.size == size {
                if guess_id.is_synthetic() {
                    self.smart_book.modify_order_id(guess_id, order_id);
                }
                self.guesses.remove(&guess_id);
                return true;
            }
        }
        false
    }

    fn reconcile_cancel(&self, order_id: OrderId) -> bool {
        let Some(guess) = self.guesses.get(&order_id).map(|e| e.value().clone()) else {
            return false;
        };
        if guess.action == Action::Execution && guess.original_qty.saturating_sub(guess.size).as_u64() == 0 {
            if let Some(mut g) = self.guesses.get_mut(&order_id) {
                g.is_pending = false;
            }
            if !guess.is_guess {
                self.guesses.remove(&order_id);
            }
            return true;
        }
        if guess.action == Action::Add && guess.is_pending {
            self.guesses.remove(&order_id);
            return true;
        }
        false
    }

    fn reconcile_trade(&self, price: Price, quantity: Quantity) -> bool {
        loop {
            let next_id = {
                let mut q = self.guessed_executions.lock().expect("guessed_executions lock poisoned");
                q.pop_front()
            };
            let Some(exec_id) = next_id else { break };
            let Some(guess) = self.guesses.get(&exec_id).map(|e| e.value().clone()) else {
                continue;
            };
            if guess.price == price && guess.size == quantity {
                if let Some(mut g) = self.guesses.get_mut(&exec_id) {
                    g.is_guess = false;
                }
                if !guess.is_pending {
                    self.guesses.remove(&exec_id);
                }
                return true;
            }
            if guess.action == Action::Execution && guess.is_guess {
                if guess.original_qty == guess.size {
                    let mut cancelled = guess.clone();
                    cancelled.is_guess = false;
                    cancelled.action = Action::Cancel;
                    self.callbacks.fire_cancel(&self.smart_book, &cancelled);
                } else {
                    let mut modified = guess.clone();
                    modified.is_guess = false;
                    modified.action = Action::Modify;
                    modified.size = modified.original_qty.saturating_sub(modified.size);
                    self.callbacks.fire_modify(&self.smart_book, &modified);
                }
                self.guesses.remove(&exec_id);
            }
        }

        let candidate = self
            .guesses
            .iter()
            .find(|e| {
                let g = e.value();
                g.is_guess
                    && g.price == price
                    && ((g.action == Action::Modify && quantity == g.original_qty.saturating_sub(g.size))
                        || (g.action == Action::Cancel && quantity == g.size))
            })
            .map(|e| *e.key());
        if let Some(guess_id) = candidate
            && let Some((_, mut guess)) = self.guesses.remove(&guess_id)
        {
            guess.is_guess = false;
            guess.size = quantity;
            guess.action = Action::Execution;
            self.callbacks.fire_execution(&self.smart_book, &guess);
            return true;
        }
        false
    }

    // ---- guessing -------------------------------------------------------

    fn guess_new_order(
        &self,
        price: Price,
        size: Quantity,
        side: Side,
        is_marketable: bool,
        ts: Timestamp,
        is_guess: bool,
    ) {
        let id = self.next_synthetic_id();
        if !is_marketable {
            self.smart_book.add_order(id, side, size, price);
        }

        let mut new_order = OrderInfo::new(id, side, price, size, Action::Add, ts);
        new_order.original_qty = size;
        new_order.is_marketable = is_marketable;
        new_order.is_guess = true;

        if is_marketable {
            self.aggressors.lock().expect("aggressors lock poisoned").push(new_order.clone());
        } else {
            new_order.is_guess = is_guess;
            self.guesses.insert(id, new_order.clone());
        }
        self.callbacks.fire_add(&self.smart_book, &new_order);
    }

    fn guess_order_reduction(&self, price: Price, quantity: Quantity, side: Side, ts: Timestamp) {
        let Some(level_qty) = self.smart_book.level_quantity(side, price) else {
            return;
        };
        let _is_cancel_level = level_qty == quantity;

        let mut remaining = quantity.as_u64();
        for order in self.smart_book.level_orders_fifo(side, price) {
            if remaining == 0 {
                break;
            }
            let reduce_qty = remaining.min(order.size.as_u64());

            let take_execution = if self.execution_probability <= 0.0 {
                false
            } else if self.execution_probability >= 1.0 {
                true
            } else {
                let mut rng = self.rng.lock().expect("rng lock poisoned");
                rng.r#gen::<f64>() < self.execution_probability
            };

            if take_execution {
                self.on_execution(price, Quantity::new(reduce_qty), ts, true);
            } else if reduce_qty == order.size.as_u64() {
                let mut info = OrderInfo::new(order.id, order.side, order.price, Quantity::new(reduce_qty), Action::Cancel, ts);
                info.is_guess = true;
                self.guesses.insert(order.id, info.clone());
                self.smart_book.cancel_order(order.id);
                self.callbacks.fire_cancel(&self.smart_book, &info);
            } else {
                let new_size = order.size.saturating_sub(Quantity::new(reduce_qty));
                let mut info = OrderInfo::new(order.id, order.side, order.price, new_size, Action::Modify, ts);
                info.original_qty = order.size;
                info.is_guess = true;
                self.guesses.insert(order.id, info.clone());
                self.smart_book.modify_order(order.id, new_size, price);
                self.callbacks.fire_modify(&self.smart_book, &info);
            }
            remaining -= reduce_qty;
        }
    }

    fn handle_l2_change(&self, side: Side, ts: Timestamp) {
        let l2_levels = match side {
            Side::Buy => self.l2_book.bid_levels(),
            Side::Sell => self.l2_book.ask_levels(),
        };
        for (price, l2_qty) in &l2_levels {
            match self.smart_book.level_quantity(side, *price) {
                None => {
                    debug!(%price, %side, "new price level found in L2");
                    self.guess_new_order(*price, *l2_qty, side, false, ts, false);
                }
                Some(sb_qty) if *l2_qty > sb_qty => {
                    self.guess_new_order(*price, l2_qty.saturating_sub(sb_qty), side, false, ts, true);
                }
                Some(sb_qty) if sb_qty > *l2_qty => {
                    self.guess_order_reduction(*price, sb_qty.saturating_sub(*l2_qty), side, ts);
                }
                _ => {}
            }
        }

        for (price, sb_qty) in self.smart_book.levels(side) {
            let still_present = match side {
                Side::Buy => self.l2_book.bid_quantity_at_price(price).is_some(),
                Side::Sell => self.l2_book.ask_quantity_at_price(price).is_some(),
            };
            if !still_present {
                debug!(%price, %side, "price level vanished from L2");
                self.guess_order_reduction(price, sb_qty, side, ts);
            }
        }
    }

    fn on_execution(&self, price: Price, quantity: Quantity, ts: Timestamp, is_guess: bool) {
        let (_is_marketable, is_sell_aggressor) = self.deduce_is_sell_aggressor(price);
        let aggressor_side = if is_sell_aggressor { Side::Sell } else { Side::Buy };
        self.guess_new_order(price, quantity, aggressor_side, true, ts, false);

        let executions = self.smart_book.execute_at_price(price, quantity, is_guess);
        for mut exec in executions {
            exec.timestamp = ts;
            self.guesses.insert(exec.order_id, exec.clone());
            if is_guess {
                self.guessed_executions
                    .lock()
                    .expect("guessed_executions lock poisoned")
                    .push_back(exec.order_id);
            }
            self.callbacks.fire_execution(&self.smart_book, &exec);
        }
    }

    /// Compares `price` against the SmartBook's best bid/ask to infer
    /// whether a trade print at that price was a marketable sell or buy
    /// aggressor. Returns `(is_marketable, is_sell_aggressor)`.
    fn deduce_is_sell_aggressor(&self, price: Price) -> (bool, bool) {
        if let Some(bid) = self.smart_book.best_bid()
            && price <= bid
        {
            return (true, true);
        }
        if let Some(ask) = self.smart_book.best_ask()
            && price >= ask
        {
            return (true, false);
        }
        warn!(%price, "trade price inside the spread, aggressor side undeterminable");
        (false, false)
    }
}
