//! Core value types shared across the book and the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Domain value type representing a price, stored as fixed-point ticks.
///
/// Equality and ordering act on the raw tick value only — callers are
/// responsible for using a consistent tick scale across feeds, since
/// prices are used as map keys with no tolerance compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(u128);

impl Price {
    /// Number of ticks per unit when parsing decimal literals off the wire.
    pub const SCALE: u128 = 1_000_000;

    /// Zero price. Market orders (price <= 0) are rejected by `L3Book::add_order`.
    pub const ZERO: Self = Self(0);

    /// Creates a price from a raw tick value.
    #[must_use]
    pub const fn from_ticks(ticks: u128) -> Self {
        Self(ticks)
    }

    /// Parses a decimal literal (e.g. `"100.25"`) into fixed-point ticks.
    pub fn from_decimal_str(s: &str) -> Result<Self, crate::OrderBookError> {
        let invalid = || crate::OrderBookError::InvalidPrice(s.to_string());
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        let whole: u128 = whole.parse().map_err(|_| invalid())?;
        let mut frac_digits = frac.chars().take(6).collect::<String>();
        while frac_digits.len() < 6 {
            frac_digits.push('0');
        }
        let frac_value: u128 = if frac_digits.is_empty() {
            0
        } else {
            frac_digits.parse().map_err(|_| invalid())?
        };
        Ok(Self(whole * Self::SCALE + frac_value))
    }

    /// Returns the raw tick value.
    #[must_use]
    pub const fn as_ticks(self) -> u128 {
        self.0
    }

    /// True when this price is usable for a resting limit order (> 0).
    #[must_use]
    pub const fn is_valid_limit(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.0 / Self::SCALE, self.0 % Self::SCALE)
    }
}

/// Domain value type representing a non-negative quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u64);

impl Quantity {
    /// Zero quantity.
    pub const ZERO: Self = Self(0);

    /// Creates a quantity from a raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Saturating subtraction, used when deriving remaining size after a fill.
    #[must_use]
    pub fn saturating_sub(self, other: Quantity) -> Quantity {
        Self(self.0.saturating_sub(other.0))
    }

    /// Saturating addition, used when aggregating level quantity.
    #[must_use]
    pub fn saturating_add(self, other: Quantity) -> Quantity {
        Self(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Quantity {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}

/// Monotonically non-decreasing ordering key. Carries no wall-clock semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a timestamp from a raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Timestamp {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}

/// Order identifier. Negative values are synthetic (engine-generated for a
/// guess); non-negative values are real, sourced from the L3 feed.
///
/// `pricelevel::Id` (UUID/ULID/unsigned-sequential) cannot express this
/// sign convention, so this crate defines its own narrow identifier type
/// rather than depend on that crate's `Id` — see `DESIGN.md`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(i64);

impl OrderId {
    /// Creates an order id from a raw signed value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw signed value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// True when this id was generated by the engine for a guess rather
    /// than sourced from the real L3 feed.
    #[must_use]
    pub const fn is_synthetic(self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrderId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(Self)
    }
}

/// Side of the book an order or level belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Bid side.
    Buy,
    /// Ask side.
    Sell,
}

impl Side {
    /// Returns the opposite side.
    #[must_use]
    pub const fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for Side {
    type Err = crate::OrderBookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            other => Err(crate::OrderBookError::InvalidSide(other.to_string())),
        }
    }
}

/// A single resting order as stored in an `L3Book`'s FIFO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier, synthetic or real.
    pub id: OrderId,
    /// Side this order rests on.
    pub side: Side,
    /// Limit price.
    pub price: Price,
    /// Remaining resting size.
    pub size: Quantity,
    /// Timestamp of the last update that touched this order.
    pub timestamp: Timestamp,
}

/// The action an `OrderInfo` record describes.
///
/// Stands in for the string tag (`"ADD"`, `"MODIFY"`, ...) carried by the
/// original C++ `OrderInfo::action` field — an enum is the idiomatic,
/// exhaustively-matched replacement (see REDESIGN FLAGS in `SPEC_FULL.md`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// A new order was added.
    Add,
    /// An existing order's size and/or price changed.
    Modify,
    /// An existing order was removed.
    Cancel,
    /// An order was (partially or fully) executed.
    Execution,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Add => write!(f, "ADD"),
            Action::Modify => write!(f, "MODIFY"),
            Action::Cancel => write!(f, "CANCEL"),
            Action::Execution => write!(f, "EXECUTION"),
        }
    }
}

/// A provisional or confirmed book mutation, as produced by the
/// reconciliation engine and delivered to callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInfo {
    /// Order identifier this record describes.
    pub order_id: OrderId,
    /// Side of the order.
    pub side: Side,
    /// Price of the order (or of the execution, for `Action::Execution`).
    pub price: Price,
    /// Current size (remaining size for Add/Modify, executed qty for Execution).
    pub size: Quantity,
    /// What kind of mutation this record describes.
    pub action: Action,
    /// Timestamp of the event that produced this record.
    pub timestamp: Timestamp,
    /// Size before this mutation was applied (used to derive fill deltas).
    pub original_qty: Quantity,
    /// True while this record is an unconfirmed guess.
    pub is_guess: bool,
    /// True when this record is an incoming (aggressor) order rather
    /// than a change to a resting order.
    pub is_marketable: bool,
    /// True while a follow-up confirmation (the other half of an
    /// aggressor ADD+CANCEL pair, or a trade print) is still outstanding.
    pub is_pending: bool,
}

/// The action carried by an incoming L3 feed event. A narrower type than
/// [`Action`] since the feed never reports an execution directly — those
/// are inferred by the engine from trades and L2 deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum L3Action {
    /// A new order was added.
    Add,
    /// An existing order's size and/or price changed.
    Modify,
    /// An existing order was removed.
    Cancel,
}

impl fmt::Display for L3Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            L3Action::Add => write!(f, "ADD"),
            L3Action::Modify => write!(f, "MODIFY"),
            L3Action::Cancel => write!(f, "CANCEL"),
        }
    }
}

/// A single public trade print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Trade price.
    pub price: Price,
    /// Trade quantity.
    pub quantity: Quantity,
    /// Timestamp the print was received at.
    pub timestamp: Timestamp,
}

impl OrderInfo {
    /// Creates a confirmed (non-guess, non-marketable) `OrderInfo`.
    #[must_use]
    pub fn new(
        order_id: OrderId,
        side: Side,
        price: Price,
        size: Quantity,
        action: Action,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            order_id,
            side,
            price,
            size,
            action,
            timestamp,
            original_qty: Quantity::ZERO,
            is_guess: false,
            is_marketable: false,
            is_pending: false,
        }
    }
}
