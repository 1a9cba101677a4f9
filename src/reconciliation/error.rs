//! Reconciliation engine error types

use super::types::{OrderId, Side};
use std::fmt;

/// Errors that can occur within the SmartBook reconciliation engine.
#[derive(Debug)]
#[non_exhaustive]
pub enum OrderBookError {
    /// Order not found in the book.
    OrderNotFound(OrderId),

    /// Order id already present in the book.
    DuplicateOrder(OrderId),

    /// Attempted to rest a market order (price <= 0).
    InvalidPrice(String),

    /// Attempted to set a size of zero or less on a resting order.
    InvalidQuantity {
        /// The order the invalid size was requested for.
        order_id: OrderId,
        /// The rejected size.
        size: i64,
    },

    /// Unrecognised side token on the wire.
    InvalidSide(String),

    /// `execute_at_price` was asked to execute at a price that is
    /// neither the current best bid nor the current best ask.
    PriceNotBest {
        /// The side the execution was attempted on.
        side: Side,
        /// The requested price.
        price: String,
    },

    /// A market-data line was malformed and could not be parsed.
    ParseError {
        /// The offending line.
        line: String,
        /// Why it failed to parse.
        reason: String,
    },

    /// `execution_probability` was outside the permitted `[0, 1]` range.
    InvalidExecutionProbability(f64),

    /// Failed to open or read one of the three event files.
    Io(String),
}

impl fmt::Display for OrderBookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderBookError::OrderNotFound(id) => write!(f, "order not found: {id}"),
            OrderBookError::DuplicateOrder(id) => write!(f, "order id already exists: {id}"),
            OrderBookError::InvalidPrice(raw) => write!(f, "invalid price: {raw}"),
            OrderBookError::InvalidQuantity { order_id, size } => {
                write!(f, "invalid size {size} for order {order_id}")
            }
            OrderBookError::InvalidSide(raw) => write!(f, "invalid side: {raw}"),
            OrderBookError::PriceNotBest { side, price } => {
                write!(f, "{price} is not the best {side} price")
            }
            OrderBookError::ParseError { line, reason } => {
                write!(f, "failed to parse line {line:?}: {reason}")
            }
            OrderBookError::InvalidExecutionProbability(p) => {
                write!(f, "execution_probability {p} is outside [0, 1]")
            }
            OrderBookError::Io(msg) => write!(f, "io error: {msg}"),
        }
    }
}

impl std::error::Error for OrderBookError {}

impl From<std::io::Error> for OrderBookError {
    fn from(err: std::io::Error) -> Self {
        OrderBookError::Io(err.to_string())
    }
}
