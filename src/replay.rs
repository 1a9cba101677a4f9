//! Line-oriented event ingestion: parses the three feed file formats
//! and drives a [`ReconciliationEngine`] over them in timestamp order.
//!
//! Grounded on `MarketDataIngestor.cpp`: load each file into a flat
//! event list tagged with its feed, stable-sort by timestamp, then
//! dispatch each event to the matching engine entry point.

use crate::reconciliation::engine::ReconciliationEngine;
use crate::reconciliation::types::{L3Action, Price, Quantity, Side, Timestamp};
use crate::OrderBookError;
use std::path::Path;

/// One parsed market-data event, tagged with its originating feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A full L2 snapshot: `(timestamp, raw tail after the timestamp)`.
    L2Snapshot(Timestamp, String),
    /// A single L3 update line: `(timestamp, raw tail after the timestamp)`.
    L3Update(Timestamp, String),
    /// A single trade print line: `(timestamp, raw tail after the timestamp)`.
    Trade(Timestamp, String),
}

impl Event {
    fn timestamp(&self) -> Timestamp {
        match self {
            Event::L2Snapshot(ts, _) | Event::L3Update(ts, _) | Event::Trade(ts, _) => *ts,
        }
    }
}

fn load_file(path: &Path, wrap: impl Fn(Timestamp, String) -> Event) -> Result<Vec<Event>, OrderBookError> {
    let contents = std::fs::read_to_string(path)?;
    let mut events = Vec::new();
    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let Some((ts_token, rest)) = line.split_once(' ') else {
            tracing::warn!(line, "skipping line with no timestamp field");
            continue;
        };
        let Ok(ts) = ts_token.parse::<u64>() else {
            tracing::warn!(line, "skipping line with unparseable timestamp");
            continue;
        };
        events.push(wrap(Timestamp::new(ts), rest.to_string()));
    }
    Ok(events)
}

/// Loads and merges the three feed files into a single timestamp-ordered
/// event stream. A stable sort preserves each file's own relative order
/// among events sharing a timestamp.
pub fn load_events(l2_path: &Path, l3_path: &Path, trades_path: &Path) -> Result<Vec<Event>, OrderBookError> {
    let mut events = load_file(l2_path, Event::L2Snapshot)?;
    events.extend(load_file(l3_path, Event::L3Update)?);
    events.extend(load_file(trades_path, Event::Trade)?);
    events.sort_by_key(Event::timestamp);
    Ok(events)
}

type Ladder = Vec<(Price, Quantity)>;

fn parse_l2_snapshot(rest: &str) -> Result<(Ladder, Ladder), OrderBookError> {
    let mut tokens = rest.split_whitespace();
    let invalid = |reason: &str| OrderBookError::ParseError {
        line: rest.to_string(),
        reason: reason.to_string(),
    };
    match tokens.next() {
        Some("BID") => {}
        _ => return Err(invalid("expected BID section")),
    }

    let mut bids = Vec::new();
    let mut asks = Vec::new();
    loop {
        match tokens.next() {
            Some("ASK") | None => break,
            Some(price_tok) => {
                let price = Price::from_decimal_str(price_tok)?;
                let qty_tok = tokens.next().ok_or_else(|| invalid("missing bid quantity"))?;
                let qty: Quantity = qty_tok.parse().map_err(|_| invalid("invalid bid quantity"))?;
                bids.push((price, qty));
            }
        }
    }
    while let Some(price_tok) = tokens.next() {
        let price = Price::from_decimal_str(price_tok)?;
        let qty_tok = tokens.next().ok_or_else(|| invalid("missing ask quantity"))?;
        let qty: Quantity = qty_tok.parse().map_err(|_| invalid("invalid ask quantity"))?;
        asks.push((price, qty));
    }
    Ok((bids, asks))
}

fn parse_l3_update(rest: &str) -> Result<(L3Action, i64, Side, Price, Quantity), OrderBookError> {
    let invalid = |reason: &str| OrderBookError::ParseError {
        line: rest.to_string(),
        reason: reason.to_string(),
    };
    let mut tokens = rest.split_whitespace();
    let action = match tokens.next() {
        Some("ADD") => L3Action::Add,
        Some("MODIFY") => L3Action::Modify,
        Some("CANCEL") => L3Action::Cancel,
        _ => return Err(invalid("unrecognised L3 action")),
    };
    let order_id: i64 = tokens
        .next()
        .ok_or_else(|| invalid("missing order id"))?
        .parse()
        .map_err(|_| invalid("invalid order id"))?;
    let side_tok = tokens.next().unwrap_or("BUY");
    let side = side_tok.parse::<Side>().unwrap_or(Side::Buy);
    let price = tokens.next().map(Price::from_decimal_str).transpose()?.unwrap_or(Price::ZERO);
    let size = tokens
        .next()
        .map(|s| s.parse::<Quantity>())
        .transpose()
        .map_err(|_| invalid("invalid size"))?
        .unwrap_or(Quantity::ZERO);
    Ok((action, order_id, side, price, size))
}

fn parse_trade(rest: &str) -> Result<(Price, Quantity), OrderBookError> {
    let invalid = |reason: &str| OrderBookError::ParseError {
        line: rest.to_string(),
        reason: reason.to_string(),
    };
    let mut tokens = rest.split_whitespace();
    let price = Price::from_decimal_str(tokens.next().ok_or_else(|| invalid("missing price"))?)?;
    let qty: Quantity = tokens
        .next()
        .ok_or_else(|| invalid("missing quantity"))?
        .parse()
        .map_err(|_| invalid("invalid quantity"))?;
    Ok((price, qty))
}

/// Dispatches a timestamp-ordered event stream to `engine`'s entry
/// points. Malformed lines are logged and skipped; a skipped line never
/// aborts the run.
pub fn run(engine: &ReconciliationEngine, events: &[Event]) {
    for event in events {
        match event {
            Event::L2Snapshot(ts, rest) => match parse_l2_snapshot(rest) {
                Ok((bids, asks)) => engine.process_l2_snapshot(&bids, &asks, *ts),
                Err(err) => tracing::warn!(%err, "skipping malformed L2 snapshot"),
            },
            Event::L3Update(ts, rest) => match parse_l3_update(rest) {
                Ok((action, order_id, side, price, size)) => {
                    engine.process_l3_update(action, crate::OrderId::new(order_id), side, price, size, *ts);
                }
                Err(err) => tracing::warn!(%err, "skipping malformed L3 update"),
            },
            Event::Trade(ts, rest) => match parse_trade(rest) {
                Ok((price, qty)) => engine.process_trade(price, qty, *ts),
                Err(err) => tracing::warn!(%err, "skipping malformed trade"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciliation::callbacks::OrderBookCallbacks;
    use crate::reconciliation::engine::EngineConfig;

    #[test]
    fn parses_and_merges_by_timestamp() {
        let events = vec![
            Event::Trade(Timestamp::new(3), "100.0 10".to_string()),
            Event::L3Update(Timestamp::new(1), "ADD 1 BUY 100.0 200".to_string()),
            Event::L2Snapshot(Timestamp::new(2), "BID 100.0 200 ASK".to_string()),
        ];
        let mut sorted = events.clone();
        sorted.sort_by_key(Event::timestamp);
        assert_eq!(sorted[0].timestamp(), Timestamp::new(1));
        assert_eq!(sorted[2].timestamp(), Timestamp::new(3));
    }

    #[test]
    fn run_drives_engine_end_to_end() {
        let engine = ReconciliationEngine::new(EngineConfig::default(), OrderBookCallbacks::new()).unwrap();
        let events = vec![
            Event::L3Update(Timestamp::new(1), "ADD 1 BUY 100.0 200".to_string()),
            Event::L3Update(Timestamp::new(2), "ADD 2 SELL 101.0 100".to_string()),
        ];
        run(&engine, &events);
        assert_eq!(engine.smart_book().best_bid(), Some(Price::from_decimal_str("100.0").unwrap()));
        assert_eq!(engine.smart_book().best_ask(), Some(Price::from_decimal_str("101.0").unwrap()));
    }

    #[test]
    fn malformed_line_is_skipped_not_fatal() {
        let engine = ReconciliationEngine::new(EngineConfig::default(), OrderBookCallbacks::new()).unwrap();
        let events = vec![Event::L3Update(Timestamp::new(1), "GARBAGE".to_string())];
        run(&engine, &events);
        assert!(engine.smart_book().is_empty());
    }
}
