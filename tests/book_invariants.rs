//! Property tests for `L3Book`'s structural invariants under random
//! sequences of add/modify/cancel/execute operations.

use proptest::prelude::*;
use smartbook_rs::{L3Book, OrderId, Price, Quantity, Side};

#[derive(Debug, Clone)]
enum Op {
    Add { id: i64, side: bool, price: u64, size: u64 },
    Cancel { id: i64 },
    Modify { id: i64, new_size: u64 },
    Execute { id: i64, qty: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1i64..=8, any::<bool>(), 95u64..=105, 1u64..=50)
            .prop_map(|(id, side, price, size)| Op::Add { id, side, price, size }),
        (1i64..=8).prop_map(|id| Op::Cancel { id }),
        (1i64..=8, 1u64..=50).prop_map(|(id, new_size)| Op::Modify { id, new_size }),
        (1i64..=8, 1u64..=50).prop_map(|(id, qty)| Op::Execute { id, qty }),
    ]
}

fn assert_invariants(book: &L3Book) {
    for side in [Side::Buy, Side::Sell] {
        for (price, level_qty) in book.levels(side) {
            let orders = book.level_orders_fifo(side, price);
            assert!(!orders.is_empty(), "no zero-count levels may persist");
            let sum: u64 = orders.iter().map(|o| o.size.as_u64()).sum();
            assert_eq!(sum, level_qty.as_u64(), "level quantity must equal the sum of its resting orders");
            assert_eq!(orders.len() as u64, book.level_orders_fifo(side, price).len() as u64);
        }
    }

    if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
        let bids = book.levels(Side::Buy);
        let asks = book.levels(Side::Sell);
        assert_eq!(bids.first().map(|(p, _)| *p), Some(bid), "best bid must be the greatest resting bid key");
        assert_eq!(asks.first().map(|(p, _)| *p), Some(ask), "best ask must be the smallest resting ask key");
    }
}

proptest! {
    #[test]
    fn l3_book_invariants_hold(ops in proptest::collection::vec(op_strategy(), 0..60)) {
        let book = L3Book::new();
        for op in ops {
            match op {
                Op::Add { id, side, price, size } => {
                    let side = if side { Side::Buy } else { Side::Sell };
                    book.add_order(OrderId::new(id), side, Quantity::new(size), Price::from_ticks(price as u128 * 1_000_000));
                }
                Op::Cancel { id } => {
                    book.cancel_order(OrderId::new(id));
                }
                Op::Modify { id, new_size } => {
                    book.modify_order_size(OrderId::new(id), Quantity::new(new_size));
                }
                Op::Execute { id, qty } => {
                    book.execute_order(OrderId::new(id), Quantity::new(qty));
                }
            }
            assert_invariants(&book);
        }
    }
}
