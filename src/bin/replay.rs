//! Demo driver: replays three feed files through a `ReconciliationEngine`
//! and prints every callback it fires. Grounded on the original `main.cpp`.

use smartbook_rs::reconciliation::callbacks::OrderBookCallbacks;
use smartbook_rs::reconciliation::engine::EngineConfig;
use smartbook_rs::replay::{self, run};
use smartbook_rs::ReconciliationEngine;
use std::path::PathBuf;
use std::process::ExitCode;

fn usage() -> String {
    "usage: smartbook-replay <l2_file> <l3_file> <trades_file>".to_string()
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [l2, l3, trades] = args.as_slice() else {
        eprintln!("{}", usage());
        return ExitCode::FAILURE;
    };

    let callbacks = OrderBookCallbacks::new()
        .on_add(|_, info| println!("[ADD{}] {} {} {} @ {}", guess_tag(info), info.order_id, info.side, info.size, info.price))
        .on_modify(|_, info| println!("[MODIFY{}] {} {} {} @ {}", guess_tag(info), info.order_id, info.side, info.size, info.price))
        .on_cancel(|_, info| println!("[CANCEL{}] {} {} {} @ {}", guess_tag(info), info.order_id, info.side, info.size, info.price))
        .on_execution(|_, info| println!("[EXECUTION{}] {} {} @ {}", guess_tag(info), info.order_id, info.size, info.price));

    let engine = match ReconciliationEngine::new(EngineConfig::default(), callbacks) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("failed to start engine: {err}");
            return ExitCode::FAILURE;
        }
    };

    let events = match replay::load_events(&PathBuf::from(l2), &PathBuf::from(l3), &PathBuf::from(trades)) {
        Ok(events) => events,
        Err(err) => {
            eprintln!("failed to load events: {err}");
            return ExitCode::FAILURE;
        }
    };

    run(&engine, &events);
    println!("processed {} events, {} guesses outstanding", events.len(), engine.guess_count());
    ExitCode::SUCCESS
}

fn guess_tag(info: &smartbook_rs::OrderInfo) -> &'static str {
    if info.is_guess {
        " (guess)"
    } else {
        ""
    }
}
