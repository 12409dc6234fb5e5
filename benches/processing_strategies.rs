//! Benchmark suite for comparing processing strategies
//!
//! Compares the synchronous and asynchronous strategies end to end, and the
//! planner on its own, using the divan benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```
//!
//! Input ledgers are generated into temporary files before timing starts.
//! Obligations are spread over 50 groups of up to 20 participants each.

use rust_settlement_engine::cli::StrategyType;
use rust_settlement_engine::core::{BalanceAggregator, EngineConfig, SettlementPlanner};
use rust_settlement_engine::strategy::{create_strategy, BatchConfig};
use rust_settlement_engine::types::{Cents, Obligation, ObligationStatus, Participant};
use std::io::Write;
use tempfile::NamedTempFile;

const SIZES: &[usize] = &[100, 1_000, 100_000];

fn main() {
    divan::main();
}

/// Deterministic pseudo-random obligation rows
fn rows(count: usize) -> impl Iterator<Item = (usize, usize, usize, u64)> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    (0..count).map(move |id| {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let group = (state % 50) as usize;
        let debtor = ((state >> 8) % 20) as usize;
        let creditor = ((state >> 16) % 20) as usize;
        let cents = 1 + (state >> 24) % 100_000;
        (id, group, debtor * 100 + creditor, cents)
    })
}

fn generate_ledger(count: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(file, "id,group,debtor,debtor_name,creditor,creditor_name,amount,status").unwrap();
    for (id, group, pair, cents) in rows(count) {
        let (debtor, creditor) = (pair / 100, pair % 100);
        writeln!(
            file,
            "{},g{},p{},Person {},p{},Person {},{}.{:02},pending",
            id,
            group,
            debtor,
            debtor,
            creditor,
            creditor,
            cents / 100,
            cents % 100
        )
        .unwrap();
    }
    file.flush().unwrap();
    file
}

fn generate_obligations(count: usize) -> Vec<Obligation> {
    rows(count)
        .map(|(id, _, pair, cents)| Obligation {
            id: id as u64,
            group: "g".to_string(),
            debtor: Participant::new(format!("p{}", pair / 100), ""),
            creditor: Participant::new(format!("p{}", pair % 100), ""),
            amount: Cents::new(cents as i64),
            status: ObligationStatus::Pending,
        })
        .collect()
}

#[divan::bench(args = SIZES)]
fn sync_strategy(bencher: divan::Bencher, size: usize) {
    let input = generate_ledger(size);
    let strategy = create_strategy(StrategyType::Sync, None, EngineConfig::default(), None);

    bencher.bench_local(|| {
        let mut output = Vec::new();
        strategy
            .process(input.path(), &mut output)
            .expect("Processing failed");
    });
}

#[divan::bench(args = SIZES)]
fn async_strategy(bencher: divan::Bencher, size: usize) {
    let input = generate_ledger(size);
    let strategy = create_strategy(
        StrategyType::Async,
        Some(BatchConfig::default()),
        EngineConfig::default(),
        None,
    );

    bencher.bench_local(|| {
        let mut output = Vec::new();
        strategy
            .process(input.path(), &mut output)
            .expect("Processing failed");
    });
}

/// Aggregation and planning for a single group, without I/O
#[divan::bench(args = SIZES)]
fn aggregate_and_plan(bencher: divan::Bencher, size: usize) {
    let obligations = generate_obligations(size);
    let aggregator = BalanceAggregator::new();
    let planner = SettlementPlanner::new();

    bencher.bench_local(|| {
        let aggregation = aggregator.aggregate(&obligations).expect("Aggregation failed");
        planner.plan(&aggregation.balances).expect("Planning failed")
    });
}
