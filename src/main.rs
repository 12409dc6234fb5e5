//! Settlement engine CLI
//!
//! Reads pending obligations from a CSV file and prints, per group, the
//! payments that clear every balance.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- obligations.csv > settlements.csv
//! cargo run -- --strategy sync obligations.csv > settlements.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 obligations.csv > settlements.csv
//! cargo run -- --on-inconsistency mark-settled --ledger-out ledger.csv obligations.csv
//! ```
//!
//! Diagnostics go to stderr; set `RUST_LOG` to change the level (default `info`).
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, file not writable, etc.)
//! - 2: Settlements written, but some groups need manual reconciliation

use rust_settlement_engine::cli;
use rust_settlement_engine::strategy;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = cli::parse_args();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(
            args.strategy.clone(),
            config,
            args.to_engine_config(),
            args.ledger_out.clone(),
        )
    };

    let mut output = std::io::stdout().lock();
    match strategy.process(&args.input_file, &mut output) {
        Ok(summary) => {
            tracing::info!(
                groups = summary.groups,
                settlements = summary.settlements,
                skipped = summary.skipped,
                confirmed = summary.confirmed,
                "settlement run finished"
            );
            if summary.needs_reconciliation() {
                tracing::warn!(
                    rejected = ?summary.rejected_groups,
                    partial = ?summary.partial_groups,
                    "some groups need manual reconciliation"
                );
                process::exit(2);
            }
        }
        Err(e) => {
            tracing::error!("{}", e);
            process::exit(1);
        }
    }
}
