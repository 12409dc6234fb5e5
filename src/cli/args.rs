use crate::core::{EngineConfig, InconsistencyPolicy};
use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Compute minimal settlement plans for shared-expense groups
#[derive(Parser, Debug)]
#[command(name = "settlement-engine")]
#[command(about = "Compute minimal settlement plans for shared-expense groups", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing obligation records
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    /// Processing strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        env = "SETTLEMENT_STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' for synchronous or 'async' for asynchronous"
    )]
    pub strategy: StrategyType,

    /// Number of obligations per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        env = "SETTLEMENT_BATCH_SIZE",
        help = "Number of obligations per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        env = "SETTLEMENT_MAX_CONCURRENT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// What to do with groups whose balances do not add up
    #[arg(
        long = "on-inconsistency",
        value_name = "POLICY",
        env = "SETTLEMENT_ON_INCONSISTENCY",
        default_value = "reject",
        help = "'reject' to flag the group for reconciliation, 'mark-settled' to settle it as-is"
    )]
    pub on_inconsistency: PolicyArg,

    /// Confirm every plan and write the updated ledger here
    #[arg(
        long = "ledger-out",
        value_name = "PATH",
        env = "SETTLEMENT_LEDGER_OUT",
        help = "Confirm all plans and write the updated ledger CSV to PATH"
    )]
    pub ledger_out: Option<PathBuf>,
}

/// Available processing strategies
#[derive(Clone, Debug, PartialEq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

/// Command-line spelling of [`InconsistencyPolicy`]
#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
pub enum PolicyArg {
    Reject,
    MarkSettled,
}

impl From<PolicyArg> for InconsistencyPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Reject => InconsistencyPolicy::Reject,
            PolicyArg::MarkSettled => InconsistencyPolicy::MarkAllSettled,
        }
    }
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Missing values take their defaults; zero values fall back to the
    /// defaults with a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }

    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            inconsistency_policy: self.on_inconsistency.into(),
        }
    }
}
