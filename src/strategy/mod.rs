//! Processing strategy module for settlement runs
//!
//! This module defines the Strategy pattern for complete settlement pipelines,
//! encompassing CSV parsing, per-group settlement and output. Different
//! processing implementations (synchronous, asynchronous batch) can be selected
//! at runtime.

use crate::cli::StrategyType;
use crate::core::{EngineConfig, GroupOutcome, ReportStatus, SettlementReport};
use crate::io::csv_format::write_ledger_csv;
use crate::types::{GroupId, Obligation, SettlementError};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// What a settlement run did, for logging and the exit status
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Groups that were settled
    pub groups: usize,

    /// Settlement instructions written
    pub settlements: usize,

    /// Rows and obligations skipped as invalid
    pub skipped: usize,

    /// Obligations marked settled by confirmed plans
    pub confirmed: usize,

    /// Groups whose balances were rejected as inconsistent
    pub rejected_groups: Vec<GroupId>,

    /// Groups whose plan stopped with money left unsettled
    pub partial_groups: Vec<GroupId>,
}

impl RunSummary {
    /// Whether any group needs manual reconciliation
    pub fn needs_reconciliation(&self) -> bool {
        !self.rejected_groups.is_empty() || !self.partial_groups.is_empty()
    }
}

/// Processing strategy trait for complete settlement pipelines
///
/// Each strategy reads obligations from a CSV file, settles every group
/// through the engine and writes the settlement instructions to output.
pub trait ProcessingStrategy: Send + Sync {
    /// Process obligations from input file and write settlements to output
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input file cannot be opened (file not found, permission denied)
    /// - Output or the ledger file cannot be written
    ///
    /// Invalid rows, skipped obligations and rejected groups are logged and
    /// reported in the [`RunSummary`]; they do not fail the run.
    fn process(
        &self,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<RunSummary, SettlementError>;
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `config` - Optional configuration for async batch processing (ignored for sync)
/// * `engine_config` - Settlement engine configuration
/// * `ledger_out` - When set, plans are confirmed and the ledger is written here
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
    engine_config: EngineConfig,
    ledger_out: Option<PathBuf>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(engine_config, ledger_out)),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config, engine_config, ledger_out))
        }
    }
}

/// Split group outcomes into the reports to write and the run summary
///
/// `outcomes` must already be ordered by group id.
pub(crate) fn collect_outcomes(
    outcomes: Vec<GroupOutcome>,
    skipped_rows: usize,
) -> (Vec<SettlementReport>, RunSummary) {
    let mut summary = RunSummary {
        groups: outcomes.len(),
        skipped: skipped_rows,
        ..RunSummary::default()
    };
    let mut reports = Vec::with_capacity(outcomes.len());

    for outcome in outcomes {
        summary.confirmed += outcome.confirmed;

        match outcome.result {
            Ok(report) => {
                summary.settlements += report.settlements.len();
                summary.skipped += report.warnings.len();
                if let ReportStatus::Partial { .. } = report.status {
                    summary.partial_groups.push(outcome.group);
                }
                reports.push(report);
            }
            Err(_) => summary.rejected_groups.push(outcome.group),
        }
    }

    (reports, summary)
}

/// Write the ledger to `path`, replaying `input_path` with updated statuses
pub(crate) fn write_ledger_file(
    input_path: &Path,
    path: &Path,
    obligations: &[Obligation],
) -> Result<(), SettlementError> {
    let mut input = BufReader::new(File::open(input_path)?);
    let mut file = BufWriter::new(File::create(path)?);
    let copied = write_ledger_csv(&mut input, obligations, &mut file)?;
    file.flush()?;

    if copied > 0 {
        tracing::warn!(rows = copied, "copied rejected rows to the ledger unchanged");
    }
    tracing::info!(path = %path.display(), obligations = obligations.len(), "wrote ledger");
    Ok(())
}
