//! Synchronous processing strategy
//!
//! This module provides a single-threaded implementation of the
//! ProcessingStrategy trait. It orchestrates a run by coordinating:
//! - CSV parsing through `SyncReader` (iterator interface)
//! - Obligation storage in an `InMemoryLedger`
//! - Per-group settlement through the `SettlementEngine`
//! - CSV output through `csv_format::write_settlements_csv`
//!
//! Groups are settled one after another in ascending id order.

use crate::core::{EngineConfig, GroupOutcome, InMemoryLedger, ObligationStore, SettlementEngine};
use crate::io::csv_format::write_settlements_csv;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{collect_outcomes, write_ledger_file, ProcessingStrategy, RunSummary};
use crate::types::SettlementError;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Synchronous processing strategy
///
/// # Examples
///
/// ```no_run
/// use rust_settlement_engine::core::EngineConfig;
/// use rust_settlement_engine::strategy::{ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
/// use std::io;
///
/// let strategy = SyncProcessingStrategy::new(EngineConfig::default(), None);
/// let mut output = io::stdout();
///
/// strategy.process(Path::new("obligations.csv"), &mut output)
///     .expect("Processing failed");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SyncProcessingStrategy {
    engine: SettlementEngine,
    ledger_out: Option<PathBuf>,
}

impl SyncProcessingStrategy {
    pub fn new(engine_config: EngineConfig, ledger_out: Option<PathBuf>) -> Self {
        Self {
            engine: SettlementEngine::new(engine_config),
            ledger_out,
        }
    }

    fn load(&self, input_path: &Path) -> Result<(InMemoryLedger, usize), SettlementError> {
        let mut ledger = InMemoryLedger::new();
        let mut skipped = 0;

        for result in SyncReader::new(input_path)? {
            let inserted = result.and_then(|obligation| ledger.insert(obligation));
            if let Err(e) = inserted {
                tracing::warn!("skipping row: {}", e);
                skipped += 1;
            }
        }

        Ok((ledger, skipped))
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    /// Process obligations from input file and write settlements to output
    ///
    /// 1. Streams obligations from the CSV file into an in-memory ledger
    /// 2. Settles each group in ascending id order
    /// 3. Confirms each plan when a ledger output path is configured
    /// 4. Writes all settlements, then the updated ledger
    fn process(
        &self,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<RunSummary, SettlementError> {
        let (mut ledger, skipped) = self.load(input_path)?;
        let confirm = self.ledger_out.is_some();

        let mut outcomes = Vec::new();
        for group in ledger.groups() {
            let result = self.engine.settle_group(&ledger, &group);
            let confirmed = match (&result, confirm) {
                (Ok(report), true) => ledger.confirm_report(report)?,
                _ => 0,
            };
            outcomes.push(GroupOutcome {
                group,
                result,
                confirmed,
            });
        }

        let (reports, summary) = collect_outcomes(outcomes, skipped);
        write_settlements_csv(&reports, output)?;

        if let Some(path) = &self.ledger_out {
            write_ledger_file(input_path, path, &ledger.obligations())?;
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InconsistencyPolicy;
    use std::fs;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "id,group,debtor,debtor_name,creditor,creditor_name,amount,status\n";

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn run(strategy: &SyncProcessingStrategy, rows: &str) -> (String, RunSummary) {
        let file = create_temp_csv(&format!("{}{}", HEADER, rows));
        let mut output = Vec::new();
        let summary = strategy.process(file.path(), &mut output).unwrap();
        (String::from_utf8(output).unwrap(), summary)
    }

    #[test]
    fn test_sync_strategy_nets_chain() {
        let (output, summary) = run(
            &SyncProcessingStrategy::default(),
            "1,trip,b,Bob,c,Carol,30.00,\n2,trip,a,Alice,b,Bob,30.00,\n",
        );

        assert_eq!(
            output,
            "group,from,from_name,to,to_name,amount\ntrip,a,Alice,c,Carol,30.00\n"
        );
        assert_eq!(summary.groups, 1);
        assert_eq!(summary.settlements, 1);
        assert_eq!(summary.confirmed, 0);
    }

    #[test]
    fn test_sync_strategy_groups_ascending() {
        let (output, _) = run(
            &SyncProcessingStrategy::default(),
            "1,zeta,a,A,b,B,1.00,\n1,alpha,a,A,b,B,2.00,\n",
        );

        let groups: Vec<&str> = output
            .lines()
            .skip(1)
            .map(|line| line.split(',').next().unwrap())
            .collect();
        assert_eq!(groups, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_sync_strategy_counts_skipped_rows() {
        let (output, summary) = run(
            &SyncProcessingStrategy::default(),
            "1,g,a,A,b,B,20.00,\n\
             2,g,a,A,a,A,5.00,\n\
             3,g,a,A,b,B,abc,\n\
             1,g,b,B,a,A,9.00,\n",
        );

        assert_eq!(
            output,
            "group,from,from_name,to,to_name,amount\ng,a,A,b,B,20.00\n"
        );
        // bad amount and duplicate id at load, self-obligation at aggregation
        assert_eq!(summary.skipped, 3);
    }

    #[test]
    fn test_sync_strategy_handles_missing_file() {
        let strategy = SyncProcessingStrategy::default();
        let mut output = Vec::new();

        let result = strategy.process(Path::new("nonexistent.csv"), &mut output);
        assert!(matches!(result, Err(SettlementError::FileNotFound { .. })));
    }

    #[test]
    fn test_sync_strategy_writes_confirmed_ledger() {
        let ledger_file = NamedTempFile::new().unwrap();
        let strategy = SyncProcessingStrategy::new(
            EngineConfig::default(),
            Some(ledger_file.path().to_path_buf()),
        );

        let (_, summary) = run(
            &strategy,
            "1,trip,a,Alice,b,Bob,50.00,\n\
             2,trip,a,Alice,c,Carol,50.00,\n\
             3,trip,c,Carol,a,Alice,5.00,settled\n",
        );

        assert_eq!(summary.confirmed, 2);
        let ledger = fs::read_to_string(ledger_file.path()).unwrap();
        assert_eq!(
            ledger,
            "id,group,debtor,debtor_name,creditor,creditor_name,amount,status\n\
             1,trip,a,Alice,b,Bob,50.00,settled\n\
             2,trip,a,Alice,c,Carol,50.00,settled\n\
             3,trip,c,Carol,a,Alice,5.00,settled\n"
        );
    }

    #[test]
    fn test_sync_strategy_ledger_keeps_invalid_and_rejected_rows() {
        let ledger_file = NamedTempFile::new().unwrap();
        let strategy = SyncProcessingStrategy::new(
            EngineConfig::default(),
            Some(ledger_file.path().to_path_buf()),
        );

        let (output, summary) = run(
            &strategy,
            "1,g,a,A,b,B,20.00,\n\
             2,g,a,A,a,A,5.00,\n\
             3,g,b,B,c,C,-5.00,\n\
             4,g,c,C,b,B,abc,\n",
        );

        assert_eq!(output, "group,from,from_name,to,to_name,amount\ng,a,A,b,B,20.00\n");
        assert_eq!(summary.confirmed, 1);
        let ledger = fs::read_to_string(ledger_file.path()).unwrap();
        assert_eq!(
            ledger,
            "id,group,debtor,debtor_name,creditor,creditor_name,amount,status\n\
             1,g,a,A,b,B,20.00,settled\n\
             2,g,a,A,a,A,5.00,pending\n\
             3,g,b,B,c,C,-5.00,pending\n\
             4,g,c,C,b,B,abc,\n"
        );
    }

    #[test]
    fn test_sync_strategy_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SyncProcessingStrategy>();
    }

    const OVERFLOWING: &str = "1,g,a,A,c,C,92233720368547758.07,\n2,g,b,B,c,C,1.00,\n";

    #[test]
    fn test_sync_strategy_rejects_overflowing_group() {
        let (output, summary) = run(&SyncProcessingStrategy::default(), OVERFLOWING);

        assert_eq!(output, "group,from,from_name,to,to_name,amount\n");
        assert_eq!(summary.rejected_groups, vec!["g"]);
        assert!(summary.needs_reconciliation());
    }

    #[test]
    fn test_sync_strategy_mark_all_settled_policy() {
        let ledger_file = NamedTempFile::new().unwrap();
        let strategy = SyncProcessingStrategy::new(
            EngineConfig {
                inconsistency_policy: InconsistencyPolicy::MarkAllSettled,
            },
            Some(ledger_file.path().to_path_buf()),
        );

        let (output, summary) = run(&strategy, OVERFLOWING);

        assert_eq!(output, "group,from,from_name,to,to_name,amount\n");
        assert!(!summary.needs_reconciliation());
        assert_eq!(summary.confirmed, 2);
        let ledger = fs::read_to_string(ledger_file.path()).unwrap();
        assert_eq!(ledger.matches("settled").count(), 2);
    }
}
