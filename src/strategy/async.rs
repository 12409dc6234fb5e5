//! Asynchronous batch processing strategy
//!
//! This module provides a multi-threaded implementation of the
//! ProcessingStrategy trait. Obligations are read in batches and ingested
//! per group in parallel; once the input is exhausted every group is settled
//! in its own task.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     └── GroupProcessor (group partitioning + tokio tasks)
//!         ├── SettlementEngine (pure, shared)
//!         └── AsyncLedger (DashMap-backed obligation store)
//! ```
//!
//! # Ordering
//!
//! - Batches are ingested sequentially, so the first occurrence of a
//!   duplicate id wins even across batch boundaries
//! - Within a batch, groups are ingested in parallel
//! - Settlement starts only after the whole file is ingested, so each group
//!   is planned from a complete snapshot

use crate::core::{AsyncLedger, EngineConfig, GroupProcessor, SettlementEngine};
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::write_settlements_csv;
use crate::strategy::{collect_outcomes, write_ledger_file, ProcessingStrategy, RunSummary};
use crate::types::SettlementError;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Configuration for batch processing
///
/// Controls how obligations are batched and the number of worker threads.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Number of obligations per batch
    pub batch_size: usize,
    /// Number of runtime worker threads
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig; zero values fall back to the defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            tracing::warn!(
                "invalid batch_size ({}), using default ({})",
                batch_size,
                default.batch_size
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            tracing::warn!(
                "invalid max_concurrent_batches ({}), using default ({})",
                max_concurrent_batches,
                default.max_concurrent_batches
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch processing strategy
///
/// Produces the same output as the synchronous strategy for the same input.
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
    engine: Arc<SettlementEngine>,
    ledger_out: Option<PathBuf>,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig, engine_config: EngineConfig, ledger_out: Option<PathBuf>) -> Self {
        Self {
            config,
            engine: Arc::new(SettlementEngine::new(engine_config)),
            ledger_out,
        }
    }

    async fn run(
        &self,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<RunSummary, SettlementError> {
        let processor = GroupProcessor::new(Arc::clone(&self.engine), Arc::new(AsyncLedger::new()));

        let file = tokio::fs::File::open(input_path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => SettlementError::FileNotFound {
                path: input_path.display().to_string(),
            },
            _ => SettlementError::from(e),
        })?;

        // csv-async reads through the futures io traits
        let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
        let mut reader = AsyncReader::new(compat_file);

        let mut duplicates = 0;
        loop {
            let batch = reader.read_batch(self.config.batch_size).await;
            if batch.is_empty() {
                break;
            }

            // Wait for the batch before reading the next one to keep per-group order
            duplicates += processor.ingest_batch(batch).await.len();
        }

        let outcomes = processor.settle_all(self.ledger_out.is_some()).await;
        let (reports, summary) = collect_outcomes(outcomes, reader.rejected() + duplicates);
        write_settlements_csv(&reports, output)?;

        if let Some(path) = &self.ledger_out {
            write_ledger_file(input_path, path, &processor.ledger().obligations())?;
        }

        Ok(summary)
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    /// Process obligations from input file and write settlements to output
    ///
    /// Builds a multi-threaded tokio runtime with `max_concurrent_batches`
    /// workers and drives the whole run on it.
    fn process(
        &self,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<RunSummary, SettlementError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()?;

        runtime.block_on(self.run(input_path, output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::SyncProcessingStrategy;
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

    fn strategy(batch_size: usize, ledger_out: Option<PathBuf>) -> AsyncProcessingStrategy {
        AsyncProcessingStrategy::new(
            BatchConfig::new(batch_size, 4),
            EngineConfig::default(),
            ledger_out,
        )
    }

    #[test]
    fn test_batch_config_zero_values_fall_back() {
        let config = BatchConfig::new(0, 0);
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.max_concurrent_batches, num_cpus::get());
    }

    #[test]
    fn test_async_strategy_nets_chain() {
        let file = create_temp_csv(&format!(
            "{}1,trip,b,Bob,c,Carol,30.00,\n2,trip,a,Alice,b,Bob,30.00,\n",
            HEADER
        ));
        let mut output = Vec::new();

        let summary = strategy(1000, None).process(file.path(), &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "group,from,from_name,to,to_name,amount\ntrip,a,Alice,c,Carol,30.00\n"
        );
        assert_eq!(summary.settlements, 1);
    }

    #[test]
    fn test_async_strategy_handles_missing_file() {
        let mut output = Vec::new();

        let result = strategy(1000, None).process(Path::new("nonexistent.csv"), &mut output);
        assert!(matches!(result, Err(SettlementError::FileNotFound { .. })));
    }

    #[test]
    fn test_async_strategy_first_duplicate_wins_across_batches() {
        // batch size 2 puts the duplicate of id 1 into the second batch
        let file = create_temp_csv(&format!(
            "{}1,g,a,A,b,B,10.00,\n2,h,x,X,y,Y,1.00,\n1,g,a,A,b,B,99.00,\n",
            HEADER
        ));
        let mut output = Vec::new();

        let summary = strategy(2, None).process(file.path(), &mut output).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("g,a,A,b,B,10.00"));
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_async_strategy_matches_sync_strategy() {
        let mut rows = String::from(HEADER);
        for id in 0..60u64 {
            let debtor = id % 5;
            let creditor = (id * 3 + 1) % 5;
            rows.push_str(&format!(
                "{},g{},p{},P{},p{},P{},{}.{:02},\n",
                id,
                id % 4,
                debtor,
                debtor,
                creditor,
                creditor,
                id + 1,
                id % 100
            ));
        }
        let file = create_temp_csv(&rows);

        let mut async_output = Vec::new();
        let async_summary = strategy(7, None).process(file.path(), &mut async_output).unwrap();

        let mut sync_output = Vec::new();
        let sync_summary = SyncProcessingStrategy::default()
            .process(file.path(), &mut sync_output)
            .unwrap();

        assert_eq!(async_output, sync_output);
        assert_eq!(async_summary, sync_summary);
    }

    #[test]
    fn test_async_strategy_writes_confirmed_ledger() {
        let ledger_file = NamedTempFile::new().unwrap();
        let file = create_temp_csv(&format!(
            "{}1,trip,a,Alice,b,Bob,50.00,\n2,trip,a,Alice,c,Carol,50.00,\n",
            HEADER
        ));
        let mut output = Vec::new();

        let summary = strategy(1, Some(ledger_file.path().to_path_buf()))
            .process(file.path(), &mut output)
            .unwrap();

        assert_eq!(summary.confirmed, 2);
        let ledger = fs::read_to_string(ledger_file.path()).unwrap();
        assert_eq!(ledger.matches(",settled").count(), 2);
        assert!(!ledger.contains(",pending"));
    }
}
