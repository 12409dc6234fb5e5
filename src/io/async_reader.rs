//! Asynchronous CSV reader with batch interface
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of Obligations
//!                  ↓
//!           csv_format module
//!           (CsvRecord, convert_csv_record)
//! ```
//!
//! Rows that fail to parse or convert are logged and counted, never fatal.

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::Obligation;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;

/// Asynchronous CSV reader
///
/// Provides batch reading over obligation records.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    rejected: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            rejected: 0,
        }
    }

    /// Read up to `batch_size` obligations
    ///
    /// Invalid rows are logged and skipped. Returns an empty vector once the
    /// input is exhausted.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Obligation> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CsvRecord>();

        while batch.len() < batch_size {
            match records.next().await {
                Some(Ok(csv_record)) => match convert_csv_record(csv_record) {
                    Ok(obligation) => batch.push(obligation),
                    Err(e) => {
                        tracing::warn!("skipping row: {}", e);
                        self.rejected += 1;
                    }
                },
                Some(Err(e)) => {
                    tracing::warn!("CSV parse error: {}", e);
                    self.rejected += 1;
                }
                None => break,
            }
        }

        batch
    }

    /// Rows skipped so far
    pub fn rejected(&self) -> usize {
        self.rejected
    }
}
