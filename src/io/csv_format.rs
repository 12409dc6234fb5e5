//! CSV format handling for obligations, settlements and ledger output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV records to domain obligations
//! - Settlement output serialization
//! - Ledger write-back that preserves every input row
//!
//! All functions are pure (no I/O beyond the supplied writer) for easy testing.
//!
//! Input columns: `id,group,debtor,debtor_name,creditor,creditor_name,amount,status`.
//! The `status` column is optional and defaults to `pending`.

use crate::core::SettlementReport;
use crate::types::{
    Cents, GroupId, InvalidReason, Obligation, ObligationId, ObligationStatus, Participant,
    ParticipantId, SettlementError,
};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::{Read, Write};

/// CSV record structure for deserialization
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    pub id: ObligationId,
    pub group: GroupId,
    pub debtor: ParticipantId,
    #[serde(default)]
    pub debtor_name: String,
    pub creditor: ParticipantId,
    #[serde(default)]
    pub creditor_name: String,
    pub amount: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Convert a CsvRecord to an Obligation
///
/// This function:
/// - Parses the amount into cents, truncating beyond two decimals
/// - Parses the status (case-insensitive), defaulting to pending
/// - Falls back to the participant id when a name is blank
///
/// Amount sign and self-obligations are not checked here; the aggregator
/// reports those so they are never silently dropped.
///
/// # Errors
///
/// `InvalidObligation` if the amount is not a number or the status is unknown.
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<Obligation, SettlementError> {
    let amount: Cents = csv_record.amount.parse().map_err(|_| {
        SettlementError::invalid_obligation(
            csv_record.id,
            InvalidReason::UnparseableAmount(csv_record.amount.trim().to_string()),
        )
    })?;

    let status = match csv_record.status.as_deref().map(str::trim) {
        None | Some("") => ObligationStatus::Pending,
        Some(raw) => match raw.to_lowercase().as_str() {
            "pending" => ObligationStatus::Pending,
            "settled" => ObligationStatus::Settled,
            _ => {
                return Err(SettlementError::invalid_obligation(
                    csv_record.id,
                    InvalidReason::UnknownStatus(raw.to_string()),
                ))
            }
        },
    };

    Ok(Obligation {
        id: csv_record.id,
        group: csv_record.group,
        debtor: Participant::new(csv_record.debtor, csv_record.debtor_name),
        creditor: Participant::new(csv_record.creditor, csv_record.creditor_name),
        amount,
        status,
    })
}

/// Write settlement instructions to CSV format
///
/// Columns: group, from, from_name, to, to_name, amount.
/// Reports are written in the order given; each report's settlements keep
/// their emission order.
///
/// # Errors
///
/// `IoError` / `ParseError` if the writer fails.
pub fn write_settlements_csv(
    reports: &[SettlementReport],
    output: &mut dyn Write,
) -> Result<(), SettlementError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["group", "from", "from_name", "to", "to_name", "amount"])?;

    for report in reports {
        for settlement in &report.settlements {
            writer.write_record([
                report.group.as_str(),
                settlement.from.id.as_str(),
                settlement.from.label.as_str(),
                settlement.to.id.as_str(),
                settlement.to.label.as_str(),
                settlement.amount.to_string().as_str(),
            ])?;
        }
    }

    writer.flush()?;

    Ok(())
}

/// Write the ledger back out in the input format with updated statuses
///
/// Rows are replayed from `input` in file order. A row whose `(group, id)`
/// matches a stored obligation gets that obligation's status; every other
/// row (malformed, unparseable, a later duplicate id) is copied unchanged,
/// so nothing recorded in the input is lost. A missing `status` column is
/// appended.
///
/// Returns the number of rows copied unchanged.
///
/// # Errors
///
/// `IoError` / `ParseError` if the input cannot be read or the writer fails.
pub fn write_ledger_csv(
    input: &mut dyn Read,
    obligations: &[Obligation],
    output: &mut dyn Write,
) -> Result<usize, SettlementError> {
    let mut statuses: BTreeMap<(GroupId, ObligationId), ObligationStatus> = obligations
        .iter()
        .map(|o| ((o.group.clone(), o.id), o.status))
        .collect();

    let mut reader = ReaderBuilder::new().flexible(true).from_reader(input);
    let mut writer = WriterBuilder::new().flexible(true).from_writer(output);

    let mut headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Ok(0);
    }
    let mut trimmed_headers = headers.clone();
    trimmed_headers.trim();
    let status_index = match trimmed_headers.iter().position(|h| h == "status") {
        Some(index) => index,
        None => {
            headers.push_field("status");
            trimmed_headers.push_field("status");
            headers.len() - 1
        }
    };
    writer.write_record(&headers)?;

    let mut copied = 0;
    for result in reader.records() {
        let raw = result?;

        let mut trimmed = raw.clone();
        trimmed.trim();
        let status = trimmed
            .deserialize::<CsvRecord>(Some(&trimmed_headers))
            .ok()
            .and_then(|record| statuses.remove(&(record.group, record.id)));

        match status {
            Some(status) => writer.write_record(&with_status(&raw, status_index, status))?,
            None => {
                copied += 1;
                writer.write_record(&raw)?;
            }
        }
    }

    writer.flush()?;

    Ok(copied)
}

fn with_status(raw: &StringRecord, index: usize, status: ObligationStatus) -> StringRecord {
    let mut fields: Vec<&str> = raw.iter().collect();
    if fields.len() <= index {
        fields.resize(index + 1, "");
    }
    fields[index] = status.as_str();
    StringRecord::from(fields)
}
