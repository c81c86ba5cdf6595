//! Normalization of raw tabular rows into comparable ledger entries
//!
//! Ingestion collaborators hand the core already-parsed rows with named
//! fields; this module collapses locale-ambiguous amount text and optional
//! debit/credit column pairs into a single signed net value, parses dates,
//! and builds [`LedgerEntry`] values. Normalization is lossy-safe: a corrupt
//! amount becomes a zero movement and a corrupt date skips the row, never
//! aborting the batch.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::classify::CategoryRules;
use crate::types::*;
use crate::utils::validation::validate_field_mapping;

/// A single cell value as delivered by the ingestion collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawValue {
    /// Already-numeric value, accepted as-is
    Number(f64),
    /// Text that may use either `,` or `.` as decimal separator
    Text(String),
    /// Missing cell
    Empty,
}

/// One row of an uploaded document, keyed by column name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub values: HashMap<String, RawValue>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion, mainly for tests and fixtures
    pub fn with(mut self, field: &str, value: RawValue) -> Self {
        self.values.insert(field.to_string(), value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&RawValue> {
        self.values.get(field)
    }
}

/// Which row fields play which role, supplied explicitly by the caller
///
/// Column roles are never auto-detected from the data shape; the mapping is
/// fixed once per period-start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Field holding the movement date
    pub date: String,
    /// Field holding the free-text description
    pub description: String,
    /// Field holding the primary amount (or the debit column)
    pub amount: String,
    /// Optional contra column (credit/withdrawals); net = amount - contra
    pub contra_amount: Option<String>,
    /// Negate the net amount after normalization (statements that report
    /// withdrawals as positive figures)
    pub invert_sign: bool,
}

impl FieldMapping {
    pub fn new(date: &str, description: &str, amount: &str) -> Self {
        Self {
            date: date.to_string(),
            description: description.to_string(),
            amount: amount.to_string(),
            contra_amount: None,
            invert_sign: false,
        }
    }

    /// Set the contra column for debit/credit pairs
    pub fn with_contra(mut self, contra: &str) -> Self {
        self.contra_amount = Some(contra.to_string());
        self
    }

    /// Negate net amounts after normalization
    pub fn with_inverted_sign(mut self) -> Self {
        self.invert_sign = true;
        self
    }
}

/// Result of importing one batch of rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportOutcome {
    /// Entries added to the period
    pub imported: usize,
    /// Rows excluded because their date did not parse
    pub skipped_dates: usize,
}

/// Collapse a primary value and an optional contra value into one signed
/// net amount
///
/// Unparsable input coerces to zero rather than failing.
pub fn normalize_amount(primary: &RawValue, contra: Option<&RawValue>) -> BigDecimal {
    let net = raw_to_decimal(primary);
    match contra {
        Some(c) => net - raw_to_decimal(c),
        None => net,
    }
}

fn raw_to_decimal(value: &RawValue) -> BigDecimal {
    match value {
        RawValue::Empty => BigDecimal::from(0),
        // Format through the shortest round-trip representation so that
        // 0.1 stays 0.1 rather than its binary expansion.
        RawValue::Number(n) => format!("{}", n)
            .parse()
            .unwrap_or_else(|_| BigDecimal::from(0)),
        RawValue::Text(s) => parse_amount_text(s),
    }
}

/// Parse amount text using either `,` or `.` as decimal separator
///
/// When both appear, the rightmost-occurring one is the decimal separator
/// and the other is a thousands separator; a lone `,` is always decimal.
fn parse_amount_text(text: &str) -> BigDecimal {
    let s: String = text.replace('$', "").split_whitespace().collect();
    let cleaned = match (s.rfind('.'), s.rfind(',')) {
        (Some(dot), Some(comma)) if dot < comma => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (None, Some(_)) => s.replace(',', "."),
        _ => s,
    };
    cleaned.parse().unwrap_or_else(|_| BigDecimal::from(0))
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];

/// Parse a raw date cell; `None` excludes the row from matching entirely
pub fn normalize_date(value: &RawValue) -> Option<NaiveDate> {
    match value {
        RawValue::Text(s) => {
            let s = s.trim();
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        }
        _ => None,
    }
}

/// Build ledger entries for one side from raw rows
///
/// Structural failures (empty batch, rows lacking a mapped field) are
/// reported before any entry is built, so the batch applies all-or-nothing.
/// Bank-side entries are classified against `rules`; a classified entry is
/// disqualified from automatic matching. Returns the entries plus the count
/// of rows skipped for unparsable dates.
pub fn rows_to_entries(
    side: Side,
    rows: &[RawRow],
    mapping: &FieldMapping,
    rules: &CategoryRules,
) -> ReconcileResult<(Vec<LedgerEntry>, usize)> {
    validate_field_mapping(mapping)?;
    if rows.is_empty() {
        return Err(ReconcileError::EmptyImport);
    }

    let mut required = vec![&mapping.date, &mapping.description, &mapping.amount];
    if let Some(ref contra) = mapping.contra_amount {
        required.push(contra);
    }
    for row in rows {
        for field in &required {
            if row.get(field).is_none() {
                return Err(ReconcileError::MissingField((*field).to_string()));
            }
        }
    }

    let mut entries = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;
    for (index, row) in rows.iter().enumerate() {
        let date = match row.get(&mapping.date).and_then(normalize_date) {
            Some(date) => date,
            None => {
                warn!(side = ?side, row = index, "row skipped: unparsable date");
                skipped += 1;
                continue;
            }
        };

        let description = match row.get(&mapping.description) {
            Some(RawValue::Text(s)) => s.trim().to_string(),
            Some(RawValue::Number(n)) => format!("{}", n),
            _ => String::new(),
        };

        let contra = mapping
            .contra_amount
            .as_ref()
            .and_then(|field| row.get(field));
        let mut net_amount = normalize_amount(
            row.get(&mapping.amount).unwrap_or(&RawValue::Empty),
            contra,
        );
        if mapping.invert_sign {
            net_amount = -net_amount;
        }

        let mut entry = LedgerEntry::new(side, index, date, description, net_amount);
        if side == Side::Bank {
            if let Some(category) = rules.classify(&entry.description) {
                entry.category = Some(category.to_string());
                entry.disqualified = true;
            }
        }
        entries.push(entry);
    }

    Ok((entries, skipped))
}
