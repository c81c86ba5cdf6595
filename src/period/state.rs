//! The sequential period-closing state machine
//!
//! One `ReconciliationState` exists per tenant. At most one period is open
//! at any time; periods close in strict calendar order, and closing carries
//! the unresolved pending entries and the new opening balances into the next
//! period. All operations here are synchronous and atomic: they either apply
//! fully or reject without touching state.

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::classify::CategoryRules;
use crate::matching::{auto_match, manual_match, AutoMatchReport};
use crate::normalize::{rows_to_entries, FieldMapping, ImportOutcome, RawRow};
use crate::summary::{compute, ReconciliationSummary};
use crate::types::*;

/// Initial historical balances supplied once at system bootstrap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapInfo {
    pub opening_book: BigDecimal,
    pub opening_bank: BigDecimal,
    pub start_date: NaiveDate,
}

/// Frozen inputs for the next period, produced at bootstrap and at each close
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarryForward {
    pub opening_book: BigDecimal,
    pub opening_bank: BigDecimal,
    pub pending_book: Vec<LedgerEntry>,
    pub pending_bank: Vec<LedgerEntry>,
}

/// Immutable snapshot of a reconciled period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedPeriod {
    pub period_key: PeriodKey,
    pub closed_at: NaiveDateTime,
    /// Full working-paper state at the moment of closing, including the
    /// matched set and the carried-forward pending lists
    pub summary: ReconciliationSummary,
}

/// Caller-supplied parameters for opening a new period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodStart {
    pub key: PeriodKey,
    /// Closing book balance reported by the source document
    pub reported_closing_book: BigDecimal,
    /// Closing bank balance reported by the source document
    pub reported_closing_bank: BigDecimal,
    /// Operate without a book ledger: zero book opening, no inherited book
    /// pendings, book imports rejected
    pub without_book: bool,
}

/// Per-tenant reconciliation state: the open period, the carry-forward, and
/// the append-only history of closed periods
///
/// Existence implies the tenant has been bootstrapped. Mutate only through
/// the operations below; the state machine is the sole writer of history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationState {
    pub tenant: String,
    pub bootstrap: BootstrapInfo,
    pub carry: CarryForward,
    pub open: Option<PeriodLedger>,
    pub history: Vec<ClosedPeriod>,
}

impl ReconciliationState {
    /// Create the state for a freshly bootstrapped tenant
    pub fn bootstrap(
        tenant: &str,
        opening_book: BigDecimal,
        opening_bank: BigDecimal,
        start_date: NaiveDate,
    ) -> Self {
        info!(tenant, %start_date, "tenant bootstrapped");
        Self {
            tenant: tenant.to_string(),
            bootstrap: BootstrapInfo {
                opening_book: opening_book.clone(),
                opening_bank: opening_bank.clone(),
                start_date,
            },
            carry: CarryForward {
                opening_book,
                opening_bank,
                pending_book: Vec::new(),
                pending_bank: Vec::new(),
            },
            open: None,
            history: Vec::new(),
        }
    }

    /// The currently open period, if any
    pub fn open_period(&self) -> Option<&PeriodLedger> {
        self.open.as_ref()
    }

    fn open_mut(&mut self) -> ReconcileResult<&mut PeriodLedger> {
        self.open.as_mut().ok_or(ReconcileError::NoOpenPeriod)
    }

    /// Open the next period, seeding it from the frozen carry-forward
    ///
    /// The requested key must be the calendar successor of the last closed
    /// period; before any period has closed, any key at or after the
    /// bootstrap date is accepted.
    pub fn start_period(&mut self, params: PeriodStart) -> ReconcileResult<PeriodKey> {
        if let Some(ref open) = self.open {
            return Err(ReconcileError::PeriodAlreadyOpen(open.period_key));
        }
        match self.history.last() {
            Some(last) => {
                let expected = last.period_key.next();
                if params.key != expected {
                    return Err(ReconcileError::PeriodOutOfSequence {
                        requested: params.key,
                        expected,
                    });
                }
            }
            None => {
                let bootstrap = PeriodKey::from_date(self.bootstrap.start_date);
                if params.key < bootstrap {
                    return Err(ReconcileError::PeriodBeforeBootstrap {
                        requested: params.key,
                        bootstrap,
                    });
                }
            }
        }

        let mut ledger = PeriodLedger {
            period_key: params.key,
            state: PeriodState::Open,
            opening_book: if params.without_book {
                BigDecimal::from(0)
            } else {
                self.carry.opening_book.clone()
            },
            opening_bank: self.carry.opening_bank.clone(),
            reported_closing_book: params.reported_closing_book,
            reported_closing_bank: params.reported_closing_bank,
            without_book: params.without_book,
            book_entries: Vec::new(),
            bank_entries: Vec::new(),
            matched: Vec::new(),
            matched_pairs: Vec::new(),
        };
        if !params.without_book {
            for entry in self.carry.pending_book.clone() {
                ledger.push_entry(entry);
            }
        }
        for entry in self.carry.pending_bank.clone() {
            ledger.push_entry(entry);
        }

        info!(tenant = %self.tenant, period = %params.key, "period opened");
        self.open = Some(ledger);
        Ok(params.key)
    }

    /// Normalize and add one batch of rows to the open period
    pub fn import_rows(
        &mut self,
        side: Side,
        rows: &[RawRow],
        mapping: &FieldMapping,
        rules: &CategoryRules,
    ) -> ReconcileResult<ImportOutcome> {
        let period = self.open_mut()?;
        if side == Side::Book && period.without_book {
            return Err(ReconcileError::BookImportDisabled);
        }
        let (entries, skipped_dates) = rows_to_entries(side, rows, mapping, rules)?;
        let imported = entries.len();
        for entry in entries {
            period.push_entry(entry);
        }
        Ok(ImportOutcome {
            imported,
            skipped_dates,
        })
    }

    /// Run the automatic matcher over the open period
    pub fn auto_match(&mut self, tolerance_days: u32) -> ReconcileResult<AutoMatchReport> {
        Ok(auto_match(self.open_mut()?, tolerance_days))
    }

    /// Group selected pending entries into a manual match
    pub fn manual_match(
        &mut self,
        book_ids: &[Uuid],
        bank_ids: &[Uuid],
    ) -> ReconcileResult<MatchGroup> {
        manual_match(self.open_mut()?, book_ids, bank_ids)
    }

    /// Set or clear the resolution flag on a pending entry
    pub fn set_user_flag(
        &mut self,
        entry_id: Uuid,
        flag: Option<UserFlag>,
    ) -> ReconcileResult<()> {
        let period = self.open_mut()?;
        let entry = period
            .entry_mut(entry_id)
            .ok_or(ReconcileError::UnknownEntry(entry_id))?;
        if !entry.is_pending() {
            return Err(ReconcileError::EntryNotPending(entry_id));
        }
        if let Some(flag) = flag {
            if flag.applies_to() != entry.side {
                return Err(ReconcileError::FlagSideMismatch {
                    flag,
                    side: entry.side,
                });
            }
        }
        entry.user_flag = flag;
        Ok(())
    }

    /// Compute the current reconciliation summary of the open period
    pub fn summary(&self) -> ReconcileResult<ReconciliationSummary> {
        self.open_period()
            .map(compute)
            .ok_or(ReconcileError::NoOpenPeriod)
    }

    /// Close the open period
    ///
    /// Allowed only when the final difference is exactly zero. Appends the
    /// immutable snapshot to history and freezes the next period's opening
    /// balances and inherited pending sets. Flagged entries are considered
    /// resolved: they do not survive the carry-forward.
    pub fn close(&mut self, closed_at: NaiveDateTime) -> ReconcileResult<ClosedPeriod> {
        let summary = self.summary()?;
        if !summary.can_close() {
            return Err(ReconcileError::ClosingBlocked {
                final_difference: summary.final_difference,
            });
        }

        let mut period = self.open.take().ok_or(ReconcileError::NoOpenPeriod)?;
        period.state = PeriodState::Closed;

        let carried = |entries: &[LedgerEntry]| -> Vec<LedgerEntry> {
            entries
                .iter()
                .filter(|e| e.is_outstanding())
                .cloned()
                .collect()
        };
        self.carry = CarryForward {
            opening_book: summary.book_theoretical.clone(),
            opening_bank: summary.reported_closing_bank.clone(),
            pending_book: carried(&period.book_entries),
            pending_bank: carried(&period.bank_entries),
        };

        let closed = ClosedPeriod {
            period_key: period.period_key,
            closed_at,
            summary,
        };
        info!(
            tenant = %self.tenant,
            period = %closed.period_key,
            carried_book = self.carry.pending_book.len(),
            carried_bank = self.carry.pending_bank.len(),
            "period closed"
        );
        self.history.push(closed.clone());
        Ok(closed)
    }

    /// Discard the open period's edits without closing
    ///
    /// History and next-period eligibility are unchanged; the same period
    /// key can be started again.
    pub fn cancel(&mut self) -> ReconcileResult<PeriodKey> {
        let period = self.open.take().ok_or(ReconcileError::NoOpenPeriod)?;
        info!(tenant = %self.tenant, period = %period.period_key, "period cancelled");
        Ok(period.period_key)
    }
}
