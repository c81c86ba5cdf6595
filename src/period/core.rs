//! Storage-backed orchestrator for per-tenant reconciliation work
//!
//! `Reconciler` is the crate's main entry point: each operation loads the
//! tenant's state, applies exactly one state-machine mutation, and persists
//! the result. Callers serialize mutating calls per tenant; the workload is
//! single-writer by design.

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::classify::CategoryRules;
use crate::matching::AutoMatchReport;
use crate::normalize::{FieldMapping, ImportOutcome, RawRow};
use crate::period::state::{ClosedPeriod, PeriodStart, ReconciliationState};
use crate::summary::ReconciliationSummary;
use crate::traits::ReconciliationStorage;
use crate::types::*;
use crate::utils::validation::validate_tenant_id;

/// Reconciliation engine for one tenant over a storage backend
pub struct Reconciler<S: ReconciliationStorage> {
    storage: S,
    tenant: String,
}

impl<S: ReconciliationStorage> Reconciler<S> {
    /// Create a reconciler scoped to one tenant
    pub fn new(storage: S, tenant: &str) -> Self {
        Self {
            storage,
            tenant: tenant.to_string(),
        }
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    async fn load(&self) -> ReconcileResult<ReconciliationState> {
        self.storage
            .get_state(&self.tenant)
            .await?
            .ok_or(ReconcileError::NotBootstrapped)
    }

    /// Initialize the tenant with its first opening balances and start date
    ///
    /// Allowed only once per tenant.
    pub async fn bootstrap(
        &mut self,
        opening_book: BigDecimal,
        opening_bank: BigDecimal,
        start_date: NaiveDate,
    ) -> ReconcileResult<()> {
        validate_tenant_id(&self.tenant)?;
        if self.storage.get_state(&self.tenant).await?.is_some() {
            return Err(ReconcileError::AlreadyBootstrapped);
        }
        let state =
            ReconciliationState::bootstrap(&self.tenant, opening_book, opening_bank, start_date);
        self.storage.save_state(&state).await
    }

    /// Open the next period in sequence
    pub async fn start_period(&mut self, params: PeriodStart) -> ReconcileResult<PeriodKey> {
        let mut state = self.load().await?;
        let key = state.start_period(params)?;
        self.storage.save_state(&state).await?;
        Ok(key)
    }

    /// Normalize and add one batch of rows to the open period
    pub async fn import_rows(
        &mut self,
        side: Side,
        rows: &[RawRow],
        mapping: &FieldMapping,
        rules: &CategoryRules,
    ) -> ReconcileResult<ImportOutcome> {
        let mut state = self.load().await?;
        let outcome = state.import_rows(side, rows, mapping, rules)?;
        self.storage.save_state(&state).await?;
        Ok(outcome)
    }

    /// Run the automatic matcher over the open period
    pub async fn auto_match(&mut self, tolerance_days: u32) -> ReconcileResult<AutoMatchReport> {
        let mut state = self.load().await?;
        let report = state.auto_match(tolerance_days)?;
        self.storage.save_state(&state).await?;
        Ok(report)
    }

    /// Group selected pending entries into a manual match
    pub async fn manual_match(
        &mut self,
        book_ids: &[Uuid],
        bank_ids: &[Uuid],
    ) -> ReconcileResult<MatchGroup> {
        let mut state = self.load().await?;
        let group = state.manual_match(book_ids, bank_ids)?;
        self.storage.save_state(&state).await?;
        Ok(group)
    }

    /// Set or clear the resolution flag on a pending entry
    pub async fn set_user_flag(
        &mut self,
        entry_id: Uuid,
        flag: Option<UserFlag>,
    ) -> ReconcileResult<()> {
        let mut state = self.load().await?;
        state.set_user_flag(entry_id, flag)?;
        self.storage.save_state(&state).await
    }

    /// Compute the current reconciliation summary of the open period
    pub async fn summary(&self) -> ReconcileResult<ReconciliationSummary> {
        self.load().await?.summary()
    }

    /// Close the open period and freeze the carry-forward
    pub async fn close(&mut self, closed_at: NaiveDateTime) -> ReconcileResult<ClosedPeriod> {
        let mut state = self.load().await?;
        let closed = state.close(closed_at)?;
        self.storage.save_state(&state).await?;
        Ok(closed)
    }

    /// Discard the open period's edits without closing
    pub async fn cancel(&mut self) -> ReconcileResult<PeriodKey> {
        let mut state = self.load().await?;
        let key = state.cancel()?;
        self.storage.save_state(&state).await?;
        Ok(key)
    }

    /// The currently open period, if any
    pub async fn open_period(&self) -> ReconcileResult<Option<PeriodLedger>> {
        Ok(self.load().await?.open_period().cloned())
    }

    /// All closed periods, oldest first
    pub async fn history(&self) -> ReconcileResult<Vec<ClosedPeriod>> {
        Ok(self.load().await?.history)
    }
}
