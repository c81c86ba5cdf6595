//! Traits for storage abstraction and extensibility

use async_trait::async_trait;

use crate::period::state::ReconciliationState;
use crate::types::*;

/// Storage abstraction for per-tenant reconciliation state
///
/// This trait allows the reconciliation core to work with any storage
/// backend (PostgreSQL, MySQL, SQLite, in-memory, etc.) by implementing
/// these methods. State is partitioned by tenant with no sharing; the state
/// machine is the sole writer, so history stays append-only as long as the
/// backend persists what it is given.
#[async_trait]
pub trait ReconciliationStorage: Send + Sync {
    /// Load a tenant's full reconciliation state
    async fn get_state(&self, tenant: &str) -> ReconcileResult<Option<ReconciliationState>>;

    /// Persist a tenant's full reconciliation state
    async fn save_state(&mut self, state: &ReconciliationState) -> ReconcileResult<()>;

    /// Remove a tenant's state entirely
    async fn delete_state(&mut self, tenant: &str) -> ReconcileResult<()>;

    /// List all tenants with stored state
    async fn list_tenants(&self) -> ReconcileResult<Vec<String>>;
}
