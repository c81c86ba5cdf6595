//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::period::state::ReconciliationState;
use crate::traits::ReconciliationStorage;
use crate::types::*;

/// In-memory storage implementation for testing and development
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    states: Arc<RwLock<HashMap<String, ReconciliationState>>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.states.write().unwrap().clear();
    }
}

#[async_trait]
impl ReconciliationStorage for MemoryStorage {
    async fn get_state(&self, tenant: &str) -> ReconcileResult<Option<ReconciliationState>> {
        Ok(self.states.read().unwrap().get(tenant).cloned())
    }

    async fn save_state(&mut self, state: &ReconciliationState) -> ReconcileResult<()> {
        self.states
            .write()
            .unwrap()
            .insert(state.tenant.clone(), state.clone());
        Ok(())
    }

    async fn delete_state(&mut self, tenant: &str) -> ReconcileResult<()> {
        if self.states.write().unwrap().remove(tenant).is_some() {
            Ok(())
        } else {
            Err(ReconcileError::Storage(format!(
                "no state stored for tenant '{}'",
                tenant
            )))
        }
    }

    async fn list_tenants(&self) -> ReconcileResult<Vec<String>> {
        let mut tenants: Vec<String> = self.states.read().unwrap().keys().cloned().collect();
        tenants.sort();
        Ok(tenants)
    }
}
