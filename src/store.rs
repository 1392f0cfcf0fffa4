// src/store.rs
//! Persistence collaborator for discovered opportunities.
//!
//! The pipeline treats the store as an opaque create/list/filter surface.
//! Batch saves are per-record: one failed insert is captured in the batch
//! outcome instead of aborting the rest (and instead of being silently
//! swallowed).

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::RwLock;

use crate::discovery::types::Opportunity;

#[async_trait]
pub trait OpportunityStore: Send + Sync {
    async fn create(&self, op: &Opportunity) -> Result<Opportunity>;

    async fn bulk_create(&self, ops: &[Opportunity]) -> Result<Vec<Opportunity>> {
        let mut created = Vec::with_capacity(ops.len());
        for op in ops {
            created.push(self.create(op).await?);
        }
        Ok(created)
    }

    /// All records matching the predicate. Callers use this to reload the
    /// previous run's fingerprints. The `for<'a>` bound keeps the predicate
    /// callable on borrows local to the implementation.
    async fn filter(
        &self,
        predicate: &(dyn for<'a> Fn(&'a Opportunity) -> bool + Send + Sync),
    ) -> Result<Vec<Opportunity>>;
}

/// Result of a per-record batch save.
#[derive(Debug, Default, Serialize)]
pub struct BatchOutcome {
    pub succeeded: Vec<Opportunity>,
    pub failed: Vec<FailedSave>,
}

#[derive(Debug, Serialize)]
pub struct FailedSave {
    pub record: Opportunity,
    pub error: String,
}

/// Save each record individually, collecting failures instead of failing the
/// batch or the discovery response.
pub async fn save_batch(store: &dyn OpportunityStore, ops: &[Opportunity]) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for op in ops {
        match store.create(op).await {
            Ok(created) => outcome.succeeded.push(created),
            Err(e) => {
                tracing::warn!(error = ?e, id = %op.id, "opportunity save failed");
                outcome.failed.push(FailedSave {
                    record: op.clone(),
                    error: format!("{e:#}"),
                });
            }
        }
    }
    outcome
}

/// In-memory store: the default backing for local runs and tests.
#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<Opportunity>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OpportunityStore for InMemoryStore {
    async fn create(&self, op: &Opportunity) -> Result<Opportunity> {
        let mut records = match self.records.write() {
            Ok(g) => g,
            Err(_) => bail!("store lock poisoned"),
        };
        // Ids are stable across runs while due dates and statuses move, so a
        // re-discovered id replaces the stored row. Keeping the stale row
        // would leave its old fingerprint behind and the listing would keep
        // surfacing as new.
        match records.iter_mut().find(|r| r.id == op.id) {
            Some(existing) => *existing = op.clone(),
            None => records.push(op.clone()),
        }
        Ok(op.clone())
    }

    async fn filter(
        &self,
        predicate: &(dyn for<'a> Fn(&'a Opportunity) -> bool + Send + Sync),
    ) -> Result<Vec<Opportunity>> {
        let records = match self.records.read() {
            Ok(g) => g,
            Err(_) => bail!("store lock poisoned"),
        };
        Ok(records.iter().filter(|r| predicate(r)).cloned().collect())
    }
}
