//! Store collaborator contracts.
//!
//! Persistence engines live outside the core; these traits are the minimal
//! surface the federation flow needs. Contributions form an append-only log;
//! global models form an append-only sequence of versioned records where
//! `latest` must hand back one fully-materialized snapshot.
//!
//! Version uniqueness under concurrent aggregation is the store's (or the
//! caller's) responsibility: the core reads the maximum version and appends
//! without a transaction.

use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;

use crate::aggregation::GlobalModel;
use crate::training::Contribution;

pub trait ContributionStore {
    fn append(&self, contribution: Contribution) -> Result<()>;
    /// All contributions, in append order.
    fn read_all(&self) -> Result<Vec<Contribution>>;
}

pub trait GlobalModelStore {
    /// Highest stored version, 0 when none exist.
    fn max_version(&self) -> Result<u64>;
    fn append(&self, model: GlobalModel) -> Result<()>;
    fn latest(&self) -> Result<Option<GlobalModel>>;
}

/// In-memory reference implementation of both stores. Suitable for tests
/// and single-process deployments; writes are serialized by the lock.
#[derive(Clone, Default)]
pub struct MemoryStore {
    contributions: Arc<RwLock<Vec<Contribution>>>,
    globals: Arc<RwLock<Vec<GlobalModel>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contribution_count(&self) -> usize {
        self.contributions.read().len()
    }

    pub fn global_model_count(&self) -> usize {
        self.globals.read().len()
    }
}

impl ContributionStore for MemoryStore {
    fn append(&self, contribution: Contribution) -> Result<()> {
        self.contributions.write().push(contribution);
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<Contribution>> {
        Ok(self.contributions.read().clone())
    }
}

impl GlobalModelStore for MemoryStore {
    fn max_version(&self) -> Result<u64> {
        Ok(self.globals.read().iter().map(|m| m.version).max().unwrap_or(0))
    }

    fn append(&self, model: GlobalModel) -> Result<()> {
        self.globals.write().push(model);
        Ok(())
    }

    fn latest(&self) -> Result<Option<GlobalModel>> {
        Ok(self.globals.read().iter().max_by_key(|m| m.version).cloned())
    }
}
