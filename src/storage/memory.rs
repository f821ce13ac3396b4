//! Process-local clearance store.

use std::sync::{Arc, RwLock};

use tracing::instrument;

use super::ClearanceStore;
use crate::error::{Error, Result};
use crate::models::Clearance;

/// In-memory clearance store.
///
/// Cloning shares the same slot, so one handle can be given to the client
/// and another kept by whoever captures new pairs.
#[derive(Debug, Clone, Default)]
pub struct MemoryClearanceStore {
    inner: Arc<RwLock<Option<Clearance>>>,
}

impl MemoryClearanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a pair already stored.
    pub fn with_clearance(clearance: Clearance) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(clearance))),
        }
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::Storage("clearance lock poisoned".into())
}

impl ClearanceStore for MemoryClearanceStore {
    fn load(&self) -> Result<Option<Clearance>> {
        let guard = self.inner.read().map_err(poisoned)?;
        Ok(guard.clone())
    }

    #[instrument(skip(self, clearance))]
    fn save(&self, clearance: &Clearance) -> Result<()> {
        let mut guard = self.inner.write().map_err(poisoned)?;
        *guard = Some(clearance.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    fn clear(&self) -> Result<()> {
        let mut guard = self.inner.write().map_err(poisoned)?;
        *guard = None;
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
