//! Clearance pair storage.
//!
//! Session refreshes read the most recently validated [`Clearance`] through a
//! [`ClearanceStore`]; clearance updates write it. Backends:
//! - [`MemoryClearanceStore`] - process-local, lost on restart
//! - [`FileClearanceStore`] - a single JSON file, written atomically
//!
//! Operations are synchronous. Each backend serializes writers so a reader
//! always sees a complete pair.

mod file;
mod memory;

use std::sync::Arc;

pub use file::FileClearanceStore;
pub use memory::MemoryClearanceStore;

use crate::error::Result;
use crate::models::Clearance;

/// Holder of the current clearance pair.
pub trait ClearanceStore: Send + Sync {
    /// The stored pair, if any.
    fn load(&self) -> Result<Option<Clearance>>;

    /// Replace the stored pair.
    fn save(&self, clearance: &Clearance) -> Result<()>;

    /// Forget the stored pair. Clearing an empty store is not an error.
    fn clear(&self) -> Result<()>;

    /// Backend name, for logs.
    fn name(&self) -> &str;
}

impl<T: ClearanceStore + ?Sized> ClearanceStore for Arc<T> {
    fn load(&self) -> Result<Option<Clearance>> {
        (**self).load()
    }
    fn save(&self, clearance: &Clearance) -> Result<()> {
        (**self).save(clearance)
    }
    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: ClearanceStore + ?Sized> ClearanceStore for Box<T> {
    fn load(&self) -> Result<Option<Clearance>> {
        (**self).load()
    }
    fn save(&self, clearance: &Clearance) -> Result<()> {
        (**self).save(clearance)
    }
    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}
