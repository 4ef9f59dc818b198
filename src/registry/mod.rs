//! Registry collaborator: the external store of world-book entries.
//!
//! The manager only ever needs three things from it: enumerate entries whose
//! name matches a pattern, apply one batch of enable/disable updates, and name
//! the active world book. Two adapters ship with the crate:
//!
//! - [`InMemoryRegistry`]: process-local books, used by tests and embedding hosts
//! - [`SnapshotRegistry`]: books persisted to a YAML snapshot file

pub mod memory;
pub mod snapshot;

pub use memory::InMemoryRegistry;
pub use snapshot::{SnapshotRegistry, WorldBooks};

use crate::models::{EntryUpdate, RawEntry};
use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;

/// Errors raised by registry adapters.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("registry unavailable: {0}")]
    Unavailable(String),

    #[error("world book not found: {0}")]
    UnknownBook(String),

    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot is malformed: {0}")]
    Snapshot(#[from] serde_yaml_ng::Error),
}

/// Access to the persisted entry store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Registry: Send + Sync {
    /// Entries of `scope` whose name matches `pattern`, in store order.
    async fn get_filtered_entries(
        &self,
        pattern: &Regex,
        scope: &str,
    ) -> Result<Vec<RawEntry>, RegistryError>;

    /// Apply every name → enabled pair to `scope` as one batch.
    async fn update_world_book(
        &self,
        entries: &[EntryUpdate],
        scope: &str,
    ) -> Result<(), RegistryError>;

    /// Name of the active world book, `None` when nothing is open.
    fn world_book_name(&self) -> Option<String>;
}

/// Pattern matching any entry name containing `[target]` literally.
pub fn target_pattern(target: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"\[{}\]", regex::escape(target)))
}
