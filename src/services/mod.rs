//! Services module - load and save workflows over the entry registry.
//!
//! The services glue the pure layers together and own all registry traffic:
//!
//! - Load: filter entries by category pattern → group into options → seed a
//!   [`SelectionState`](crate::selection::SelectionState)
//! - Save: plan a change set → resolve relationship targets (extensions) →
//!   write one batch → return options carrying the new persisted flags
//!
//! Cores additionally consult the [`RemoteCatalog`](crate::catalog::RemoteCatalog)
//! for tab classification and special recommendations.
//!
//! A save whose desired state matches the persisted state returns
//! [`SaveOutcome::Unchanged`] without touching the registry. A failed write
//! returns an error and leaves the caller's options and selections as they were.

pub mod cores;
pub mod dlc;

pub use crate::changeset::SaveError;
pub use cores::LoadedCores;
pub use dlc::{DlcService, Loaded, SaveOutcome};
