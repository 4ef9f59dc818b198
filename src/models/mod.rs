//! Data models for the DLC manager.
//!
//! - [`RawEntry`] / [`EntryUpdate`]: registry records and batch writes
//! - [`Category`]: the four entry kinds, decided by name prefix
//! - Options ([`CharacterOption`], [`EventOption`], [`ExtensionOption`], [`CoreOption`]):
//!   the user-facing toggle units built by the grouper and the catalog
//! - [`AppConfig`]: settings loaded from `DLC Manager.yaml`
//! - [`SessionState`]: everything loaded for the active world book, wrapped by
//!   [`StateManager`](crate::state::StateManager) for thread-safe access
//!
//! Grouped options never store their `enabled` flag independently: it is the
//! AND over member entries, recomputed on load and moved in lockstep on save.

pub mod config;
pub mod entry;
pub mod options;
pub mod session;

pub use config::{
    AppConfig, DEFAULT_DATA_BASE_URL, LoggingSettings, RegistrySettings, RemoteDataSettings,
};
pub use entry::{Category, EntryUpdate, EventEntry, ExtensionEntry, RawEntry};
pub use options::{
    CharacterOption, CoreOption, EventOption, ExtensionOption, GroupedOption,
    SpecialRecommendConfig, SpecialRecommendCore, ToggleOption,
};
pub use session::{CategoryState, SessionState};
