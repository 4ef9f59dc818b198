// DLC Manager - tag-grammar driven DLC toggles for world-book entries
//
// This is the library crate containing the core business logic and data structures.
// The binary crate (main.rs) loads a world-book snapshot and reports what it finds.

pub mod catalog;
pub mod changeset;
pub mod config;
pub mod grammar;
pub mod grouping;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod registry;
pub mod resolver;
pub mod selection;
pub mod services;
pub mod session;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{AppConfig, Category, EntryUpdate, RawEntry, SessionState};
pub use registry::{InMemoryRegistry, Registry, RegistryError, SnapshotRegistry};
pub use selection::SelectionState;
pub use session::SessionController;
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
