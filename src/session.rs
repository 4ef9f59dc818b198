//! Session controller: user interactions over the state manager and services.
//!
//! Every interaction goes through here so the state manager emits change
//! events and the metrics stay in step:
//! - [`reload`](SessionController::reload) loads all four categories and the core tabs
//! - [`toggle`](SessionController::toggle) applies one user toggle, resolving
//!   extension relationships
//! - [`save`](SessionController::save) commits one category as a single batch
//!
//! A failed save leaves the session untouched so the user can retry.

use crate::catalog::RemoteCatalog;
use crate::metrics::Metrics;
use crate::models::{Category, CategoryState, SessionState};
use crate::resolver::{self, ToggleOutcome, ToggleRejection};
use crate::services::{DlcService, SaveOutcome};
use crate::state::{StateChange, StateManager};
use anyhow::{Context, Result};
use std::sync::Arc;

pub struct SessionController {
    state: Arc<StateManager>,
    service: DlcService,
    catalog: RemoteCatalog,
    metrics: Arc<Metrics>,
}

impl SessionController {
    /// # Arguments
    /// * `state` - Shared state manager, subscribers keep receiving events
    /// * `service` - Load/save workflows over the registry
    /// * `catalog` - Remote core classification cache
    pub fn new(state: Arc<StateManager>, service: DlcService, catalog: RemoteCatalog) -> Self {
        let metrics = Arc::clone(service.metrics());
        Self {
            state,
            service,
            catalog,
            metrics,
        }
    }

    pub fn state(&self) -> &Arc<StateManager> {
        &self.state
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Load every category of the active world book.
    ///
    /// Pending selections are replaced by the persisted flags.
    pub async fn reload(&self) -> Result<Vec<StateChange>> {
        let characters = self
            .service
            .load_character_options()
            .await
            .context("Failed to load characters")?;
        let events = self
            .service
            .load_event_options()
            .await
            .context("Failed to load events")?;
        let extensions = self
            .service
            .load_extension_options()
            .await
            .context("Failed to load extensions")?;
        let cores = self
            .service
            .load_core_options(&self.catalog)
            .await
            .context("Failed to load cores")?;

        let session = SessionState {
            book_name: cores.book_name,
            characters: CategoryState {
                options: characters.options,
                selections: characters.selections,
            },
            events: CategoryState {
                options: events.options,
                selections: events.selections,
            },
            extensions: CategoryState {
                options: extensions.options,
                selections: extensions.selections,
            },
            cores: CategoryState {
                options: cores.options,
                selections: cores.selections,
            },
            tabs: cores.tabs,
            active_tab: cores.active_tab,
            special_recommend: cores.special_recommend,
        };

        tracing::info!(
            "Reloaded {}: {} cores, {} characters, {} events, {} extensions",
            session.book_name.as_deref().unwrap_or("<no world book>"),
            session.cores.options.len(),
            session.characters.options.len(),
            session.events.options.len(),
            session.extensions.options.len()
        );

        Ok(self.state.load_session(session))
    }

    /// Drop cached remote data and reload.
    pub async fn refresh(&self) -> Result<Vec<StateChange>> {
        self.catalog.reset().await;
        self.reload().await
    }

    /// Apply one user toggle.
    ///
    /// Cores are single-choice, characters and events flip, extensions go
    /// through the dependency resolver. A rejected extension toggle leaves
    /// the selections as they were and reports a
    /// [`StateChange::ToggleRejected`].
    pub fn toggle(&self, category: Category, key: &str) -> Vec<StateChange> {
        if category == Category::Core {
            return self.select_core(key);
        }

        let outcome = self.state.read(|state| match category {
            Category::Extension => resolver::toggle_extension(
                &state.extensions.selections,
                &state.extensions.options,
                key,
            ),
            _ => ToggleOutcome::Applied(state.selections(category).toggled(key)),
        });

        match outcome {
            ToggleOutcome::Applied(selections) => {
                self.metrics.record_toggle_applied();
                self.state.set_selections(category, selections)
            }
            ToggleOutcome::Rejected {
                reason: ToggleRejection::MissingPrerequisites { missing },
                ..
            } => {
                tracing::info!("Toggle of {} refused, missing {:?}", key, missing);
                self.metrics.record_toggle_rejected();
                vec![self.state.reject_toggle(key, missing)]
            }
        }
    }

    /// Make `key` the only selected core.
    pub fn select_core(&self, key: &str) -> Vec<StateChange> {
        let selections = self
            .state
            .read(|state| state.cores.selections.select_exclusive(key));
        self.metrics.record_toggle_applied();
        self.state.set_selections(Category::Core, selections)
    }

    /// Switch the visible core tab. Unknown tabs are ignored.
    pub fn set_active_tab(&self, tab: &str) -> Vec<StateChange> {
        if !self.state.read(|state| state.tabs.iter().any(|t| t == tab)) {
            tracing::warn!("Ignoring unknown core tab: {}", tab);
            return Vec::new();
        }
        self.state.set_active_tab(tab)
    }

    /// Commit the pending selections of `category`.
    ///
    /// Nothing is written when selections match persisted state. On success
    /// the category's options take the saved flags and selections are
    /// reseeded from them.
    pub async fn save(&self, category: Category) -> Result<Vec<StateChange>> {
        let snapshot = self.state.snapshot();
        let book_name = snapshot.book_name.as_deref();

        match category {
            Category::Core => {
                let outcome = self
                    .service
                    .save_core_changes(
                        book_name,
                        &snapshot.cores.options,
                        &snapshot.cores.selections,
                    )
                    .await
                    .with_context(|| format!("Failed to save {} changes", category))?;
                Ok(self.apply_outcome(category, outcome, |state, options| {
                    state.cores = CategoryState::new(options)
                }))
            }
            Category::Character => {
                let outcome = self
                    .service
                    .save_character_changes(
                        book_name,
                        &snapshot.characters.options,
                        &snapshot.characters.selections,
                    )
                    .await
                    .with_context(|| format!("Failed to save {} changes", category))?;
                Ok(self.apply_outcome(category, outcome, |state, options| {
                    state.characters = CategoryState::new(options)
                }))
            }
            Category::Event => {
                let outcome = self
                    .service
                    .save_event_changes(
                        book_name,
                        &snapshot.events.options,
                        &snapshot.events.selections,
                    )
                    .await
                    .with_context(|| format!("Failed to save {} changes", category))?;
                Ok(self.apply_outcome(category, outcome, |state, options| {
                    state.events = CategoryState::new(options)
                }))
            }
            Category::Extension => {
                let outcome = self
                    .service
                    .save_extension_changes(
                        book_name,
                        &snapshot.extensions.options,
                        &snapshot.extensions.selections,
                    )
                    .await
                    .with_context(|| format!("Failed to save {} changes", category))?;
                Ok(self.apply_outcome(category, outcome, |state, options| {
                    state.extensions = CategoryState::new(options)
                }))
            }
        }
    }

    /// Drop pending selections of `category`.
    pub fn discard(&self, category: Category) -> Vec<StateChange> {
        self.state.discard(category)
    }

    fn apply_outcome<T, F>(
        &self,
        category: Category,
        outcome: SaveOutcome<T>,
        replace: F,
    ) -> Vec<StateChange>
    where
        F: FnOnce(&mut SessionState, Vec<T>),
    {
        match outcome {
            SaveOutcome::Unchanged => Vec::new(),
            SaveOutcome::Committed { options, written } => self
                .state
                .record_save(category, written, |state| replace(state, options)),
        }
    }
}
