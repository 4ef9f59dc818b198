// State management module
//
// This module provides the StateManager which wraps SessionState with thread-safe access
// using Arc<RwLock<T>> and emits change events for front ends.

use crate::metrics::Metrics;
use crate::models::{Category, SessionState};
use crate::selection::SelectionState;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when state is modified
///
/// These events notify interested parties (a UI, a log tail) about state
/// changes without requiring them to poll the state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// A world book was (re)loaded
    OptionsLoaded {
        book_name: Option<String>,
        cores: usize,
        characters: usize,
        events: usize,
        extensions: usize,
    },

    /// Pending selections of a category changed
    SelectionChanged {
        category: Category,
        has_changes: bool,
    },

    /// A toggle was refused; selections are unchanged
    ToggleRejected {
        key: String,
        missing: Vec<String>,
    },

    /// One batch was written for a category
    ChangesSaved {
        category: Category,
        written: usize,
    },

    /// The visible core tab changed
    ActiveTabChanged {
        tab: String,
    },

    /// The active world book changed
    ScopeChanged {
        book_name: Option<String>,
    },

    /// State has been reset
    StateReset,
}

/// Thread-safe state manager with event emission
///
/// This is the central state management component that:
/// - Provides thread-safe access to [`SessionState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Supports subscribing to state changes via tokio broadcast channels
///
/// # Usage
///
/// Always use `StateManager` instead of mutating [`SessionState`] directly:
/// - [`read()`](Self::read) for reading state without cloning
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) for listening to state changes
pub struct StateManager {
    /// The session state protected by RwLock for thread-safe access
    state: Arc<RwLock<SessionState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,

    metrics: Option<Arc<Metrics>>,
}

impl StateManager {
    /// Create a new StateManager with default state
    ///
    /// # Returns
    /// A new StateManager with a broadcast channel buffer of 100 events
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
            state_tx,
            metrics: None,
        }
    }

    /// Count broadcasts in `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Get a read-only snapshot of the current state
    pub fn snapshot(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let pending = state_manager.read(|state| state.has_any_changes());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SessionState) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// 1. Captures the old state
    /// 2. Applies the update function
    /// 3. Detects what changed
    /// 4. Emits appropriate events
    ///
    /// # Returns
    /// The StateChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut SessionState),
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = detect_changes(&old_state, &state);
        drop(state);

        for change in &changes {
            self.emit(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    ///
    /// Multiple subscribers can listen simultaneously.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn emit(&self, change: StateChange) {
        // No subscribers is fine
        let _ = self.state_tx.send(change);
        if let Some(metrics) = &self.metrics {
            metrics.record_state_broadcast();
        }
    }

    // Convenience methods for common state updates

    /// Replace the whole session after a (re)load
    pub fn load_session(&self, session: SessionState) -> Vec<StateChange> {
        let mut changes = self.update(|state| *state = session);

        let loaded = self.read(|state| StateChange::OptionsLoaded {
            book_name: state.book_name.clone(),
            cores: state.cores.options.len(),
            characters: state.characters.options.len(),
            events: state.events.options.len(),
            extensions: state.extensions.options.len(),
        });
        self.emit(loaded.clone());
        changes.push(loaded);

        changes
    }

    /// Replace the pending selections of one category
    pub fn set_selections(&self, category: Category, selections: SelectionState) -> Vec<StateChange> {
        self.update(|state| match category {
            Category::Core => state.cores.selections = selections,
            Category::Character => state.characters.selections = selections,
            Category::Event => state.events.selections = selections,
            Category::Extension => state.extensions.selections = selections,
        })
    }

    /// Report a refused toggle. The state itself is not touched.
    pub fn reject_toggle(&self, key: &str, missing: Vec<String>) -> StateChange {
        let change = StateChange::ToggleRejected {
            key: key.to_string(),
            missing,
        };
        self.emit(change.clone());
        change
    }

    /// Apply a committed save and report it
    ///
    /// # Arguments
    /// * `category` - Category that was written
    /// * `written` - Number of entry updates in the batch
    /// * `apply` - Replaces the category's options with the saved ones
    pub fn record_save<F>(&self, category: Category, written: usize, apply: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut SessionState),
    {
        let mut changes = self.update(apply);

        let saved = StateChange::ChangesSaved { category, written };
        self.emit(saved.clone());
        changes.push(saved);

        changes
    }

    pub fn set_active_tab(&self, tab: &str) -> Vec<StateChange> {
        self.update(|state| state.active_tab = tab.to_string())
    }

    /// Drop pending selections of one category
    pub fn discard(&self, category: Category) -> Vec<StateChange> {
        self.update(|state| match category {
            Category::Core => state.cores.discard(),
            Category::Character => state.characters.discard(),
            Category::Event => state.events.discard(),
            Category::Extension => state.extensions.discard(),
        })
    }

    /// Clear everything
    pub fn reset(&self) -> Vec<StateChange> {
        let mut changes = self.update(|state| *state = SessionState::default());

        let reset_event = StateChange::StateReset;
        self.emit(reset_event.clone());
        changes.push(reset_event);

        changes
    }

    /// Get an Arc reference to the state for use in worker tasks
    pub fn state_arc(&self) -> Arc<RwLock<SessionState>> {
        Arc::clone(&self.state)
    }
}

/// Detect what changed between two states and generate events
fn detect_changes(old: &SessionState, new: &SessionState) -> Vec<StateChange> {
    let mut changes = Vec::new();

    if old.book_name != new.book_name {
        changes.push(StateChange::ScopeChanged {
            book_name: new.book_name.clone(),
        });
    }

    for category in Category::ALL {
        if old.selections(category) != new.selections(category) {
            changes.push(StateChange::SelectionChanged {
                category,
                has_changes: new.has_changes(category),
            });
        }
    }

    if old.active_tab != new.active_tab {
        changes.push(StateChange::ActiveTabChanged {
            tab: new.active_tab.clone(),
        });
    }

    changes
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Make StateManager cloneable for sharing across tasks
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
            metrics: self.metrics.clone(),
        }
    }
}
