use crate::changeset::{self, ChangeSet, SaveError};
use crate::grouping;
use crate::metrics::Metrics;
use crate::models::{
    Category, CharacterOption, EventOption, ExtensionOption, RawEntry, ToggleOption,
};
use crate::registry::{Registry, RegistryError};
use crate::selection::SelectionState;
use regex::Regex;
use std::sync::Arc;

/// Options of one category as loaded from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded<T> {
    pub options: Vec<T>,
    /// Seeded from each option's persisted flag
    pub selections: SelectionState,
    pub book_name: Option<String>,
}

/// Result of a save request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome<T> {
    /// Desired state already matched persisted state; the registry was not touched
    Unchanged,
    /// One batch of `written` updates was committed
    Committed { options: Vec<T>, written: usize },
}

impl<T> SaveOutcome<T> {
    pub fn is_committed(&self) -> bool {
        matches!(self, SaveOutcome::Committed { .. })
    }
}

/// Load and save workflows over a [`Registry`].
///
/// Category filter patterns are compiled once at construction.
pub struct DlcService {
    pub(super) registry: Arc<dyn Registry>,
    pub(super) metrics: Arc<Metrics>,
    core_pattern: Regex,
    character_pattern: Regex,
    event_pattern: Regex,
    extension_pattern: Regex,
}

impl DlcService {
    pub fn new(registry: Arc<dyn Registry>, metrics: Arc<Metrics>) -> Self {
        Self {
            registry,
            metrics,
            core_pattern: Regex::new(Category::Core.filter_pattern())
                .expect("Invalid core pattern"),
            character_pattern: Regex::new(Category::Character.filter_pattern())
                .expect("Invalid character pattern"),
            event_pattern: Regex::new(Category::Event.filter_pattern())
                .expect("Invalid event pattern"),
            extension_pattern: Regex::new(Category::Extension.filter_pattern())
                .expect("Invalid extension pattern"),
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Name of the active world book.
    pub fn book_name(&self) -> Option<String> {
        self.registry.world_book_name()
    }

    fn pattern(&self, category: Category) -> &Regex {
        match category {
            Category::Core => &self.core_pattern,
            Category::Character => &self.character_pattern,
            Category::Event => &self.event_pattern,
            Category::Extension => &self.extension_pattern,
        }
    }

    /// Every entry of `category` in the active book, empty when no book is open.
    pub(super) async fn load_entries(
        &self,
        category: Category,
        book_name: Option<&str>,
    ) -> Result<Vec<RawEntry>, RegistryError> {
        let Some(scope) = book_name else {
            tracing::debug!("No active world book, no {} entries", category);
            return Ok(Vec::new());
        };

        self.metrics.record_registry_query();
        let entries = self
            .registry
            .get_filtered_entries(self.pattern(category), scope)
            .await?;
        tracing::debug!("Found {} {} entries in {}", entries.len(), category, scope);
        Ok(entries)
    }

    pub async fn load_character_options(&self) -> Result<Loaded<CharacterOption>, RegistryError> {
        let book_name = self.book_name();
        let entries = self
            .load_entries(Category::Character, book_name.as_deref())
            .await?;
        let options = grouping::character_options(&entries);

        Ok(Loaded {
            selections: SelectionState::from_options(&options),
            options,
            book_name,
        })
    }

    pub async fn load_event_options(&self) -> Result<Loaded<EventOption>, RegistryError> {
        let book_name = self.book_name();
        let entries = self
            .load_entries(Category::Event, book_name.as_deref())
            .await?;
        let options = grouping::event_options(&entries);
        self.metrics
            .record_entries_dropped(entries.len() - grouping::member_count(&options));

        Ok(Loaded {
            selections: SelectionState::from_options(&options),
            options,
            book_name,
        })
    }

    pub async fn load_extension_options(&self) -> Result<Loaded<ExtensionOption>, RegistryError> {
        let book_name = self.book_name();
        let entries = self
            .load_entries(Category::Extension, book_name.as_deref())
            .await?;
        let options = grouping::extension_options(&entries);
        self.metrics
            .record_entries_dropped(entries.len() - grouping::member_count(&options));

        Ok(Loaded {
            selections: SelectionState::from_options(&options),
            options,
            book_name,
        })
    }

    pub async fn save_character_changes(
        &self,
        book_name: Option<&str>,
        options: &[CharacterOption],
        selections: &SelectionState,
    ) -> Result<SaveOutcome<CharacterOption>, SaveError> {
        let plan = changeset::plan_character_save(options, selections);
        self.commit(Category::Character, book_name, options, selections, plan)
            .await
    }

    pub async fn save_event_changes(
        &self,
        book_name: Option<&str>,
        options: &[EventOption],
        selections: &SelectionState,
    ) -> Result<SaveOutcome<EventOption>, SaveError> {
        let plan = changeset::plan_event_save(options, selections);
        self.commit(Category::Event, book_name, options, selections, plan)
            .await
    }

    /// Save extensions, resolving relationship targets against the book the
    /// options were loaded from.
    pub async fn save_extension_changes(
        &self,
        book_name: Option<&str>,
        options: &[ExtensionOption],
        selections: &SelectionState,
    ) -> Result<SaveOutcome<ExtensionOption>, SaveError> {
        let Some(plan) = changeset::plan_extension_save(options, selections) else {
            return self
                .commit(Category::Extension, book_name, options, selections, None)
                .await;
        };

        let scope = book_name.ok_or(SaveError::NoActiveScope)?;
        let expanded =
            changeset::expand_targets(self.registry.as_ref(), &self.metrics, scope, plan).await;
        match expanded {
            Ok(changes) => {
                self.commit(Category::Extension, book_name, options, selections, Some(changes))
                    .await
            }
            Err(e) => {
                self.metrics.record_save_failed();
                Err(e)
            }
        }
    }

    /// Write one planned batch to `book_name`. `None` means nothing changed.
    pub(super) async fn commit<T: ToggleOption + Clone>(
        &self,
        category: Category,
        book_name: Option<&str>,
        options: &[T],
        selections: &SelectionState,
        plan: Option<ChangeSet>,
    ) -> Result<SaveOutcome<T>, SaveError> {
        let Some(changes) = plan else {
            tracing::debug!("No {} changes to save", category);
            self.metrics.record_save_skipped();
            return Ok(SaveOutcome::Unchanged);
        };

        let scope = book_name.ok_or(SaveError::NoActiveScope)?;
        let updates = changes.into_updates();
        let written = updates.len();

        if let Err(e) = self.registry.update_world_book(&updates, scope).await {
            tracing::error!("Failed to save {} changes to {}: {}", category, scope, e);
            self.metrics.record_save_failed();
            return Err(e.into());
        }

        tracing::info!("Saved {} {} entries to {}", written, category, scope);
        self.metrics.record_save_committed(written);

        Ok(SaveOutcome::Committed {
            options: changeset::apply_selections(options, selections),
            written,
        })
    }
}
