use super::entry::Category;
use super::options::{
    CharacterOption, CoreOption, EventOption, ExtensionOption, SpecialRecommendCore, ToggleOption,
};
use crate::selection::SelectionState;

/// Options of one category plus the user's pending selections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryState<T> {
    pub options: Vec<T>,
    pub selections: SelectionState,
}

impl<T> Default for CategoryState<T> {
    fn default() -> Self {
        Self {
            options: Vec::new(),
            selections: SelectionState::new(),
        }
    }
}

impl<T: ToggleOption> CategoryState<T> {
    /// Fresh state with selections seeded from persisted flags.
    pub fn new(options: Vec<T>) -> Self {
        Self {
            selections: SelectionState::from_options(&options),
            options,
        }
    }

    pub fn has_changes(&self) -> bool {
        self.selections.has_changes(&self.options)
    }

    /// Drop pending selections, back to the persisted flags.
    pub fn discard(&mut self) {
        self.selections = SelectionState::from_options(&self.options);
    }

    pub fn enabled_count(&self) -> usize {
        self.options.iter().filter(|option| option.enabled()).count()
    }

    pub fn find(&self, key: &str) -> Option<&T> {
        self.options.iter().find(|option| option.key() == key)
    }
}

/// Everything the manager holds for the active world book.
///
/// Wrapped by [`StateManager`](crate::state::StateManager); mutate it only
/// through [`StateManager::update`](crate::state::StateManager::update) so
/// change events are emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Active world book, `None` when nothing is open
    pub book_name: Option<String>,

    pub characters: CategoryState<CharacterOption>,
    pub events: CategoryState<EventOption>,
    pub extensions: CategoryState<ExtensionOption>,
    pub cores: CategoryState<CoreOption>,

    // Core tab layout
    pub tabs: Vec<String>,
    pub active_tab: String,
    pub special_recommend: Vec<SpecialRecommendCore>,
}

impl SessionState {
    /// Whether `category` has selections that differ from persisted state.
    pub fn has_changes(&self, category: Category) -> bool {
        match category {
            Category::Core => self.cores.has_changes(),
            Category::Character => self.characters.has_changes(),
            Category::Event => self.events.has_changes(),
            Category::Extension => self.extensions.has_changes(),
        }
    }

    pub fn has_any_changes(&self) -> bool {
        Category::ALL.into_iter().any(|category| self.has_changes(category))
    }

    /// Options loaded for `category`.
    pub fn option_count(&self, category: Category) -> usize {
        match category {
            Category::Core => self.cores.options.len(),
            Category::Character => self.characters.options.len(),
            Category::Event => self.events.options.len(),
            Category::Extension => self.extensions.options.len(),
        }
    }

    /// Options of `category` whose persisted flag is on.
    pub fn enabled_count(&self, category: Category) -> usize {
        match category {
            Category::Core => self.cores.enabled_count(),
            Category::Character => self.characters.enabled_count(),
            Category::Event => self.events.enabled_count(),
            Category::Extension => self.extensions.enabled_count(),
        }
    }

    /// Selections of `category`.
    pub fn selections(&self, category: Category) -> &SelectionState {
        match category {
            Category::Core => &self.cores.selections,
            Category::Character => &self.characters.selections,
            Category::Event => &self.events.selections,
            Category::Extension => &self.extensions.selections,
        }
    }

    /// Value of the core currently selected, if any.
    pub fn selected_core(&self) -> Option<&str> {
        self.cores.selections.selected()
    }

    /// Restore every category's selections to persisted state.
    pub fn discard_all(&mut self) {
        self.characters.discard();
        self.events.discard();
        self.extensions.discard();
        self.cores.discard();
    }
}
