//! Selection State: the in-memory desired-enabled overlay per option key.
//!
//! Seeded from each option's persisted `enabled` flag on load and diffed
//! against it on save. All mutators return a new state; the input is never
//! modified, so a rejected toggle can hand back the original untouched.

use crate::models::ToggleOption;
use indexmap::IndexMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selections: IndexMap<String, bool>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from persisted state, in option order.
    pub fn from_options<T: ToggleOption>(options: &[T]) -> Self {
        Self {
            selections: options
                .iter()
                .map(|option| (option.key().to_string(), option.enabled()))
                .collect(),
        }
    }

    /// Desired state of a key. Unknown keys read as disabled.
    pub fn get(&self, key: &str) -> bool {
        self.selections.get(key).copied().unwrap_or(false)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.selections.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, enabled: bool) {
        self.selections.insert(key.into(), enabled);
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.selections.iter().map(|(key, enabled)| (key.as_str(), *enabled))
    }

    /// Flip one key. Used for characters and events, which carry no relationships.
    pub fn toggled(&self, key: &str) -> Self {
        let mut next = self.clone();
        let current = next.get(key);
        next.set(key, !current);
        next
    }

    /// First key currently desired on.
    pub fn selected(&self) -> Option<&str> {
        self.selections
            .iter()
            .find(|(_, enabled)| **enabled)
            .map(|(key, _)| key.as_str())
    }

    /// Make `key` the only selected key (cores are single-choice).
    ///
    /// Returns the state unchanged when `key` is already the selected one.
    /// Keys absent from the state are never added.
    pub fn select_exclusive(&self, key: &str) -> Self {
        if self.selected() == Some(key) {
            return self.clone();
        }
        Self {
            selections: self
                .selections
                .keys()
                .map(|name| (name.clone(), name == key))
                .collect(),
        }
    }

    /// Whether any option's desired state differs from its persisted flag.
    pub fn has_changes<T: ToggleOption>(&self, options: &[T]) -> bool {
        options
            .iter()
            .any(|option| self.get(option.key()) != option.enabled())
    }

    /// Keys whose desired state differs from the persisted flag.
    pub fn changed_keys<'a, T: ToggleOption>(&self, options: &'a [T]) -> Vec<&'a str> {
        options
            .iter()
            .filter(|option| self.get(option.key()) != option.enabled())
            .map(|option| option.key())
            .collect()
    }
}

impl FromIterator<(String, bool)> for SelectionState {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self {
        Self {
            selections: iter.into_iter().collect(),
        }
    }
}
