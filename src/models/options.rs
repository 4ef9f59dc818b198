use super::entry::{EventEntry, ExtensionEntry, RawEntry};
use serde::{Deserialize, Serialize};

/// Common surface of every user-facing toggle unit.
///
/// Selection state is keyed by [`ToggleOption::key`]; persisted state is read
/// through [`ToggleOption::enabled`].
pub trait ToggleOption {
    /// Stable key used in [`SelectionState`](crate::selection::SelectionState).
    fn key(&self) -> &str;

    /// Display label, also the sort key.
    fn label(&self) -> &str;

    /// Persisted enabled flag (AND over members for grouped options).
    fn enabled(&self) -> bool;

    /// Apply a persisted decision to the option and all of its members.
    fn set_enabled(&mut self, enabled: bool);
}

/// An option aggregating several member entries that move in lockstep.
pub trait GroupedOption: ToggleOption {
    fn entries(&self) -> &[RawEntry];
}

/// A `[角色]` entry. Ungrouped: one entry is one option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterOption {
    /// Full entry name, e.g. `[角色]薇薇拉(K1nn-原创角色)`
    pub value: String,
    pub label: String,
    pub author: String,
    pub info: String,
    pub enabled: bool,
}

/// Entries sharing one `[事件][X]` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOption {
    /// Grouping key, e.g. `[事件][双子]`
    pub event_key: String,
    pub label: String,
    pub author: String,
    pub info: String,
    pub entries: Vec<EventEntry>,
    /// True iff every member entry is enabled
    pub enabled: bool,
}

impl EventOption {
    /// Recompute the group flag from the members.
    pub fn recompute_enabled(&mut self) -> bool {
        self.enabled = self.entries.iter().all(|e| e.enabled);
        self.enabled
    }
}

/// Entries sharing one `[扩展][X]` key, with merged relationship targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionOption {
    /// Grouping key, e.g. `[扩展][无尽深渊地城扩展]`. Relationship tags are not part of it.
    pub extension_key: String,
    pub label: String,
    pub author: String,
    pub info: String,
    /// `[!X]` targets: turning this on turns the matching extensions off
    pub exclusion_targets: Vec<String>,
    /// `[>X]` targets: disabled while this is on, restored when it is turned off
    pub replacement_targets: Vec<String>,
    /// `[<X]` targets: must be on before this can be turned on
    pub prerequisite_targets: Vec<String>,
    pub entries: Vec<ExtensionEntry>,
    /// True iff every member entry is enabled
    pub enabled: bool,
}

impl ExtensionOption {
    /// Recompute the group flag from the members.
    pub fn recompute_enabled(&mut self) -> bool {
        self.enabled = self.entries.iter().all(|e| e.enabled);
        self.enabled
    }
}

/// A `命定系统-` entry with its tab classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreOption {
    pub value: String,
    pub label: String,
    pub author: String,
    pub enabled: bool,
    /// Every tab the core belongs to; the special-recommend tab comes first when present.
    pub tabs: Vec<String>,
    /// Note of the first matching classification tab
    pub note: String,
    /// Note from the special-recommend configuration
    pub special_note: String,
}

/// Special-recommend configuration value, keyed by full core entry name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialRecommendConfig {
    #[serde(default)]
    pub note: String,
}

/// A configured special-recommend core with its availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialRecommendCore {
    pub value: String,
    pub label: String,
    pub author: String,
    pub special_note: String,
    /// Whether the core is currently installed in the active world book
    pub available: bool,
}

impl ToggleOption for CharacterOption {
    fn key(&self) -> &str {
        &self.value
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl ToggleOption for EventOption {
    fn key(&self) -> &str {
        &self.event_key
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        for entry in &mut self.entries {
            entry.enabled = enabled;
        }
    }
}

impl ToggleOption for ExtensionOption {
    fn key(&self) -> &str {
        &self.extension_key
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        for entry in &mut self.entries {
            entry.enabled = enabled;
        }
    }
}

impl GroupedOption for EventOption {
    fn entries(&self) -> &[RawEntry] {
        &self.entries
    }
}

impl GroupedOption for ExtensionOption {
    fn entries(&self) -> &[RawEntry] {
        &self.entries
    }
}

impl ToggleOption for CoreOption {
    fn key(&self) -> &str {
        &self.value
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(entries: Vec<RawEntry>) -> EventOption {
        EventOption {
            event_key: "[事件][双子]".to_string(),
            label: "双子".to_string(),
            author: String::new(),
            info: String::new(),
            entries,
            enabled: false,
        }
    }

    #[test]
    fn test_recompute_enabled_is_and_over_members() {
        let mut option = event(vec![
            RawEntry::new("[事件][双子]a", true),
            RawEntry::new("[事件][双子]b", false),
        ]);
        assert!(!option.recompute_enabled());

        option.entries[1].enabled = true;
        assert!(option.recompute_enabled());
    }

    #[test]
    fn test_set_enabled_moves_members_in_lockstep() {
        let mut option = event(vec![
            RawEntry::new("[事件][双子]a", true),
            RawEntry::new("[事件][双子]b", false),
        ]);
        option.set_enabled(true);
        assert!(option.entries.iter().all(|e| e.enabled));
        assert!(option.enabled());

        option.set_enabled(false);
        assert!(option.entries.iter().all(|e| !e.enabled));
    }
}
