use serde::{Deserialize, Serialize};
use std::fmt;

/// One persisted world-book entry as enumerated by the registry.
///
/// The name is the only source of derived metadata: category, grouping key,
/// label, author and relationship tags are all parsed out of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawEntry {
    pub name: String,
    pub enabled: bool,
}

impl RawEntry {
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
        }
    }
}

/// Member of a grouped event option.
pub type EventEntry = RawEntry;

/// Member of a grouped extension option.
pub type ExtensionEntry = RawEntry;

/// A single name → enabled pair in a registry batch write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryUpdate {
    pub name: String,
    pub enabled: bool,
}

impl EntryUpdate {
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
        }
    }
}

impl From<(String, bool)> for EntryUpdate {
    fn from((name, enabled): (String, bool)) -> Self {
        Self { name, enabled }
    }
}

/// Entry category, decided by a fixed name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// `命定系统-` entries, classified into tabs by remote data
    Core,
    /// `[角色]` entries, one option per entry
    Character,
    /// `[事件][key]` entries, grouped by key
    Event,
    /// `[扩展][key]` entries, grouped by key and carrying relationship tags
    Extension,
}

impl Category {
    /// Detection priority. Prefixes are disjoint, so at most one matches.
    pub const ALL: [Category; 4] = [
        Category::Core,
        Category::Character,
        Category::Event,
        Category::Extension,
    ];

    /// Literal name prefix identifying the category.
    pub fn prefix(self) -> &'static str {
        match self {
            Category::Core => "命定系统-",
            Category::Character => "[角色]",
            Category::Event => "[事件]",
            Category::Extension => "[扩展]",
        }
    }

    /// Registry filter pattern selecting every entry of this category.
    pub fn filter_pattern(self) -> &'static str {
        match self {
            Category::Core => r"^命定系统-",
            Category::Character => r"^\[角色\]",
            Category::Event => r"^\[事件\]",
            Category::Extension => r"^\[扩展\]",
        }
    }

    /// Detect the category of an entry name, if any.
    pub fn detect(name: &str) -> Option<Category> {
        Self::ALL
            .into_iter()
            .find(|category| name.starts_with(category.prefix()))
    }

    /// Whether entries of this category are grouped by a bracket key.
    pub fn is_grouped(self) -> bool {
        matches!(self, Category::Event | Category::Extension)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Core => "core",
            Category::Character => "character",
            Category::Event => "event",
            Category::Extension => "extension",
        };
        f.write_str(name)
    }
}
