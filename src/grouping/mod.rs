//! Entry Grouper: collapses a flat, category-filtered entry list into
//! user-facing options.
//!
//! - Characters are ungrouped: one entry is one option.
//! - Events and extensions are grouped by their bracket key in first-seen
//!   order, then sorted by label.
//! - Entries whose name has no grouping key are dropped (logged, not an error).

pub mod collation;

pub use collation::{collation_key, compare_labels, sort_by_label};

use crate::grammar::{self, AuthorInfo};
use crate::models::{
    Category, CharacterOption, EventOption, ExtensionOption, GroupedOption, RawEntry,
};
use indexmap::{IndexMap, IndexSet};

/// Entries sharing one grouping key, in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryGroup {
    pub key: String,
    pub label: String,
    pub entries: Vec<RawEntry>,
}

/// Group entries of a keyed category by their grouping key.
///
/// The returned map preserves first-seen key order.
pub fn group_by_key(entries: &[RawEntry], category: Category) -> IndexMap<String, EntryGroup> {
    let mut groups: IndexMap<String, EntryGroup> = IndexMap::new();

    for entry in entries {
        let Some(grouped) = grammar::parse_grouped(&entry.name).filter(|g| g.category == category)
        else {
            tracing::debug!("Dropping {} entry without grouping key: {}", category, entry.name);
            continue;
        };

        groups
            .entry(grouped.key.to_string())
            .or_insert_with(|| EntryGroup {
                key: grouped.key.to_string(),
                label: grouped.label.to_string(),
                entries: Vec::new(),
            })
            .entries
            .push(entry.clone());
    }

    groups
}

/// Author/info of the first member that has a trailing parenthetical.
fn first_author_info(entries: &[RawEntry]) -> AuthorInfo {
    entries
        .iter()
        .find_map(|entry| grammar::author_info(&entry.name))
        .unwrap_or_default()
}

/// One option per `[角色]` entry, sorted by label.
pub fn character_options(entries: &[RawEntry]) -> Vec<CharacterOption> {
    let mut options: Vec<CharacterOption> = entries
        .iter()
        .map(|entry| {
            let parts = grammar::parse_character(&entry.name);
            CharacterOption {
                value: entry.name.clone(),
                label: parts.label,
                author: parts.author,
                info: parts.info,
                enabled: entry.enabled,
            }
        })
        .collect();

    sort_by_label(&mut options);
    options
}

/// One option per `[事件][X]` key, sorted by label.
pub fn event_options(entries: &[RawEntry]) -> Vec<EventOption> {
    let mut options: Vec<EventOption> = group_by_key(entries, Category::Event)
        .into_values()
        .map(|group| {
            let AuthorInfo { author, info } = first_author_info(&group.entries);
            let mut option = EventOption {
                event_key: group.key,
                label: group.label,
                author,
                info,
                entries: group.entries,
                enabled: false,
            };
            option.recompute_enabled();
            option
        })
        .collect();

    sort_by_label(&mut options);
    options
}

/// One option per `[扩展][X]` key, sorted by label.
///
/// Relationship targets are the de-duplicated union over all members.
pub fn extension_options(entries: &[RawEntry]) -> Vec<ExtensionOption> {
    let mut options: Vec<ExtensionOption> = group_by_key(entries, Category::Extension)
        .into_values()
        .map(|group| {
            let AuthorInfo { author, info } = first_author_info(&group.entries);

            let mut exclusion = IndexSet::new();
            let mut replacement = IndexSet::new();
            let mut prerequisite = IndexSet::new();
            for entry in &group.entries {
                let targets = grammar::relationship_targets(&entry.name);
                exclusion.extend(targets.exclusion);
                replacement.extend(targets.replacement);
                prerequisite.extend(targets.prerequisite);
            }

            let mut option = ExtensionOption {
                extension_key: group.key,
                label: group.label,
                author,
                info,
                exclusion_targets: exclusion.into_iter().collect(),
                replacement_targets: replacement.into_iter().collect(),
                prerequisite_targets: prerequisite.into_iter().collect(),
                entries: group.entries,
                enabled: false,
            };
            option.recompute_enabled();
            option
        })
        .collect();

    sort_by_label(&mut options);
    options
}

/// Number of member entries carried by a grouped option list.
pub fn member_count<T: GroupedOption>(options: &[T]) -> usize {
    options.iter().map(|option| option.entries().len()).sum()
}
