//! Change-Set Builder: turns desired selections into one registry batch.
//!
//! Planning is pure and decides *what* to write. For extensions it also lists
//! relationship targets, which [`expand_targets`] resolves to concrete entry
//! names by querying the registry. Every query finishes before the single write.
//!
//! Batch precedence for extensions:
//! 1. member updates (every member takes its option's decision)
//! 2. `[!X]` / `[>X]` targets of desired-on options are forced off, overriding (1)
//! 3. `[>X]` targets of options going on → off are restored, never overriding a `false`

use crate::metrics::Metrics;
use crate::models::{EntryUpdate, ExtensionOption, GroupedOption, ToggleOption};
use crate::registry::{Registry, RegistryError, target_pattern};
use crate::selection::SelectionState;
use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

/// Errors raised while persisting selections.
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("registry operation failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("invalid target pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("no active world book")]
    NoActiveScope,
}

/// Insertion-ordered name → enabled batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    updates: IndexMap<String, bool>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an update, replacing any earlier decision for the same name.
    pub fn queue(&mut self, name: impl Into<String>, enabled: bool) {
        self.updates.insert(name.into(), enabled);
    }

    /// Force an entry off. Always wins.
    pub fn force_disable(&mut self, name: impl Into<String>) {
        self.updates.insert(name.into(), false);
    }

    /// Turn an entry on unless the batch already disables it.
    pub fn restore(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.updates.get(&name) != Some(&false) {
            self.updates.insert(name, true);
        }
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.updates.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.updates.iter().map(|(name, enabled)| (name.as_str(), *enabled))
    }

    pub fn into_updates(self) -> Vec<EntryUpdate> {
        self.updates.into_iter().map(EntryUpdate::from).collect()
    }
}

/// Planned extension save, before relationship targets are resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionPlan {
    pub changes: ChangeSet,
    /// `[!X]` and `[>X]` targets of desired-on options
    pub disable_targets: Vec<String>,
    /// `[>X]` targets of options going on → off, minus anything in `disable_targets`
    pub restore_targets: Vec<String>,
}

/// Whole selection map as one batch, or `None` when nothing changed.
fn plan_flat_save<T: ToggleOption>(
    options: &[T],
    selections: &SelectionState,
) -> Option<ChangeSet> {
    if !selections.has_changes(options) {
        return None;
    }
    let mut changes = ChangeSet::new();
    for (key, enabled) in selections.iter() {
        changes.queue(key, enabled);
    }
    Some(changes)
}

/// Member updates for grouped options, or `None` when nothing changed.
fn plan_member_save<T: GroupedOption>(
    options: &[T],
    selections: &SelectionState,
) -> Option<ChangeSet> {
    if !selections.has_changes(options) {
        return None;
    }
    let mut changes = ChangeSet::new();
    for option in options {
        let enabled = selections.get(option.key());
        for entry in option.entries() {
            changes.queue(entry.name.clone(), enabled);
        }
    }
    Some(changes)
}

pub fn plan_character_save<T: ToggleOption>(
    options: &[T],
    selections: &SelectionState,
) -> Option<ChangeSet> {
    plan_flat_save(options, selections)
}

pub fn plan_core_save<T: ToggleOption>(
    options: &[T],
    selections: &SelectionState,
) -> Option<ChangeSet> {
    plan_flat_save(options, selections)
}

pub fn plan_event_save<T: GroupedOption>(
    options: &[T],
    selections: &SelectionState,
) -> Option<ChangeSet> {
    plan_member_save(options, selections)
}

/// Plan an extension save. `None` when no option's desired state changed.
pub fn plan_extension_save(
    options: &[ExtensionOption],
    selections: &SelectionState,
) -> Option<ExtensionPlan> {
    let changes = plan_member_save(options, selections)?;

    let mut exclusion = IndexSet::new();
    let mut replacement = IndexSet::new();
    let mut restore = IndexSet::new();

    for option in options {
        let desired = selections.get(option.key());
        if desired {
            exclusion.extend(option.exclusion_targets.iter().cloned());
            replacement.extend(option.replacement_targets.iter().cloned());
        } else if option.enabled {
            restore.extend(option.replacement_targets.iter().cloned());
        }
    }

    let restore_targets = restore
        .into_iter()
        .filter(|target| !exclusion.contains(target) && !replacement.contains(target))
        .collect();

    let mut disable_targets = exclusion;
    disable_targets.extend(replacement);

    Some(ExtensionPlan {
        changes,
        disable_targets: disable_targets.into_iter().collect(),
        restore_targets,
    })
}

/// Resolve a plan's relationship targets against the registry.
///
/// Queries run sequentially and each one issued is recorded in `metrics`;
/// the returned batch is ready for one write.
pub async fn expand_targets(
    registry: &dyn Registry,
    metrics: &Metrics,
    scope: &str,
    plan: ExtensionPlan,
) -> Result<ChangeSet, SaveError> {
    let ExtensionPlan {
        mut changes,
        disable_targets,
        restore_targets,
    } = plan;

    for target in &disable_targets {
        let pattern = target_pattern(target)?;
        metrics.record_registry_query();
        for entry in registry.get_filtered_entries(&pattern, scope).await? {
            tracing::debug!("[{}] disables {}", target, entry.name);
            changes.force_disable(entry.name);
        }
    }

    for target in &restore_targets {
        let pattern = target_pattern(target)?;
        metrics.record_registry_query();
        for entry in registry.get_filtered_entries(&pattern, scope).await? {
            tracing::debug!("[{}] restores {}", target, entry.name);
            changes.restore(entry.name);
        }
    }

    Ok(changes)
}

/// Options after a committed save. Members inherit the option decision.
pub fn apply_selections<T: ToggleOption + Clone>(
    options: &[T],
    selections: &SelectionState,
) -> Vec<T> {
    options
        .iter()
        .map(|option| {
            let mut next = option.clone();
            next.set_enabled(selections.get(option.key()));
            next
        })
        .collect()
}
