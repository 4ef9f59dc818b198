//! Dependency Resolver for extension toggles.
//!
//! Relationship tags name bare labels while options are keyed by
//! `[扩展][label]`, so targets are re-matched against labels and key
//! segments on every call through a [`LabelIndex`].
//!
//! One toggle request runs:
//!
//! 1. Flip the requested option's desired state.
//! 2. Turning on: every `[<X]` prerequisite must resolve to an option that is
//!    currently desired on, otherwise the whole toggle is rejected and the
//!    input state is returned untouched.
//! 3. Turning on: every option matching a `[!X]` target is forced off.
//! 4. Turning off: every desired-on option listing this label as a
//!    prerequisite is forced off.
//!
//! Steps 3 and 4 cascade [`CASCADE_DEPTH`] hops.

use crate::models::{ExtensionOption, ToggleOption};
use crate::selection::SelectionState;
use std::collections::HashMap;
use thiserror::Error;

/// Number of cascade hops applied per toggle.
///
/// Options disabled by a cascade do not have their own dependents revoked in
/// the same call; the caller toggles again if a deeper cascade is wanted.
pub const CASCADE_DEPTH: usize = 1;

/// Why a toggle was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToggleRejection {
    #[error("missing prerequisites: {}", missing.join(", "))]
    MissingPrerequisites { missing: Vec<String> },
}

/// Result of an extension toggle request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Toggle and cascades applied to a copy of the input state
    Applied(SelectionState),
    /// Nothing applied; `selections` equals the input state
    Rejected {
        selections: SelectionState,
        reason: ToggleRejection,
    },
}

impl ToggleOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ToggleOutcome::Applied(_))
    }

    pub fn selections(&self) -> &SelectionState {
        match self {
            ToggleOutcome::Applied(selections) => selections,
            ToggleOutcome::Rejected { selections, .. } => selections,
        }
    }

    pub fn into_selections(self) -> SelectionState {
        match self {
            ToggleOutcome::Applied(selections) => selections,
            ToggleOutcome::Rejected { selections, .. } => selections,
        }
    }

    /// Labels that blocked the toggle, empty on success.
    pub fn missing_prerequisites(&self) -> &[String] {
        match self {
            ToggleOutcome::Rejected {
                reason: ToggleRejection::MissingPrerequisites { missing },
                ..
            } => missing,
            ToggleOutcome::Applied(_) => &[],
        }
    }
}

/// Label and key-segment lookups over one option list.
#[derive(Debug)]
pub struct LabelIndex<'a> {
    options: &'a [ExtensionOption],
    by_key: HashMap<&'a str, usize>,
    by_label: HashMap<&'a str, Vec<usize>>,
    by_segment: HashMap<&'a str, Vec<usize>>,
    dependents: HashMap<&'a str, Vec<usize>>,
}

impl<'a> LabelIndex<'a> {
    pub fn new(options: &'a [ExtensionOption]) -> Self {
        let mut by_key = HashMap::with_capacity(options.len());
        let mut by_label: HashMap<&str, Vec<usize>> = HashMap::new();
        let mut by_segment: HashMap<&str, Vec<usize>> = HashMap::new();
        let mut dependents: HashMap<&str, Vec<usize>> = HashMap::new();

        for (index, option) in options.iter().enumerate() {
            by_key.entry(option.extension_key.as_str()).or_insert(index);
            by_label.entry(option.label.as_str()).or_default().push(index);

            for segment in key_segments(&option.extension_key) {
                let holders = by_segment.entry(segment).or_default();
                if holders.last() != Some(&index) {
                    holders.push(index);
                }
            }

            for prerequisite in &option.prerequisite_targets {
                let holders = dependents.entry(prerequisite.as_str()).or_default();
                if holders.last() != Some(&index) {
                    holders.push(index);
                }
            }
        }

        Self {
            options,
            by_key,
            by_label,
            by_segment,
            dependents,
        }
    }

    pub fn option(&self, index: usize) -> &'a ExtensionOption {
        &self.options[index]
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.by_key.get(key).copied()
    }

    /// Options whose key contains `[target]`, in list order.
    pub fn with_segment(&self, target: &str) -> &[usize] {
        self.by_segment.get(target).map_or(&[], Vec::as_slice)
    }

    /// Options whose label equals `target` or whose key contains `[target]`.
    pub fn exclusion_matches(&self, target: &str) -> Vec<usize> {
        let mut matches: Vec<usize> = self
            .by_label
            .get(target)
            .map_or(&[][..], Vec::as_slice)
            .iter()
            .chain(self.with_segment(target))
            .copied()
            .collect();
        matches.sort_unstable();
        matches.dedup();
        matches
    }

    /// Options listing `label` among their prerequisites.
    pub fn dependents_of(&self, label: &str) -> &[usize] {
        self.dependents.get(label).map_or(&[], Vec::as_slice)
    }

    /// Prerequisite labels of `option` not satisfied by `selections`.
    ///
    /// A prerequisite resolves to the first option whose key contains
    /// `[label]`; it is missing when no such option exists or it is off.
    pub fn missing_prerequisites(
        &self,
        option: &ExtensionOption,
        selections: &SelectionState,
    ) -> Vec<String> {
        option
            .prerequisite_targets
            .iter()
            .filter(|target| {
                !self
                    .with_segment(target)
                    .first()
                    .is_some_and(|&index| selections.get(self.options[index].key()))
            })
            .cloned()
            .collect()
    }
}

/// Every `t` such that `[t]` occurs in a key, e.g. `[扩展][地城]` → `扩展`, `地城`.
///
/// A `[` nested inside a bracket opens another candidate, so `[a[b]` yields
/// `a[b` and `b`. For targets without `]`, `segments.contains(t)` ⇔
/// `key.contains("[t]")`.
fn key_segments(key: &str) -> impl Iterator<Item = &str> {
    let mut segment_start = 0;
    key.match_indices(']').flat_map(move |(close, _)| {
        let window = &key[segment_start..close];
        segment_start = close + 1;
        window
            .match_indices('[')
            .map(move |(open, _)| &window[open + 1..])
            .filter(|inner| !inner.is_empty())
    })
}

/// Resolve a toggle of the extension `key` against the full option list.
pub fn toggle_extension(
    selections: &SelectionState,
    options: &[ExtensionOption],
    key: &str,
) -> ToggleOutcome {
    let index = LabelIndex::new(options);
    let enable = !selections.get(key);
    let position = index.position(key);

    if enable {
        if let Some(position) = position {
            let missing = index.missing_prerequisites(index.option(position), selections);
            if !missing.is_empty() {
                tracing::debug!(
                    "Rejected enabling {}: missing prerequisites {:?}",
                    key,
                    missing
                );
                return ToggleOutcome::Rejected {
                    selections: selections.clone(),
                    reason: ToggleRejection::MissingPrerequisites { missing },
                };
            }
        }
    }

    let mut next = selections.clone();
    next.set(key, enable);

    if let Some(position) = position {
        cascade(&index, &mut next, position, enable);
    }

    ToggleOutcome::Applied(next)
}

/// Apply exclusion (on) and prerequisite-revocation (off) effects, hop by hop.
fn cascade(index: &LabelIndex<'_>, state: &mut SelectionState, origin: usize, enabled: bool) {
    let mut frontier = vec![(origin, enabled)];

    for _hop in 0..CASCADE_DEPTH {
        let mut newly_disabled = Vec::new();

        for (position, on) in frontier {
            let option = index.option(position);
            if on {
                for target in &option.exclusion_targets {
                    for other in index.exclusion_matches(target) {
                        if other == position {
                            continue;
                        }
                        let other_key = index.option(other).key();
                        if state.get(other_key) {
                            newly_disabled.push(other);
                        }
                        state.set(other_key, false);
                        tracing::debug!("{} excludes {}", option.label, other_key);
                    }
                }
            } else {
                for &dependent in index.dependents_of(&option.label) {
                    let dependent_key = index.option(dependent).key();
                    if dependent != position && state.get(dependent_key) {
                        state.set(dependent_key, false);
                        newly_disabled.push(dependent);
                        tracing::debug!(
                            "{} lost prerequisite {}, disabling",
                            dependent_key,
                            option.label
                        );
                    }
                }
            }
        }

        if newly_disabled.is_empty() {
            break;
        }
        frontier = newly_disabled.into_iter().map(|i| (i, false)).collect();
    }
}
