//! Core catalog: tab classification, special recommendations and the
//! cross-reference that assigns every installed core to its tabs.
//!
//! Classification data is a relaxed-JSON document keyed by tab name, each tab
//! mapping a core label to an optional note. Tab membership is looked up by
//! the core's parsed label; special recommendations are keyed by the full
//! entry name and never consult the classification.

pub mod remote;

pub use remote::{DataSource, FetchError, HttpDataSource, RemoteCatalog};

use crate::grammar;
use crate::models::{CoreOption, RawEntry, SpecialRecommendConfig, SpecialRecommendCore};
use indexmap::{IndexMap, IndexSet};

/// Tab holding cores that match no classification tab.
pub const UNCATEGORIZED_TAB: &str = "这是什么杯";

/// Synthetic tab listing installed special-recommend cores, always first.
pub const SPECIAL_RECOMMEND_TAB: &str = "特别推荐";

/// Most special-recommend cores surfaced, whatever the configuration holds.
pub const MAX_SPECIAL_RECOMMEND_COUNT: usize = 3;

/// One core's entry inside a classification tab.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabEntry {
    pub note: Option<String>,
}

/// Tab name → (core label → entry), in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    tabs: IndexMap<String, IndexMap<String, TabEntry>>,
}

impl Classification {
    /// Parse a classification document. Tabs whose value is not an object are skipped.
    pub fn parse(text: &str) -> Result<Self, json5::Error> {
        let document: IndexMap<String, serde_json::Value> = json5::from_str(text)?;

        let tabs = document
            .into_iter()
            .filter_map(|(tab, value)| match value {
                serde_json::Value::Object(cores) => {
                    let cores = cores
                        .into_iter()
                        .map(|(label, value)| {
                            let note = value
                                .get("note")
                                .and_then(serde_json::Value::as_str)
                                .map(str::to_string);
                            (label, TabEntry { note })
                        })
                        .collect();
                    Some((tab, cores))
                }
                _ => {
                    tracing::debug!("Skipping classification tab {} (not an object)", tab);
                    None
                }
            })
            .collect();

        Ok(Self { tabs })
    }

    pub fn from_tabs(tabs: IndexMap<String, IndexMap<String, TabEntry>>) -> Self {
        Self { tabs }
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn tab_names(&self) -> impl Iterator<Item = &str> {
        self.tabs.keys().map(String::as_str)
    }

    pub fn tab(&self, name: &str) -> Option<&IndexMap<String, TabEntry>> {
        self.tabs.get(name)
    }
}

/// Special-recommend configuration: full core entry name → config, in document order.
pub type SpecialRecommendMap = IndexMap<String, SpecialRecommendConfig>;

/// Parse a special-recommend document.
pub fn parse_special_recommend(text: &str) -> Result<SpecialRecommendMap, json5::Error> {
    json5::from_str(text)
}

/// Tabs and note of one core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreRanking {
    pub tabs: Vec<String>,
    pub note: String,
}

/// Full tab list: special-recommend, classification tabs, uncategorized.
pub fn tabs_from_classification(data: &Classification) -> Vec<String> {
    std::iter::once(SPECIAL_RECOMMEND_TAB)
        .chain(data.tab_names())
        .chain(std::iter::once(UNCATEGORIZED_TAB))
        .map(str::to_string)
        .collect()
}

/// Classification tabs containing `label`, in tab order.
///
/// The note comes from the first matching tab that has a non-empty one.
/// No match puts the core in [`UNCATEGORIZED_TAB`] alone.
pub fn core_ranking(label: &str, tabs: &[String], data: &Classification) -> CoreRanking {
    let mut matched = Vec::new();
    let mut note = String::new();

    for tab in tabs {
        if tab == UNCATEGORIZED_TAB || tab == SPECIAL_RECOMMEND_TAB {
            continue;
        }
        let Some(entry) = data.tab(tab).and_then(|cores| cores.get(label)) else {
            continue;
        };
        matched.push(tab.clone());
        if note.is_empty() {
            if let Some(tab_note) = entry.note.as_deref().filter(|n| !n.is_empty()) {
                note = tab_note.to_string();
            }
        }
    }

    if matched.is_empty() {
        return CoreRanking {
            tabs: vec![UNCATEGORIZED_TAB.to_string()],
            note: String::new(),
        };
    }

    CoreRanking { tabs: matched, note }
}

/// First [`MAX_SPECIAL_RECOMMEND_COUNT`] configured cores, flagged by whether
/// they are installed.
pub fn generate_special_recommend_cores(
    config: &SpecialRecommendMap,
    installed: &IndexSet<String>,
) -> Vec<SpecialRecommendCore> {
    config
        .iter()
        .take(MAX_SPECIAL_RECOMMEND_COUNT)
        .map(|(value, config)| {
            let parts = grammar::parse_core(value);
            SpecialRecommendCore {
                value: value.clone(),
                label: parts.label,
                author: parts.author,
                special_note: config.note.clone(),
                available: installed.contains(value),
            }
        })
        .collect()
}

/// Core options in enumeration order (cores are not sorted).
pub fn build_core_options(
    entries: &[RawEntry],
    tabs: &[String],
    data: &Classification,
    specials: &[SpecialRecommendCore],
) -> Vec<CoreOption> {
    entries
        .iter()
        .map(|entry| {
            let parts = grammar::parse_core(&entry.name);
            let ranking = core_ranking(&parts.label, tabs, data);

            let mut core_tabs = ranking.tabs;
            let mut special_note = String::new();
            if let Some(special) = specials
                .iter()
                .find(|special| special.available && special.value == entry.name)
            {
                core_tabs.insert(0, SPECIAL_RECOMMEND_TAB.to_string());
                special_note = special.special_note.clone();
            }

            CoreOption {
                value: entry.name.clone(),
                label: parts.label,
                author: parts.author,
                enabled: entry.enabled,
                tabs: core_tabs,
                note: ranking.note,
                special_note,
            }
        })
        .collect()
}

/// Cores belonging to `tab`.
pub fn cores_for_tab<'a>(options: &'a [CoreOption], tab: &str) -> Vec<&'a CoreOption> {
    options
        .iter()
        .filter(|core| core.tabs.iter().any(|t| t == tab))
        .collect()
}

/// Tab shown on load: always the first one.
pub fn default_active_tab(tabs: &[String]) -> String {
    tabs.first()
        .cloned()
        .unwrap_or_else(|| SPECIAL_RECOMMEND_TAB.to_string())
}
