//! Integration tests for the Entry Grouper
//!
//! These tests verify:
//! - Grouping the same entries twice yields the same options
//! - Grouped options are enabled exactly when every member is
//! - Malformed names are dropped without failing the load
//! - Labels sort with CJK characters by pinyin

use dlc_manager::RawEntry;
use dlc_manager::grouping::{self, compare_labels};
use dlc_manager::models::{GroupedOption, ToggleOption};
use proptest::prelude::*;
use std::cmp::Ordering;

const KEYS: &[&str] = &["双子", "地城", "Alpha", "beta", "深渊"];
const SUFFIXES: &[&str] = &["", "(作者-说明)", "[!地城]", "[>Alpha]", "[<双子]", "(K1nn)"];

fn entry_strategy() -> impl Strategy<Value = RawEntry> {
    (
        prop::bool::ANY,
        0..KEYS.len(),
        0..SUFFIXES.len(),
        0..4u8,
        prop::bool::ANY,
    )
        .prop_map(|(extension, key, suffix, part, enabled)| {
            let prefix = if extension { "[扩展]" } else { "[事件]" };
            RawEntry::new(
                format!("{prefix}[{}]第{part}部分{}", KEYS[key], SUFFIXES[suffix]),
                enabled,
            )
        })
}

proptest! {
    #[test]
    fn grouping_is_idempotent(entries in prop::collection::vec(entry_strategy(), 0..40)) {
        prop_assert_eq!(grouping::event_options(&entries), grouping::event_options(&entries));
        prop_assert_eq!(
            grouping::extension_options(&entries),
            grouping::extension_options(&entries)
        );
    }

    #[test]
    fn grouped_enabled_is_and_over_members(entries in prop::collection::vec(entry_strategy(), 1..40)) {
        for option in grouping::extension_options(&entries) {
            let all_on = option.entries().iter().all(|entry| entry.enabled);
            prop_assert_eq!(option.enabled(), all_on);
        }
        for option in grouping::event_options(&entries) {
            let all_on = option.entries().iter().all(|entry| entry.enabled);
            prop_assert_eq!(option.enabled(), all_on);
        }
    }

    #[test]
    fn grouped_keys_are_unique(entries in prop::collection::vec(entry_strategy(), 0..40)) {
        let options = grouping::extension_options(&entries);
        let mut keys: Vec<&str> = options.iter().map(|option| option.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        prop_assert_eq!(keys.len(), options.len());
    }
}

#[test]
fn test_flipping_a_member_is_seen_by_recompute() {
    let entries = vec![
        RawEntry::new("[事件][双子]上篇", true),
        RawEntry::new("[事件][双子]下篇", true),
    ];
    let mut option = grouping::event_options(&entries).remove(0);
    assert!(option.enabled);

    option.entries[1].enabled = false;
    assert!(!option.recompute_enabled());
    assert!(!option.enabled);
}

#[test]
fn test_malformed_names_are_dropped() {
    let entries = vec![
        RawEntry::new("[扩展]没有键", true),
        RawEntry::new("[扩展][]空键", true),
        RawEntry::new("[扩展][地城]正文", false),
    ];

    let options = grouping::extension_options(&entries);
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].label, "地城");
    assert_eq!(grouping::member_count(&options), 1);
}

#[test]
fn test_bracket_inside_key_and_target() {
    let entries = vec![
        RawEntry::new("[扩展][a[b]正文", true),
        RawEntry::new("[扩展][X][!a[b]正文", false),
    ];

    let options = grouping::extension_options(&entries);
    assert_eq!(options.len(), 2);
    assert_eq!(options[0].extension_key, "[扩展][a[b]");
    assert_eq!(options[0].label, "a[b");
    assert_eq!(options[1].exclusion_targets, vec!["a[b".to_string()]);
    assert_eq!(grouping::member_count(&options), 2);
}

#[test]
fn test_relationship_targets_are_collected_across_members() {
    let entries = vec![
        RawEntry::new("[扩展][新版][>旧版]开场", true),
        RawEntry::new("[扩展][新版][!冲突][<基础]结尾(作者-补充)", true),
    ];

    let option = grouping::extension_options(&entries).remove(0);
    assert_eq!(option.replacement_targets, vec!["旧版".to_string()]);
    assert_eq!(option.exclusion_targets, vec!["冲突".to_string()]);
    assert_eq!(option.prerequisite_targets, vec!["基础".to_string()]);
    assert_eq!(option.author, "作者");
    assert_eq!(option.info, "补充");
}

#[test]
fn test_character_labels_sort_by_pinyin() {
    let entries = vec![
        RawEntry::new("[角色]张三", false),
        RawEntry::new("[角色]阿福", false),
        RawEntry::new("[角色]Bob", false),
    ];

    let labels: Vec<String> = grouping::character_options(&entries)
        .into_iter()
        .map(|option| option.label)
        .collect();
    assert_eq!(labels, vec!["阿福", "Bob", "张三"]);
}

#[test]
fn test_compare_labels_is_total() {
    assert_eq!(compare_labels("地城", "地城"), Ordering::Equal);
    assert_eq!(compare_labels("阿", "波"), Ordering::Less);
    assert_eq!(compare_labels("zebra", "Apple"), Ordering::Greater);
}
