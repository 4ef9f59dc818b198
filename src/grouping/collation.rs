use crate::models::ToggleOption;
use pinyin::ToPinyin;
use std::cmp::Ordering;

/// Sort key of a label: Han characters become their toneless pinyin,
/// everything else is lowercased. Chinese therefore sorts by pinyin and
/// Latin text a–z, interleaved.
pub fn collation_key(label: &str) -> String {
    let mut key = String::with_capacity(label.len() * 2);
    for c in label.chars() {
        match c.to_pinyin() {
            Some(pinyin) => key.push_str(pinyin.plain()),
            None => key.extend(c.to_lowercase()),
        }
    }
    key
}

/// Compare two labels by collation key, raw label as tie-break.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

/// Stable in-place sort by label.
pub fn sort_by_label<T: ToggleOption>(options: &mut [T]) {
    options.sort_by_cached_key(|option| (collation_key(option.label()), option.label().to_string()));
}
