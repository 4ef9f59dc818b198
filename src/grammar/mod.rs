//! Entry-name grammar.
//!
//! Every higher-level field (category, grouping key, label, author, info,
//! relationship targets) is derived from one [`tokenize`] pass. Parsing is
//! total: malformed names fall back to "whole remainder as label" and never fail.

pub mod tokenizer;

pub use tokenizer::{Parenthetical, Relation, Token, TokenStream, tokenize};

use crate::models::Category;

/// Label, author and free-text info parsed from a name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameParts {
    pub label: String,
    pub author: String,
    pub info: String,
}

/// Label and author of a core entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreNameParts {
    pub label: String,
    pub author: String,
}

/// `author-info` split of a parenthetical.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorInfo {
    pub author: String,
    pub info: String,
}

/// Relationship targets of one entry, in order of appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationTargets {
    pub exclusion: Vec<String>,
    pub replacement: Vec<String>,
    pub prerequisite: Vec<String>,
}

/// Grouping fields of an event or extension entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedName<'a> {
    pub category: Category,
    /// e.g. `[扩展][无尽深渊地城扩展]`
    pub key: &'a str,
    /// e.g. `无尽深渊地城扩展`
    pub label: &'a str,
}

/// Split `author-info` on the first dash. A leading dash does not split.
pub fn split_author_info(raw: &str) -> AuthorInfo {
    let raw = raw.trim();
    match raw.find('-') {
        Some(dash) if dash > 0 => AuthorInfo {
            author: raw[..dash].trim().to_string(),
            info: raw[dash + 1..].trim().to_string(),
        },
        _ => AuthorInfo {
            author: raw.to_string(),
            info: String::new(),
        },
    }
}

/// Parse a `[角色]` entry: `label(author-info)?`.
///
/// ```
/// use dlc_manager::grammar::parse_character;
///
/// let parts = parse_character("[角色]薇薇拉(K1nn-原创角色)");
/// assert_eq!(parts.label, "薇薇拉");
/// assert_eq!(parts.author, "K1nn");
/// assert_eq!(parts.info, "原创角色");
/// ```
pub fn parse_character(name: &str) -> NameParts {
    let stream = tokenize(name);
    let body = stream.body();
    if body.is_empty() {
        return NameParts::default();
    }

    let paren = stream.parenthetical().filter(|p| {
        p.is_terminal(name) && !p.inner.is_empty() && p.open > stream.body_start()
    });

    match paren {
        Some(paren) => {
            let AuthorInfo { author, info } = split_author_info(paren.inner);
            NameParts {
                label: name[stream.body_start()..paren.open].trim().to_string(),
                author,
                info,
            }
        }
        None => NameParts {
            label: body.trim().to_string(),
            ..NameParts::default()
        },
    }
}

/// Parse a `命定系统-` entry: `label(author)?`, no trimming, author kept verbatim.
///
/// ```
/// use dlc_manager::grammar::parse_core;
///
/// let parts = parse_core("命定系统-英雄(Author)");
/// assert_eq!(parts.label, "英雄");
/// assert_eq!(parts.author, "Author");
/// ```
pub fn parse_core(name: &str) -> CoreNameParts {
    let stream = tokenize(name);
    match stream
        .parenthetical()
        .filter(|p| p.is_terminal(name) && p.open >= stream.body_start())
    {
        Some(paren) => CoreNameParts {
            label: name[stream.body_start()..paren.open].to_string(),
            author: paren.inner.to_string(),
        },
        None => CoreNameParts {
            label: stream.body().to_string(),
            author: String::new(),
        },
    }
}

/// Grouping key and label of an event/extension entry.
///
/// `None` when the name has no grouping bracket directly after its prefix,
/// or is not an event/extension entry at all.
pub fn parse_grouped(name: &str) -> Option<GroupedName<'_>> {
    let stream = tokenize(name);
    let category = stream.category().filter(|c| c.is_grouped())?;
    Some(GroupedName {
        category,
        key: stream.grouping_key()?,
        label: stream.key_label()?,
    })
}

/// Author/info from the trailing parenthetical of an event/extension name.
///
/// `None` when there is no usable parenthetical; callers use this to implement
/// first-match-wins across group members.
pub fn author_info(name: &str) -> Option<AuthorInfo> {
    tokenize(name)
        .parenthetical()
        .filter(|p| !p.inner.is_empty())
        .map(|p| split_author_info(p.inner))
}

/// Every `[!X]`, `[>X]` and `[<X]` target in the whole name.
pub fn relationship_targets(name: &str) -> RelationTargets {
    let stream = tokenize(name);
    let mut targets = RelationTargets::default();
    for (relation, target) in stream.relations() {
        let bucket = match relation {
            Relation::Exclusion => &mut targets.exclusion,
            Relation::Replacement => &mut targets.replacement,
            Relation::Prerequisite => &mut targets.prerequisite,
        };
        bucket.push(target.to_string());
    }
    targets
}
