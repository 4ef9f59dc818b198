//! Single-pass tokenizer for the bracket-tag entry-name grammar.
//!
//! ```text
//! [扩展][无尽深渊地城扩展][!原版无尽深渊地城]无尽深渊地城-控制(Hilo)
//! └──┬─┘└──────┬───────┘└────────┬───────┘└──────┬──────┘└─┬──┘
//! Category    Key          Relation(!)          Text   Parenthetical
//! ```
//!
//! Brackets and text partition the body that follows the category prefix.
//! The trailing parenthetical is reported last as a marker and may overlap
//! the final text token.

use crate::models::Category;

/// Relationship kind carried by a marked bracket segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// `[!X]`
    Exclusion,
    /// `[>X]`
    Replacement,
    /// `[<X]`
    Prerequisite,
}

impl Relation {
    pub fn marker(self) -> char {
        match self {
            Relation::Exclusion => '!',
            Relation::Replacement => '>',
            Relation::Prerequisite => '<',
        }
    }

    /// Split a bracket's inner text into a relation and its non-empty target.
    pub fn split(inner: &str) -> Option<(Relation, &str)> {
        let mut chars = inner.chars();
        let relation = match chars.next()? {
            '!' => Relation::Exclusion,
            '>' => Relation::Replacement,
            '<' => Relation::Prerequisite,
            _ => return None,
        };
        let target = chars.as_str();
        (!target.is_empty()).then_some((relation, target))
    }
}

/// Trailing `( ... )` group of a name. Offsets are byte offsets into the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parenthetical<'a> {
    pub inner: &'a str,
    pub open: usize,
    pub close: usize,
}

impl Parenthetical<'_> {
    /// Whether the group closes the name with nothing after it.
    pub fn is_terminal(&self, name: &str) -> bool {
        self.close + 1 == name.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Category(Category),
    /// Inner text of the grouping bracket right after an event/extension prefix
    Key(&'a str),
    Relation(Relation, &'a str),
    /// Any other non-empty bracket
    Segment(&'a str),
    Text(&'a str),
    Parenthetical(Parenthetical<'a>),
}

/// Token stream of one entry name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStream<'a> {
    name: &'a str,
    category: Option<Category>,
    body_start: usize,
    key_end: Option<usize>,
    tokens: Vec<Token<'a>>,
}

impl<'a> TokenStream<'a> {
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    /// Byte offset where the body (everything after the category prefix) starts.
    pub fn body_start(&self) -> usize {
        self.body_start
    }

    pub fn body(&self) -> &'a str {
        &self.name[self.body_start..]
    }

    pub fn tokens(&self) -> &[Token<'a>] {
        &self.tokens
    }

    /// Full grouping key including the category prefix, e.g. `[事件][双子]`.
    pub fn grouping_key(&self) -> Option<&'a str> {
        self.key_end.map(|end| &self.name[..end])
    }

    /// Inner text of the grouping key, e.g. `双子`.
    pub fn key_label(&self) -> Option<&'a str> {
        self.tokens.iter().find_map(|token| match token {
            Token::Key(inner) => Some(*inner),
            _ => None,
        })
    }

    /// Every relationship tag in the name, in order of appearance.
    ///
    /// A grouping key that itself carries a marker still reports its relation,
    /// and so does a marker opened by a `[` nested inside another bracket.
    pub fn relations(&self) -> impl Iterator<Item = (Relation, &'a str)> + '_ {
        self.tokens.iter().flat_map(|token| {
            let (own, inner) = match *token {
                Token::Relation(relation, target) => (Some((relation, target)), target),
                Token::Key(inner) | Token::Segment(inner) => (Relation::split(inner), inner),
                _ => (None, ""),
            };
            bracket_relations(own, inner)
        })
    }

    pub fn parenthetical(&self) -> Option<Parenthetical<'a>> {
        self.tokens.iter().rev().find_map(|token| match token {
            Token::Parenthetical(paren) => Some(*paren),
            _ => None,
        })
    }
}

/// Tokenize an entry name. Total: any string produces a stream.
pub fn tokenize(name: &str) -> TokenStream<'_> {
    let category = Category::detect(name);
    let body_start = category.map_or(0, |c| c.prefix().len());

    let mut tokens = Vec::new();
    if let Some(category) = category {
        tokens.push(Token::Category(category));
    }

    let keyed = category.is_some_and(Category::is_grouped);
    let mut key_end = None;
    let mut text_start = body_start;
    let mut pos = body_start;

    while let Some(offset) = name[pos..].find('[') {
        let open = pos + offset;
        // A segment's inner text runs from its '[' to the next ']'.
        let Some(len) = name[open + 1..].find(']') else {
            break;
        };
        let close = open + 1 + len;
        let next = close + 1;
        let inner = &name[open + 1..close];
        if inner.is_empty() {
            pos = next;
            continue;
        }

        if open > text_start {
            tokens.push(Token::Text(&name[text_start..open]));
        }

        if keyed && key_end.is_none() && open == body_start {
            tokens.push(Token::Key(inner));
            key_end = Some(next);
        } else if let Some((relation, target)) = Relation::split(inner) {
            tokens.push(Token::Relation(relation, target));
        } else {
            tokens.push(Token::Segment(inner));
        }

        text_start = next;
        pos = next;
    }

    if text_start < name.len() {
        tokens.push(Token::Text(&name[text_start..]));
    }

    // A character label needs at least one character before its parenthetical.
    let min_open = match category {
        Some(Category::Character) => name[body_start..]
            .chars()
            .next()
            .map_or(body_start, |c| body_start + c.len_utf8()),
        _ => body_start,
    };
    if let Some(paren) = trailing_parenthetical(name, min_open) {
        tokens.push(Token::Parenthetical(paren));
    }

    TokenStream {
        name,
        category,
        body_start,
        key_end,
        tokens,
    }
}

/// Relations of one bracket: its own marker, then markers after any `[`
/// inside it. A bracket carries at most one relation of each kind.
fn bracket_relations<'a>(
    own: Option<(Relation, &'a str)>,
    inner: &'a str,
) -> impl Iterator<Item = (Relation, &'a str)> + 'a {
    let nested = inner
        .match_indices('[')
        .filter_map(move |(i, _)| Relation::split(&inner[i + 1..]));
    let mut seen = [false; 3];
    own.into_iter()
        .chain(nested)
        .filter(move |(relation, _)| !std::mem::replace(&mut seen[*relation as usize], true))
}

/// Locate the trailing parenthetical: the last `)` whose remainder holds no
/// parentheses, opened by the leftmost `(` after the preceding `)`.
fn trailing_parenthetical(name: &str, min_open: usize) -> Option<Parenthetical<'_>> {
    let close = name.rfind(')')?;
    if name[close + 1..].contains('(') {
        return None;
    }

    let after_prev_close = name[..close].rfind(')').map_or(0, |i| i + 1);
    let start = after_prev_close.max(min_open);
    if start > close {
        return None;
    }
    let open = start + name[start..close].find('(')?;

    Some(Parenthetical {
        inner: &name[open + 1..close],
        open,
        close,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_name_token_stream() {
        let name = "[扩展][无尽深渊地城扩展][!原版无尽深渊地城]无尽深渊地城-控制(Hilo)";
        let stream = tokenize(name);

        assert_eq!(stream.category(), Some(Category::Extension));
        assert_eq!(stream.grouping_key(), Some("[扩展][无尽深渊地城扩展]"));
        assert_eq!(stream.key_label(), Some("无尽深渊地城扩展"));

        let tokens = stream.tokens();
        assert_eq!(tokens[0], Token::Category(Category::Extension));
        assert_eq!(tokens[1], Token::Key("无尽深渊地城扩展"));
        assert_eq!(tokens[2], Token::Relation(Relation::Exclusion, "原版无尽深渊地城"));
        assert_eq!(tokens[3], Token::Text("无尽深渊地城-控制(Hilo)"));
        assert!(matches!(tokens[4], Token::Parenthetical(p) if p.inner == "Hilo"));
    }

    #[test]
    fn test_repeated_relations_are_all_reported() {
        let stream = tokenize("[扩展][A][!B][!C][>D][<E][<F]正文");
        let relations: Vec<_> = stream.relations().collect();
        assert_eq!(
            relations,
            vec![
                (Relation::Exclusion, "B"),
                (Relation::Exclusion, "C"),
                (Relation::Replacement, "D"),
                (Relation::Prerequisite, "E"),
                (Relation::Prerequisite, "F"),
            ]
        );
    }

    #[test]
    fn test_relations_anywhere_in_name() {
        let stream = tokenize("[扩展][A]正文[!B]尾巴");
        assert_eq!(stream.relations().collect::<Vec<_>>(), vec![(Relation::Exclusion, "B")]);
    }

    #[test]
    fn test_marked_key_is_still_key_and_relation() {
        let stream = tokenize("[扩展][!A]正文");
        assert_eq!(stream.grouping_key(), Some("[扩展][!A]"));
        assert_eq!(stream.relations().collect::<Vec<_>>(), vec![(Relation::Exclusion, "A")]);
    }

    #[test]
    fn test_key_must_follow_prefix_directly() {
        let stream = tokenize("[事件]正文[双子]");
        assert_eq!(stream.grouping_key(), None);
        assert!(stream.tokens().contains(&Token::Segment("双子")));
    }

    #[test]
    fn test_empty_bracket_is_text() {
        let stream = tokenize("[事件][]正文");
        assert_eq!(stream.grouping_key(), None);
        assert_eq!(stream.tokens()[1], Token::Text("[]正文"));
    }

    #[test]
    fn test_bare_marker_is_segment() {
        let stream = tokenize("[扩展][A][!]x");
        assert_eq!(stream.relations().count(), 0);
        assert!(stream.tokens().contains(&Token::Segment("!")));
    }

    #[test]
    fn test_bracket_inside_key_belongs_to_key() {
        let stream = tokenize("[扩展][a[b]正文");
        assert_eq!(stream.grouping_key(), Some("[扩展][a[b]"));
        assert_eq!(stream.key_label(), Some("a[b"));
        assert_eq!(stream.tokens()[2], Token::Text("正文"));
    }

    #[test]
    fn test_relation_target_may_contain_bracket() {
        let stream = tokenize("[扩展][X][!a[b]正文");
        assert_eq!(stream.relations().collect::<Vec<_>>(), vec![(Relation::Exclusion, "a[b")]);
    }

    #[test]
    fn test_nested_marker_is_reported_once_per_kind() {
        let stream = tokenize("[扩展][X][a[!b][!c[>d[!e]正文");
        assert_eq!(
            stream.relations().collect::<Vec<_>>(),
            vec![
                (Relation::Exclusion, "b"),
                (Relation::Exclusion, "c[>d[!e"),
                (Relation::Replacement, "d[!e"),
            ]
        );
    }

    #[test]
    fn test_unclosed_bracket_is_text() {
        let stream = tokenize("[事件][双子]正文[未闭合");
        assert_eq!(stream.grouping_key(), Some("[事件][双子]"));
        assert_eq!(stream.tokens().last(), Some(&Token::Text("正文[未闭合")));
    }

    #[test]
    fn test_trailing_parenthetical_allows_plain_text_after() {
        let stream = tokenize("[事件][双子]本体(作者-信息)尾注");
        let paren = stream.parenthetical().unwrap();
        assert_eq!(paren.inner, "作者-信息");
        assert!(!paren.is_terminal(stream.name()));
    }

    #[test]
    fn test_trailing_parenthetical_rejected_when_parens_follow() {
        let stream = tokenize("[事件][双子]本体(作者)尾(注");
        assert_eq!(stream.parenthetical(), None);
    }

    #[test]
    fn test_last_parenthetical_wins() {
        let stream = tokenize("[事件][双子](旧)本体(新)");
        assert_eq!(stream.parenthetical().unwrap().inner, "新");
    }

    #[test]
    fn test_character_label_needs_a_character() {
        let stream = tokenize("[角色](A)");
        assert_eq!(stream.parenthetical(), None);
    }

    #[test]
    fn test_uncategorized_names_still_tokenize() {
        let stream = tokenize("plain]text[with(odd)");
        assert_eq!(stream.category(), None);
        assert_eq!(stream.body(), "plain]text[with(odd)");
        assert_eq!(stream.parenthetical().unwrap().inner, "odd");
    }
}
