use super::{AttrConstraint, MatchSpec, SelectorError};
use std::collections::HashMap;

/// Parse a whole selector string into its ordered segment specs.
///
/// Segments are separated by whitespace runs. A bare `>` token is a
/// combinator: it produces no spec of its own and restricts the following
/// segment to direct children.
pub(super) fn parse(selector: &str) -> Result<Vec<MatchSpec>, SelectorError> {
    let mut specs = Vec::new();
    let mut child_only = false;

    for (offset, token) in split_tokens(selector) {
        if token == ">" {
            child_only = true;
            continue;
        }
        let recursive = !child_only;
        child_only = false;
        specs.push(parse_segment(token, offset, recursive)?);
    }

    if specs.is_empty() {
        // Nothing but whitespace and combinators; a chain must have at
        // least one segment to be runnable.
        return Err(SelectorError::Syntax { offset: 0 });
    }
    Ok(specs)
}

/// Whitespace-split tokens together with their byte offsets in the input.
fn split_tokens(input: &str) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (idx, ch) in input.char_indices() {
        if ch.is_whitespace() {
            if let Some(from) = start.take() {
                tokens.push((from, &input[from..idx]));
            }
        } else if start.is_none() {
            start = Some(idx);
        }
    }
    if let Some(from) = start {
        tokens.push((from, &input[from..]));
    }
    tokens
}

enum SubToken {
    Attr { key: String, value: Option<String> },
    Class(String),
    Id(String),
    Name(String),
    Rank(usize),
}

/// Scan one segment, greedily consuming sub-tokens until the segment is
/// exhausted. Any position no grammar accepts fails the whole compilation.
fn parse_segment(
    segment: &str,
    base: usize,
    recursive: bool,
) -> Result<MatchSpec, SelectorError> {
    let mut spec = MatchSpec {
        name: None,
        attrs: HashMap::new(),
        rank: None,
        recursive,
    };

    let mut pos = 0;
    while pos < segment.len() {
        let (next, token) = scan_sub_token(segment, pos).ok_or(SelectorError::Syntax {
            offset: base + pos,
        })?;
        apply(&mut spec, token);
        pos = next;
    }
    Ok(spec)
}

/// The five sub-token grammars, tried in fixed precedence order.
fn scan_sub_token(segment: &str, pos: usize) -> Option<(usize, SubToken)> {
    scan_attr(segment, pos)
        .or_else(|| scan_class(segment, pos))
        .or_else(|| scan_id(segment, pos))
        .or_else(|| scan_name(segment, pos))
        .or_else(|| scan_rank(segment, pos))
}

fn apply(spec: &mut MatchSpec, token: SubToken) {
    match token {
        SubToken::Attr { key, value } => {
            let constraint = match value {
                Some(value) => AttrConstraint::Equals(value),
                None => AttrConstraint::Presence,
            };
            spec.attrs.insert(key, constraint);
        }
        SubToken::Class(class) => match spec.attrs.get_mut("class") {
            // Class tokens accumulate; everything else on the `class` key
            // is displaced by the first one.
            Some(AttrConstraint::ClassSet(classes)) => classes.push(class),
            _ => {
                spec.attrs
                    .insert("class".to_string(), AttrConstraint::ClassSet(vec![class]));
            }
        },
        SubToken::Id(id) => {
            // Last id wins, as does a later bracket constraint on `id`.
            spec.attrs
                .insert("id".to_string(), AttrConstraint::Equals(id));
        }
        SubToken::Name(name) => spec.name = Some(name),
        SubToken::Rank(rank) => spec.rank = Some(rank),
    }
}

fn is_word(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '-'
}

/// End of the word-character run starting at `start` (which may be empty).
fn word_end(segment: &str, start: usize) -> usize {
    segment[start..]
        .char_indices()
        .find(|(_, ch)| !is_word(*ch))
        .map_or(segment.len(), |(idx, _)| start + idx)
}

/// `[key]`, `['key']`, `[key=value]`, `[key='value']` and friends.
/// The key must start with an ASCII letter; a quoted key must close with the
/// same quote. A quoted value runs to the first closing quote that is
/// directly followed by `]`; an unquoted one runs to the first `]`.
fn scan_attr(segment: &str, pos: usize) -> Option<(usize, SubToken)> {
    let mut i = pos;
    if !segment[i..].starts_with('[') {
        return None;
    }
    i += 1;

    let quote = segment[i..]
        .chars()
        .next()
        .filter(|&c| c == '\'' || c == '"');
    if quote.is_some() {
        i += 1;
    }

    if !segment[i..]
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
    {
        return None;
    }
    let key_end = word_end(segment, i);
    let key = &segment[i..key_end];
    i = key_end;

    if let Some(q) = quote {
        if !segment[i..].starts_with(q) {
            return None;
        }
        i += 1;
    }

    let mut value = None;
    if segment[i..].starts_with('=') {
        i += 1;
        let vquote = segment[i..]
            .chars()
            .next()
            .filter(|&c| c == '\'' || c == '"');
        if let Some(q) = vquote {
            i += 1;
            let close = format!("{q}]");
            let rel = segment[i..].find(&close)?;
            if rel == 0 {
                return None;
            }
            value = Some(strip_quotes(&segment[i..i + rel]));
            i += rel + 1;
        } else {
            let rel = segment[i..].find(']')?;
            if rel == 0 {
                return None;
            }
            value = Some(strip_quotes(&segment[i..i + rel]));
            i += rel;
        }
    }

    if !segment[i..].starts_with(']') {
        return None;
    }
    Some((
        i + 1,
        SubToken::Attr {
            key: key.to_string(),
            value,
        },
    ))
}

/// Quote characters (and stray brackets) never survive into a parsed value.
fn strip_quotes(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '\'' | '"' | '[' | ']'))
        .collect()
}

fn scan_class(segment: &str, pos: usize) -> Option<(usize, SubToken)> {
    if !segment[pos..].starts_with('.') {
        return None;
    }
    let start = pos + 1;
    let end = word_end(segment, start);
    if end == start {
        return None;
    }
    Some((end, SubToken::Class(segment[start..end].to_string())))
}

fn scan_id(segment: &str, pos: usize) -> Option<(usize, SubToken)> {
    if !segment[pos..].starts_with('#') {
        return None;
    }
    let start = pos + 1;
    let end = word_end(segment, start);
    if end == start {
        return None;
    }
    Some((end, SubToken::Id(segment[start..end].to_string())))
}

fn scan_name(segment: &str, pos: usize) -> Option<(usize, SubToken)> {
    let end = word_end(segment, pos);
    if end == pos {
        return None;
    }
    Some((end, SubToken::Name(segment[pos..end].to_string())))
}

/// `[n]` with one or more ASCII digits. Tried last, so a bracket that can be
/// read as an attribute constraint never reaches this grammar.
fn scan_rank(segment: &str, pos: usize) -> Option<(usize, SubToken)> {
    if !segment[pos..].starts_with('[') {
        return None;
    }
    let start = pos + 1;
    let end = segment[start..]
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map_or(segment.len(), |(idx, _)| start + idx);
    if end == start || !segment[end..].starts_with(']') {
        return None;
    }
    let rank = segment[start..end].parse().ok()?;
    Some((end + 1, SubToken::Rank(rank)))
}

#[cfg(test)]
mod tests {
    use super::super::{AttrConstraint, Pattern, SelectorError};

    #[test]
    fn one_spec_per_non_combinator_token() {
        let pattern = Pattern::compile("div#main ul.list li[data-id='7']").expect("compiles");
        assert_eq!(pattern.len(), 3);

        let pattern = Pattern::compile("#a > .b").expect("compiles");
        assert_eq!(pattern.len(), 2);
    }

    #[test]
    fn recursive_unless_preceded_by_child_combinator() {
        let specs = Pattern::compile("#a > .b .c").expect("compiles");
        let flags: Vec<bool> = specs.specs().iter().map(|s| s.recursive).collect();
        assert_eq!(flags, vec![true, false, true]);

        // A leading combinator restricts the first segment too.
        let specs = Pattern::compile("> li").expect("compiles");
        assert!(!specs.specs()[0].recursive);
    }

    #[test]
    fn bare_name_and_wildcard() {
        let pattern = Pattern::compile("div .b").expect("compiles");
        assert_eq!(pattern.specs()[0].name.as_deref(), Some("div"));
        assert_eq!(pattern.specs()[1].name, None);
    }

    #[test]
    fn classes_accumulate_into_a_set() {
        let pattern = Pattern::compile("li.x.y").expect("compiles");
        let spec = &pattern.specs()[0];
        assert_eq!(spec.name.as_deref(), Some("li"));
        assert_eq!(
            spec.attrs.get("class"),
            Some(&AttrConstraint::ClassSet(vec![
                "x".to_string(),
                "y".to_string()
            ]))
        );
    }

    #[test]
    fn id_and_name_are_last_wins() {
        let pattern = Pattern::compile("div#a#b").expect("compiles");
        assert_eq!(
            pattern.specs()[0].attrs.get("id"),
            Some(&AttrConstraint::Equals("b".to_string()))
        );

        let pattern = Pattern::compile("div[lang]span").expect("compiles");
        assert_eq!(pattern.specs()[0].name.as_deref(), Some("span"));
    }

    #[test]
    fn attribute_presence_and_equality() {
        let pattern = Pattern::compile("a[href][rel=nofollow]").expect("compiles");
        let spec = &pattern.specs()[0];
        assert_eq!(spec.attrs.get("href"), Some(&AttrConstraint::Presence));
        assert_eq!(
            spec.attrs.get("rel"),
            Some(&AttrConstraint::Equals("nofollow".to_string()))
        );
    }

    #[test]
    fn attribute_values_lose_their_quotes() {
        for selector in ["li[data-id='7']", "li[data-id=\"7\"]", "li[data-id=7]"] {
            let pattern = Pattern::compile(selector).expect("compiles");
            assert_eq!(
                pattern.specs()[0].attrs.get("data-id"),
                Some(&AttrConstraint::Equals("7".to_string())),
                "selector {:?}",
                selector
            );
        }
    }

    #[test]
    fn quoted_keys_are_accepted() {
        let pattern = Pattern::compile("['data-x']").expect("compiles");
        assert_eq!(
            pattern.specs()[0].attrs.get("data-x"),
            Some(&AttrConstraint::Presence)
        );
    }

    #[test]
    fn rank_is_a_zero_based_index_token() {
        let pattern = Pattern::compile("ul li[2]").expect("compiles");
        assert_eq!(pattern.specs()[1].rank, Some(2));
        assert_eq!(pattern.specs()[1].name.as_deref(), Some("li"));

        // A bracket with a leading digit is never an attribute constraint.
        let pattern = Pattern::compile("li[10]").expect("compiles");
        assert_eq!(pattern.specs()[0].rank, Some(10));
    }

    #[test]
    fn malformed_selectors_report_the_failing_offset() {
        assert_eq!(
            Pattern::compile("???"),
            Err(SelectorError::Syntax { offset: 0 })
        );
        assert_eq!(
            Pattern::compile("div ???"),
            Err(SelectorError::Syntax { offset: 4 })
        );
        // The scanner consumed "div" before stalling on the second dot.
        assert_eq!(
            Pattern::compile("div..x"),
            Err(SelectorError::Syntax { offset: 3 })
        );
        // An empty value is not part of the bracket grammar.
        assert_eq!(
            Pattern::compile("li[data-id=]"),
            Err(SelectorError::Syntax { offset: 2 })
        );
        // Unterminated bracket.
        assert_eq!(
            Pattern::compile("li["),
            Err(SelectorError::Syntax { offset: 2 })
        );
    }
}
