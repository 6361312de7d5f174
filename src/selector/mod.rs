//! Compact selector language for locating nodes in a parsed document tree.
//!
//! A selector string is compiled once into a [`Pattern`] (an ordered chain of
//! per-level match specs) and can then be run any number of times against any
//! tree. The grammar covers tag names, `#id`, `.class` (conjunctive), generic
//! `[attr]` / `[attr=value]` constraints, a `>` direct-child combinator and a
//! zero-based `[n]` rank selector.

mod matcher;
mod parser;

pub use matcher::Matches;

use crate::dom::Node;
use std::collections::HashMap;
use std::fmt;
use std::str::Utf8Error;

/// One compiled segment of a selector chain.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchSpec {
    /// Tag-name constraint; `None` matches any element.
    pub name: Option<String>,
    /// Attribute constraints, all of which must hold.
    pub attrs: HashMap<String, AttrConstraint>,
    /// Zero-based index into this level's ordered candidate list.
    pub rank: Option<usize>,
    /// Whether the search spans the whole subtree or direct children only.
    pub recursive: bool,
}

/// A single attribute constraint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrConstraint {
    /// The attribute must exist, with any value.
    Presence,
    /// The attribute must exist and equal this exact string.
    Equals(String),
    /// Every listed class token must appear in the attribute's
    /// whitespace-separated token list.
    ClassSet(Vec<String>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectorError {
    /// No sub-token grammar could consume the selector at this byte offset.
    Syntax { offset: usize },
    /// The selector input was not valid text.
    NotText(Utf8Error),
}

impl std::error::Error for SelectorError {}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorError::Syntax { offset } => {
                write!(f, "illegal selector syntax at offset {}", offset)
            }
            SelectorError::NotText(e) => write!(f, "selector is not valid text: {}", e),
        }
    }
}

/// A compiled selector: a non-empty chain of [`MatchSpec`]s.
///
/// Immutable once built; compile a new string to get a new pattern.
#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    specs: Vec<MatchSpec>,
    raw: String,
}

impl Pattern {
    /// Compile a selector string.
    pub fn compile(selector: &str) -> Result<Self, SelectorError> {
        let specs = parser::parse(selector)?;
        let raw = selector.split_whitespace().collect::<Vec<_>>().join(" ");
        Ok(Self { specs, raw })
    }

    /// Compile a selector supplied as raw bytes, e.g. read from a file.
    pub fn from_utf8(bytes: &[u8]) -> Result<Self, SelectorError> {
        let selector = std::str::from_utf8(bytes).map_err(SelectorError::NotText)?;
        Self::compile(selector)
    }

    pub fn specs(&self) -> &[MatchSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// The selector source with whitespace runs collapsed.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Lazily iterate over every node under `root` matched by this pattern,
    /// in depth-first, left-to-right document order. Running the same pattern
    /// against the same root again reproduces the identical sequence.
    pub fn matches<'p, 'dom>(&'p self, root: &'dom Node) -> Matches<'p, 'dom> {
        Matches::new(self, root)
    }

    /// First match under `root`, without walking the rest of the tree.
    pub fn first<'dom>(&self, root: &'dom Node) -> Option<&'dom Node> {
        self.matches(root).next()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_collapses_whitespace() {
        let pattern = Pattern::compile("div#main \t ul.list\n li").expect("valid selector");
        assert_eq!(pattern.to_string(), "div#main ul.list li");
    }

    #[test]
    fn from_utf8_rejects_non_text() {
        let err = Pattern::from_utf8(&[0xff, 0xfe, b'a']).expect_err("invalid utf-8");
        assert!(matches!(err, SelectorError::NotText(_)));
    }

    #[test]
    fn from_utf8_accepts_text() {
        let pattern = Pattern::from_utf8(b"ul li").expect("valid bytes");
        assert_eq!(pattern.len(), 2);
    }

    #[test]
    fn empty_selector_is_a_syntax_error() {
        for selector in ["", "   ", ">", " > "] {
            assert_eq!(
                Pattern::compile(selector),
                Err(SelectorError::Syntax { offset: 0 }),
                "selector {:?} should not compile",
                selector
            );
        }
    }

    #[test]
    fn segment_count_excludes_combinators() {
        let pattern = Pattern::compile("div #x > .y li[2]").expect("valid selector");
        assert_eq!(pattern.len(), 4);
    }
}
