use super::{AttrConstraint, MatchSpec, Pattern};
use crate::dom::{Node, NodeType};

/// Lazy iterator over the nodes matched by a compiled [`Pattern`].
///
/// Traversal is depth-first and left-to-right, so results arrive in document
/// order. The iterator keeps an explicit stack of per-level frames instead of
/// recursing, which lets a consumer stop after any match without evaluating
/// the rest of the tree. Neither the pattern nor the tree is ever mutated.
pub struct Matches<'p, 'dom> {
    specs: &'p [MatchSpec],
    stack: Vec<Frame<'dom>>,
}

struct Frame<'dom> {
    depth: usize,
    candidates: std::vec::IntoIter<&'dom Node>,
}

impl<'p, 'dom> Matches<'p, 'dom> {
    pub(super) fn new(pattern: &'p Pattern, root: &'dom Node) -> Self {
        let mut matches = Self {
            specs: pattern.specs(),
            stack: Vec::new(),
        };
        if !matches.specs.is_empty() {
            matches.push_frame(root, 0);
        }
        matches
    }

    fn push_frame(&mut self, node: &'dom Node, depth: usize) {
        let spec = &self.specs[depth];
        let mut found = Vec::new();
        find_children(node, spec, &mut found);

        // A ranked segment keeps only the rank-th candidate at this level;
        // an out-of-range rank leaves the branch empty.
        let kept = match spec.rank {
            Some(rank) => found.get(rank).map_or_else(Vec::new, |node| vec![*node]),
            None => found,
        };
        self.stack.push(Frame {
            depth,
            candidates: kept.into_iter(),
        });
    }
}

impl<'dom> Iterator for Matches<'_, 'dom> {
    type Item = &'dom Node;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let depth = frame.depth;
            match frame.candidates.next() {
                None => {
                    self.stack.pop();
                }
                Some(node) if depth + 1 == self.specs.len() => return Some(node),
                Some(node) => self.push_frame(node, depth + 1),
            }
        }
    }
}

/// Collect the children of `node` that satisfy `spec`, in document order.
/// A recursive spec walks the whole subtree (pre-order); otherwise only
/// direct children are considered.
fn find_children<'dom>(node: &'dom Node, spec: &MatchSpec, out: &mut Vec<&'dom Node>) {
    for child in node.children() {
        if node_matches(child, spec) {
            out.push(child);
        }
        if spec.recursive {
            find_children(child, spec, out);
        }
    }
}

fn node_matches(node: &Node, spec: &MatchSpec) -> bool {
    let NodeType::Element { tag_name, .. } = node.node_type() else {
        return false;
    };
    if let Some(name) = &spec.name {
        if name != tag_name {
            return false;
        }
    }
    spec.attrs.iter().all(|(key, constraint)| match constraint {
        AttrConstraint::Presence => node.attribute(key).is_some(),
        AttrConstraint::Equals(expected) => node.attribute(key) == Some(expected.as_str()),
        AttrConstraint::ClassSet(required) => match node.attribute(key) {
            Some(actual) => required
                .iter()
                .all(|class| actual.split_whitespace().any(|token| token == class)),
            None => false,
        },
    })
}
