use super::entities::decode_entities;
use super::tokenizer::{Token, Tokenizer};
use crate::dom::{DomTree, Node, NodeType};
use log::debug;

/// Builds a document tree from a token stream with a stack of open elements.
///
/// The tree is rooted at a synthetic `#document` node so markup with several
/// top-level elements (fragments, or pages without an explicit `<html>`)
/// still forms a single tree.
pub struct Parser {
    tokenizer: Tokenizer,
}

impl Parser {
    pub fn new(html: &str) -> Self {
        Self {
            tokenizer: Tokenizer::new(html),
        }
    }

    pub fn parse(&mut self) -> DomTree {
        let mut dom = DomTree::new();
        let mut stack: Vec<Node> = vec![Node::element("#document", Vec::new())];

        while let Some(token) = self.tokenizer.next_token() {
            match token {
                Token::StartTag {
                    name,
                    attributes,
                    self_closing,
                } => {
                    let node = Node::new(NodeType::Element {
                        tag_name: name.clone(),
                        attributes,
                    });
                    if self_closing || is_void_element(&name) {
                        if let Some(parent) = stack.last_mut() {
                            parent.add_child(node);
                        }
                    } else {
                        stack.push(node);
                    }
                }
                Token::EndTag { name } => {
                    if is_void_element(&name) {
                        continue;
                    }
                    // Pop and attach until the matching start tag closes, or
                    // we hit the document root (recovery for stray end tags).
                    if !stack.iter().any(|node| node.tag_name() == Some(name.as_str())) {
                        debug!(target: "html", "ignoring unmatched end tag </{}>", name);
                        continue;
                    }
                    while stack.len() > 1 {
                        let Some(node) = stack.pop() else {
                            break;
                        };
                        let closed = node.tag_name() == Some(name.as_str());
                        if let Some(parent) = stack.last_mut() {
                            parent.add_child(node);
                        }
                        if closed {
                            break;
                        }
                    }
                }
                Token::Text(content) => {
                    if content.trim().is_empty() {
                        continue;
                    }
                    let decoded = decode_entities(&content);
                    if let Some(parent) = stack.last_mut() {
                        parent.add_child(Node::new(NodeType::Text(decoded)));
                    }
                }
                Token::Comment(content) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.add_child(Node::new(NodeType::Comment(content)));
                    }
                }
                Token::Doctype(_) => {}
            }
        }

        // Close anything still open at end of input.
        while stack.len() > 1 {
            let Some(node) = stack.pop() else {
                break;
            };
            if let Some(parent) = stack.last_mut() {
                parent.add_child(node);
            }
        }

        if let Some(root) = stack.pop() {
            dom.set_root(root);
        }
        dom
    }
}

fn is_void_element(tag_name: &str) -> bool {
    matches!(
        tag_name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Node;

    fn parse(html: &str) -> DomTree {
        Parser::new(html).parse()
    }

    fn first_child<'t>(tree: &'t DomTree) -> &'t Node {
        &tree.root().expect("document root").children()[0]
    }

    #[test]
    fn builds_a_nested_tree() {
        let tree = parse("<div><ul><li>A</li><li>B</li></ul></div>");
        let div = first_child(&tree);
        assert_eq!(div.tag_name(), Some("div"));
        let ul = &div.children()[0];
        assert_eq!(ul.tag_name(), Some("ul"));
        assert_eq!(ul.children().len(), 2);
        assert_eq!(ul.children()[1].text(), "B");
    }

    #[test]
    fn void_elements_do_not_swallow_siblings() {
        let tree = parse("<p>a<br>b</p>");
        let p = first_child(&tree);
        assert_eq!(p.children().len(), 3);
        assert_eq!(p.text(), "ab");
    }

    #[test]
    fn recovers_from_mismatched_end_tags() {
        let tree = parse("<div><p>one</div><p>two</p>");
        let root = tree.root().expect("root");
        // The open <p> is attached when its ancestor closes, and parsing
        // continues at the document level.
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.children()[0].tag_name(), Some("div"));
        assert_eq!(root.children()[1].text(), "two");
    }

    #[test]
    fn unmatched_end_tags_are_ignored() {
        let tree = parse("</table><p>ok</p>");
        let root = tree.root().expect("root");
        assert_eq!(root.children().len(), 1);
        assert_eq!(root.children()[0].text(), "ok");
    }

    #[test]
    fn text_is_entity_decoded_and_whitespace_runs_dropped() {
        let tree = parse("<p>a &amp; b</p>   <p>c</p>");
        let root = tree.root().expect("root");
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.children()[0].text(), "a & b");
    }

    #[test]
    fn keeps_comments_as_nodes() {
        let tree = parse("<div><!-- note --></div>");
        let div = first_child(&tree);
        assert_eq!(
            div.children()[0].node_type(),
            &crate::dom::NodeType::Comment(" note ".to_string())
        );
    }
}
