#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    node_type: NodeType,
    children: Vec<Node>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeType {
    Element {
        tag_name: String,
        attributes: Vec<Attribute>,
    },
    Text(String),
    Comment(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

pub struct DomTree {
    root: Option<Node>,
}

impl Node {
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            children: Vec::new(),
        }
    }

    pub fn element(tag_name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self::new(NodeType::Element {
            tag_name: tag_name.into(),
            attributes,
        })
    }

    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn node_type(&self) -> &NodeType {
        &self.node_type
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Tag name of this node, or `None` for text and comment nodes.
    pub fn tag_name(&self) -> Option<&str> {
        match &self.node_type {
            NodeType::Element { tag_name, .. } => Some(tag_name),
            _ => None,
        }
    }

    /// Value of the first attribute with the given name, if any.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match &self.node_type {
            NodeType::Element { attributes, .. } => attributes
                .iter()
                .find(|attr| attr.name == name)
                .map(|attr| attr.value.as_str()),
            _ => None,
        }
    }

    /// Concatenated text content of this node and all of its descendants,
    /// in document order. Entities are already decoded at parse time.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match &self.node_type {
            NodeType::Text(content) => out.push_str(content),
            NodeType::Element { .. } => {
                for child in &self.children {
                    child.collect_text(out);
                }
            }
            NodeType::Comment(_) => {}
        }
    }

    /// Serialize this subtree back to markup.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match &self.node_type {
            NodeType::Element {
                tag_name,
                attributes,
            } => {
                out.push('<');
                out.push_str(tag_name);
                for attr in attributes {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    out.push_str(&escape(&attr.value));
                    out.push('"');
                }
                out.push('>');
                for child in &self.children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(tag_name);
                out.push('>');
            }
            NodeType::Text(content) => out.push_str(&escape(content)),
            NodeType::Comment(content) => {
                out.push_str("<!--");
                out.push_str(content);
                out.push_str("-->");
            }
        }
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

impl DomTree {
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn set_root(&mut self, node: Node) {
        self.root = Some(node);
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        let mut li = Node::element(
            "li",
            vec![Attribute {
                name: "class".to_string(),
                value: "item first".to_string(),
            }],
        );
        li.add_child(Node::new(NodeType::Text("Hello ".to_string())));
        let mut em = Node::element("em", Vec::new());
        em.add_child(Node::new(NodeType::Text("world".to_string())));
        li.add_child(em);
        li
    }

    #[test]
    fn text_concatenates_descendants_in_order() {
        assert_eq!(sample().text(), "Hello world");
    }

    #[test]
    fn attribute_lookup() {
        let node = sample();
        assert_eq!(node.attribute("class"), Some("item first"));
        assert_eq!(node.attribute("id"), None);
        assert_eq!(node.tag_name(), Some("li"));
    }

    #[test]
    fn serializes_back_to_markup() {
        assert_eq!(
            sample().to_html(),
            "<li class=\"item first\">Hello <em>world</em></li>"
        );
    }

    #[test]
    fn text_skips_comments() {
        let mut node = Node::element("p", Vec::new());
        node.add_child(Node::new(NodeType::Comment("nope".to_string())));
        node.add_child(Node::new(NodeType::Text("yes".to_string())));
        assert_eq!(node.text(), "yes");
    }
}
