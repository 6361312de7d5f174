//! Extraction recipes: a named, ordered set of selectors applied to a parsed
//! document, producing records ready for export.

pub mod json;
pub mod text;

pub use text::TextOptions;

use crate::dom::Node;
use crate::selector::{Pattern, SelectorError};
use log::debug;
use std::fmt;

type RenderFn = Box<dyn Fn(&Node) -> String + Send + Sync>;

enum Render {
    /// Concatenated text content of the matched node.
    Text,
    /// The matched node serialized back to markup.
    Html,
    /// Caller-supplied rendering.
    Custom(RenderFn),
}

struct Field {
    key: String,
    pattern: Pattern,
    render: Render,
}

/// A reusable description of what to pull out of a page.
///
/// Each field pairs a key with a compiled selector; extracting runs every
/// selector against a root node and collects the rendered matches in
/// document order. Selector errors surface while building the recipe, never
/// during extraction.
pub struct Recipe {
    name: String,
    fields: Vec<Field>,
}

impl Recipe {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a field rendered as the matched node's text.
    pub fn field(self, key: impl Into<String>, selector: &str) -> Result<Self, SelectorError> {
        self.push_field(key.into(), selector, Render::Text)
    }

    /// Add a field rendered as the matched node's outer markup.
    pub fn field_html(
        self,
        key: impl Into<String>,
        selector: &str,
    ) -> Result<Self, SelectorError> {
        self.push_field(key.into(), selector, Render::Html)
    }

    /// Add a field with a caller-supplied rendering.
    pub fn field_with(
        self,
        key: impl Into<String>,
        selector: &str,
        render: impl Fn(&Node) -> String + Send + Sync + 'static,
    ) -> Result<Self, SelectorError> {
        self.push_field(key.into(), selector, Render::Custom(Box::new(render)))
    }

    fn push_field(
        mut self,
        key: String,
        selector: &str,
        render: Render,
    ) -> Result<Self, SelectorError> {
        let pattern = Pattern::compile(selector)?;
        self.fields.push(Field {
            key,
            pattern,
            render,
        });
        Ok(self)
    }

    /// Run every field's selector against `root`.
    pub fn extract(&self, root: &Node) -> Record {
        let fields = self
            .fields
            .iter()
            .map(|field| {
                let values: Vec<String> = field
                    .pattern
                    .matches(root)
                    .map(|node| match &field.render {
                        Render::Text => node.text(),
                        Render::Html => node.to_html(),
                        Render::Custom(render) => render(node),
                    })
                    .collect();
                debug!(target: "extract", "{}.{}: {} match(es)",
                    self.name, field.key, values.len());
                (field.key.clone(), values)
            })
            .collect();
        Record { fields }
    }

    pub fn extract_all<'dom>(&self, roots: impl IntoIterator<Item = &'dom Node>) -> Vec<Record> {
        roots.into_iter().map(|root| self.extract(root)).collect()
    }
}

/// One extracted item: field key to rendered matches, in recipe order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, Vec<String>)>,
}

impl Record {
    pub fn fields(&self) -> &[(String, Vec<String>)] {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|(field_key, _)| field_key == key)
            .map(|(_, values)| values.as_slice())
    }
}

#[derive(Debug)]
pub enum ExtractError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::error::Error for ExtractError {}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::Io(e) => write!(f, "Export I/O error: {}", e),
            ExtractError::Json(e) => write!(f, "Export JSON error: {}", e),
        }
    }
}

impl From<std::io::Error> for ExtractError {
    fn from(e: std::io::Error) -> Self {
        ExtractError::Io(e)
    }
}

impl From<serde_json::Error> for ExtractError {
    fn from(e: serde_json::Error) -> Self {
        ExtractError::Json(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html;

    const PAGE: &str = "<div class=\"book\"><h2>Dune</h2>\
        <span class=\"price\">9.99</span></div>\
        <div class=\"book\"><h2>Solaris</h2>\
        <span class=\"price\">7.50</span></div>";

    #[test]
    fn extracts_fields_in_document_order() {
        let tree = html::parse(PAGE);
        let root = tree.root().expect("root");
        let recipe = Recipe::new("books")
            .field("title", ".book h2")
            .and_then(|r| r.field("price", "span.price"))
            .expect("selectors compile");

        let record = recipe.extract(root);
        assert_eq!(
            record.get("title").map(<[String]>::to_vec),
            Some(vec!["Dune".to_string(), "Solaris".to_string()])
        );
        assert_eq!(
            record.get("price").map(<[String]>::to_vec),
            Some(vec!["9.99".to_string(), "7.50".to_string()])
        );
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn html_rendering_keeps_markup() {
        let tree = html::parse("<p><em>x</em></p>");
        let root = tree.root().expect("root");
        let recipe = Recipe::new("raw")
            .field_html("para", "p")
            .expect("selector compiles");
        let record = recipe.extract(root);
        assert_eq!(
            record.get("para").map(<[String]>::to_vec),
            Some(vec!["<p><em>x</em></p>".to_string()])
        );
    }

    #[test]
    fn custom_rendering_sees_the_node() {
        let tree = html::parse(PAGE);
        let root = tree.root().expect("root");
        let recipe = Recipe::new("shout")
            .field_with("title", ".book h2", |node| node.text().to_uppercase())
            .expect("selector compiles");
        let record = recipe.extract(root);
        assert_eq!(
            record.get("title").map(<[String]>::to_vec),
            Some(vec!["DUNE".to_string(), "SOLARIS".to_string()])
        );
    }

    #[test]
    fn bad_selectors_fail_at_build_time() {
        assert!(Recipe::new("broken").field("x", "???").is_err());
    }

    #[test]
    fn extract_all_produces_one_record_per_root() {
        let tree = html::parse(PAGE);
        let root = tree.root().expect("root");
        let books: Vec<&crate::dom::Node> = crate::selector::Pattern::compile(".book")
            .expect("compiles")
            .matches(root)
            .collect();
        let recipe = Recipe::new("books")
            .field("title", "h2")
            .expect("selector compiles");
        let records = recipe.extract_all(books);
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[1].get("title").map(<[String]>::to_vec),
            Some(vec!["Solaris".to_string()])
        );
    }
}
