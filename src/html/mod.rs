pub mod entities;
pub mod parser;
pub mod tokenizer;

pub use parser::Parser;
pub use tokenizer::{Token, Tokenizer};

use crate::dom::DomTree;

/// Parse markup into a document tree rooted at a synthetic `#document` node.
pub fn parse(html: &str) -> DomTree {
    Parser::new(html).parse()
}
