use super::entities::decode_entities;
use crate::dom::Attribute;
use log::debug;

#[derive(Debug, PartialEq)]
pub enum Token {
    StartTag {
        name: String,
        attributes: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
    Text(String),
    Comment(String),
    Doctype(String),
}

/// Hand-rolled markup tokenizer. Tag and attribute names are lowercased and
/// attribute values are entity-decoded on the way out, so the tree builder
/// works on normalized data.
pub struct Tokenizer {
    input: Vec<char>,
    position: usize,
    pending_raw_text: Option<String>,
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            pending_raw_text: None,
        }
    }

    pub fn next_token(&mut self) -> Option<Token> {
        // Raw text captured after a <script>/<style> start tag comes first.
        if let Some(text) = self.pending_raw_text.take() {
            return Some(Token::Text(text));
        }

        if self.eof() {
            return None;
        }

        if self.current() == '<' {
            self.position += 1;
            match self.peek() {
                Some('!') => {
                    self.position += 1;
                    Some(self.consume_markup_declaration())
                }
                Some('/') => {
                    self.position += 1;
                    Some(self.consume_end_tag())
                }
                Some(ch) if ch.is_ascii_alphabetic() => Some(self.consume_start_tag()),
                // A stray '<' is literal text.
                _ => Some(Token::Text("<".to_string())),
            }
        } else {
            Some(self.consume_text())
        }
    }

    fn consume_start_tag(&mut self) -> Token {
        let name = self.consume_tag_name();
        let mut attributes = Vec::new();
        let mut self_closing = false;

        loop {
            self.consume_whitespace();
            match self.peek() {
                None | Some('>') => break,
                Some('/') => {
                    self.position += 1;
                    self_closing = true;
                }
                _ => {
                    if let Some(attr) = self.consume_attribute() {
                        attributes.push(attr);
                    }
                }
            }
        }
        if !self.eof() {
            self.position += 1; // '>'
        }

        // <script> and <style> bodies are raw text: no tags, no entities.
        if matches!(name.as_str(), "script" | "style") && !self_closing {
            let raw = self.consume_raw_text(&name);
            if !raw.is_empty() {
                self.pending_raw_text = Some(raw);
            }
        }

        debug!(target: "html", "start tag <{}> with {} attributes", name, attributes.len());
        Token::StartTag {
            name,
            attributes,
            self_closing,
        }
    }

    fn consume_end_tag(&mut self) -> Token {
        let name = self.consume_tag_name();
        while !self.eof() && self.current() != '>' {
            self.position += 1;
        }
        if !self.eof() {
            self.position += 1;
        }
        Token::EndTag { name }
    }

    fn consume_tag_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || ch == '>' || ch == '/' {
                break;
            }
            name.push(ch.to_ascii_lowercase());
            self.position += 1;
        }
        name
    }

    fn consume_attribute(&mut self) -> Option<Attribute> {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || ch == '=' || ch == '>' || ch == '/' {
                break;
            }
            name.push(ch.to_ascii_lowercase());
            self.position += 1;
        }
        if name.is_empty() {
            // Swallow one bogus character so the scan always advances.
            self.position += 1;
            return None;
        }

        self.consume_whitespace();
        let value = if self.peek() == Some('=') {
            self.position += 1;
            self.consume_whitespace();
            self.consume_attribute_value()
        } else {
            String::new() // bare attribute, e.g. <input disabled>
        };

        Some(Attribute {
            name,
            value: decode_entities(&value),
        })
    }

    fn consume_attribute_value(&mut self) -> String {
        let mut value = String::new();
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.position += 1;
                while let Some(ch) = self.peek() {
                    self.position += 1;
                    if ch == quote {
                        break;
                    }
                    value.push(ch);
                }
            }
            _ => {
                while let Some(ch) = self.peek() {
                    if ch.is_whitespace() || ch == '>' {
                        break;
                    }
                    value.push(ch);
                    self.position += 1;
                }
            }
        }
        value
    }

    fn consume_text(&mut self) -> Token {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch == '<' {
                break;
            }
            text.push(ch);
            self.position += 1;
        }
        Token::Text(text)
    }

    /// Everything up to the matching close tag, consumed verbatim.
    fn consume_raw_text(&mut self, tag_name: &str) -> String {
        let close = format!("</{}", tag_name);
        let mut raw = String::new();

        while !self.eof() {
            if self.current() == '<' && self.lookahead_matches(&close) {
                break;
            }
            raw.push(self.current());
            self.position += 1;
        }
        raw
    }

    fn lookahead_matches(&self, prefix: &str) -> bool {
        prefix
            .chars()
            .enumerate()
            .all(|(offset, expected)| {
                self.input
                    .get(self.position + offset)
                    .is_some_and(|ch| ch.to_ascii_lowercase() == expected)
            })
    }

    fn consume_markup_declaration(&mut self) -> Token {
        if self.lookahead_matches("--") {
            self.position += 2;
            return self.consume_comment();
        }

        // Doctype or other declaration: take everything up to '>'.
        let mut content = String::new();
        while !self.eof() && self.current() != '>' {
            content.push(self.current());
            self.position += 1;
        }
        if !self.eof() {
            self.position += 1;
        }
        Token::Doctype(content)
    }

    fn consume_comment(&mut self) -> Token {
        let mut content = String::new();
        while !self.eof() {
            if self.current() == '-' && self.lookahead_matches("-->") {
                self.position += 3;
                break;
            }
            content.push(self.current());
            self.position += 1;
        }
        Token::Comment(content)
    }

    fn consume_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
    }

    fn current(&self) -> char {
        self.input[self.position]
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn eof(&self) -> bool {
        self.position >= self.input.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        let mut tokenizer = Tokenizer::new(input);
        let mut out = Vec::new();
        while let Some(token) = tokenizer.next_token() {
            out.push(token);
        }
        out
    }

    #[test]
    fn tag_names_are_lowercased() {
        let out = tokens("<DIV><P></P></DIV>");
        assert_eq!(
            out,
            vec![
                Token::StartTag {
                    name: "div".to_string(),
                    attributes: Vec::new(),
                    self_closing: false,
                },
                Token::StartTag {
                    name: "p".to_string(),
                    attributes: Vec::new(),
                    self_closing: false,
                },
                Token::EndTag {
                    name: "p".to_string()
                },
                Token::EndTag {
                    name: "div".to_string()
                },
            ]
        );
    }

    #[test]
    fn attributes_in_all_three_forms() {
        let out = tokens("<input type=\"text\" name=q disabled>");
        let Token::StartTag { attributes, .. } = &out[0] else {
            panic!("expected a start tag, got {:?}", out[0]);
        };
        assert_eq!(attributes.len(), 3);
        assert_eq!(attributes[0].name, "type");
        assert_eq!(attributes[0].value, "text");
        assert_eq!(attributes[1].name, "name");
        assert_eq!(attributes[1].value, "q");
        assert_eq!(attributes[2].name, "disabled");
        assert_eq!(attributes[2].value, "");
    }

    #[test]
    fn attribute_values_are_entity_decoded() {
        let out = tokens("<a title=\"fish &amp; chips\">");
        let Token::StartTag { attributes, .. } = &out[0] else {
            panic!("expected a start tag");
        };
        assert_eq!(attributes[0].value, "fish & chips");
    }

    #[test]
    fn script_bodies_are_raw_text() {
        let out = tokens("<script>if (a < b) { go(); }</script>");
        assert_eq!(
            out[1],
            Token::Text("if (a < b) { go(); }".to_string())
        );
        assert_eq!(
            out[2],
            Token::EndTag {
                name: "script".to_string()
            }
        );
    }

    #[test]
    fn comments_and_doctype() {
        let out = tokens("<!DOCTYPE html><!-- hi --><p>x</p>");
        assert_eq!(out[0], Token::Doctype("DOCTYPE html".to_string()));
        assert_eq!(out[1], Token::Comment(" hi ".to_string()));
    }
}
