//! Query string compiler.
//!
//! ```text
//! query  := and ('OR' and)*
//! and    := term (('AND')? term)*
//! term   := '"' words '"' | word '*' | word '~' digits | word
//! ```
//!
//! `AND` and `OR` are operators only when written in upper case. Words are
//! split with the same tokenizer the index uses, so `foo-bar` is the phrase
//! `"foo bar"`. A query that is exactly one bare word is matched fuzzily.

use crate::error::{SearchError, SearchResult};
use crate::utils::tokenize_query;
use tracing::debug;

/// Largest edit distance a fuzzy term may ask for; larger requests are clamped
pub const MAX_FUZZY_DISTANCE: u8 = 2;

/// Distance given to a lone bare word
pub const AUTO_FUZZY_DISTANCE: u8 = 2;

/// Query AST node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryNode {
    /// A single normalized word
    Term {
        text: String,
        /// Maximum edit distance, `None` for exact
        fuzzy: Option<u8>,
        /// Match every indexed word starting with `text`
        prefix: bool,
    },
    /// Words at consecutive positions
    Phrase(Vec<String>),
    And(Box<QueryNode>, Box<QueryNode>),
    Or(Box<QueryNode>, Box<QueryNode>),
}

impl QueryNode {
    pub fn exact(text: impl Into<String>) -> Self {
        QueryNode::Term {
            text: text.into(),
            fuzzy: None,
            prefix: false,
        }
    }

    pub fn fuzzy(text: impl Into<String>, distance: u8) -> Self {
        QueryNode::Term {
            text: text.into(),
            fuzzy: Some(distance),
            prefix: false,
        }
    }

    pub fn prefix(text: impl Into<String>) -> Self {
        QueryNode::Term {
            text: text.into(),
            fuzzy: None,
            prefix: true,
        }
    }

    pub fn and(left: QueryNode, right: QueryNode) -> Self {
        QueryNode::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: QueryNode, right: QueryNode) -> Self {
        QueryNode::Or(Box::new(left), Box::new(right))
    }
}

/// Compile a query string into exactly one tree
pub fn compile(input: &str) -> SearchResult<QueryNode> {
    if input.trim().is_empty() {
        return Err(SearchError::query_syntax(input, "empty query"));
    }

    let items = Lexer::new(input).run()?;

    // A lone bare word is promoted to a fuzzy match
    if let [Item::Word(raw)] = items.as_slice() {
        if let Some(word) = bare_word(raw) {
            let node = QueryNode::fuzzy(word, AUTO_FUZZY_DISTANCE);
            debug!(query = input, ?node, "compiled query (auto-fuzzy)");
            return Ok(node);
        }
    }

    let mut parser = QueryParser { items, pos: 0 };
    let node = parser.parse_or()?;
    if let Some(item) = parser.items.get(parser.pos) {
        return Err(SearchError::query_syntax(item.fragment(), "unexpected input"));
    }

    debug!(query = input, ?node, "compiled query");
    Ok(node)
}

/// Lexical unit of a query
#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Word(String),
    /// Text between a pair of double quotes
    Quoted(String),
    And,
    Or,
}

impl Item {
    fn fragment(&self) -> String {
        match self {
            Item::Word(raw) => raw.clone(),
            Item::Quoted(inner) => format!("\"{}\"", inner),
            Item::And => "AND".to_string(),
            Item::Or => "OR".to_string(),
        }
    }

    fn is_operator(&self) -> bool {
        matches!(self, Item::And | Item::Or)
    }
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn run(mut self) -> SearchResult<Vec<Item>> {
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek_char() {
                None => break,
                Some('"') => items.push(self.quoted()?),
                Some(_) => {
                    let raw = self.word();
                    items.push(match raw {
                        "AND" => Item::And,
                        "OR" => Item::Or,
                        _ => Item::Word(raw.to_string()),
                    });
                }
            }
        }
        Ok(items)
    }

    fn quoted(&mut self) -> SearchResult<Item> {
        let start = self.pos;
        self.advance();
        let body_start = self.pos;
        match self.remaining().find('"') {
            Some(len) => {
                let inner = &self.input[body_start..body_start + len];
                self.pos = body_start + len + 1;
                Ok(Item::Quoted(inner.to_string()))
            }
            None => Err(SearchError::query_syntax(
                &self.input[start..],
                "unbalanced quote",
            )),
        }
    }

    fn word(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() || ch == '"' {
                break;
            }
            self.advance();
        }
        &self.input[start..self.pos]
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }
}

struct QueryParser {
    items: Vec<Item>,
    pos: usize,
}

impl QueryParser {
    fn parse_or(&mut self) -> SearchResult<QueryNode> {
        let mut node = self.parse_and()?;
        while self.peek() == Some(&Item::Or) {
            self.pos += 1;
            let right = self.parse_and()?;
            node = QueryNode::or(node, right);
        }
        Ok(node)
    }

    fn parse_and(&mut self) -> SearchResult<QueryNode> {
        let mut node = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Item::And) => {
                    self.pos += 1;
                    let right = self.parse_term()?;
                    node = QueryNode::and(node, right);
                }
                // Adjacent terms are an implicit AND
                Some(Item::Word(_) | Item::Quoted(_)) => {
                    let right = self.parse_term()?;
                    node = QueryNode::and(node, right);
                }
                Some(Item::Or) | None => return Ok(node),
            }
        }
    }

    fn parse_term(&mut self) -> SearchResult<QueryNode> {
        let Some(item) = self.items.get(self.pos).cloned() else {
            let last = self.items.last().map(Item::fragment).unwrap_or_default();
            return Err(SearchError::query_syntax(last, "operator without a right operand"));
        };

        match item {
            Item::Quoted(inner) => {
                self.pos += 1;
                phrase(&inner)
            }
            Item::Word(raw) => {
                self.pos += 1;
                word_term(&raw)
            }
            Item::And | Item::Or => {
                let message = match self.pos.checked_sub(1).and_then(|i| self.items.get(i)) {
                    Some(prev) if prev.is_operator() => "doubled operator",
                    _ => "operator without a left operand",
                };
                Err(SearchError::query_syntax(item.fragment(), message))
            }
        }
    }

    fn peek(&self) -> Option<&Item> {
        self.items.get(self.pos)
    }
}

fn phrase(inner: &str) -> SearchResult<QueryNode> {
    let fragment = format!("\"{}\"", inner);
    if inner.trim().is_empty() {
        return Err(SearchError::query_syntax(fragment, "empty phrase"));
    }
    let words = tokenize_query(inner);
    if words.is_empty() {
        return Err(SearchError::query_syntax(fragment, "no searchable word"));
    }
    Ok(QueryNode::Phrase(words))
}

/// The single word of `raw` if it is a plain word with no operators
fn bare_word(raw: &str) -> Option<String> {
    if raw.contains('~') || raw.ends_with('*') {
        return None;
    }
    let mut words = tokenize_query(raw);
    if words.len() == 1 { words.pop() } else { None }
}

fn word_term(raw: &str) -> SearchResult<QueryNode> {
    if let Some(tilde) = raw.find('~') {
        let (operand, digits) = (&raw[..tilde], &raw[tilde + 1..]);
        if operand.contains('*') || digits.contains('*') {
            return Err(SearchError::query_syntax(raw, "cannot combine '*' and '~'"));
        }
        if digits.is_empty() {
            return Err(SearchError::query_syntax(raw, "'~' must be followed by a distance"));
        }
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(SearchError::query_syntax(raw, "fuzzy distance must be a number"));
        }
        // Every digit string is valid; anything past the maximum clamps
        let distance = digits
            .parse::<u32>()
            .map_or(MAX_FUZZY_DISTANCE, |d| d.min(MAX_FUZZY_DISTANCE as u32) as u8);
        return Ok(QueryNode::fuzzy(single_word(raw, operand)?, distance));
    }

    if let Some(operand) = raw.strip_suffix('*') {
        return Ok(QueryNode::prefix(single_word(raw, operand)?));
    }

    let mut words = tokenize_query(raw);
    match words.len() {
        0 => Err(SearchError::query_syntax(raw, "no searchable word")),
        1 => Ok(QueryNode::exact(words.remove(0))),
        _ => Ok(QueryNode::Phrase(words)),
    }
}

fn single_word(raw: &str, operand: &str) -> SearchResult<String> {
    let mut words = tokenize_query(operand);
    match words.len() {
        1 => Ok(words.remove(0)),
        0 => Err(SearchError::query_syntax(raw, "operator needs a word")),
        _ => Err(SearchError::query_syntax(raw, "operator applies to a single word only")),
    }
}
