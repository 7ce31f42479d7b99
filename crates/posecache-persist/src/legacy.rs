//! Import of cache files written by the earlier script revisions.
//!
//! Those files hold a single literal in the scripting language's repr
//! syntax, either a bare dict
//!
//! ```text
//! {'Armature': {'Hands': ['hand.L', 'hand.R']}, 'Prop': {}}
//! ```
//!
//! with no order index (the dict's textual key order is the display order),
//! or a 2-tuple `({...caches...}, {...order...})`. The literal is parsed by
//! the small recursive-descent parser below; nothing is ever evaluated.
//! Only strings, lists, tuples, and dicts are accepted.

use std::collections::BTreeMap;

use posecache_store::{CacheMap, OrderMap, Snapshot};
use posecache_types::{BoneName, CacheName, SkeletonId};
use thiserror::Error;

/// Errors from parsing or interpreting a legacy literal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LegacyError {
    /// The text is not a well-formed literal.
    #[error("syntax error at offset {offset}: {reason}")]
    Syntax { offset: usize, reason: String },

    /// The literal parsed, but is not a cache mapping.
    #[error("unexpected literal shape: {0}")]
    Shape(String),
}

type Result<T> = std::result::Result<T, LegacyError>;

/// A parsed literal value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Literal {
    Str(String),
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
    /// Key/value pairs in textual order. Duplicate keys are preserved here.
    Dict(Vec<(Literal, Literal)>),
}

impl Literal {
    fn kind(&self) -> &'static str {
        match self {
            Literal::Str(_) => "string",
            Literal::List(_) => "list",
            Literal::Tuple(_) => "tuple",
            Literal::Dict(_) => "dict",
        }
    }
}

/// Returns `true` if `text` could be a legacy literal.
pub fn looks_like_literal(text: &str) -> bool {
    matches!(text.trim_start().chars().next(), Some('{') | Some('('))
}

/// Parse a complete literal. Trailing non-whitespace is an error.
pub fn parse_literal(text: &str) -> Result<Literal> {
    let mut parser = Parser::new(text);
    let value = parser.value()?;
    parser.skip_whitespace();
    if let Some(c) = parser.peek() {
        return Err(parser.error(format!("unexpected trailing character {c:?}")));
    }
    Ok(value)
}

/// Parse a legacy cache file into a snapshot.
pub fn snapshot_from_legacy(text: &str) -> Result<Snapshot> {
    let snapshot = match parse_literal(text)? {
        Literal::Dict(pairs) => {
            let (caches, order) = caches_from_dict(pairs)?;
            Snapshot::new(caches, order)
        }
        Literal::Tuple(items) | Literal::List(items) if items.len() == 2 => {
            let mut items = items.into_iter();
            let (caches, _) = match items.next() {
                Some(Literal::Dict(pairs)) => caches_from_dict(pairs)?,
                Some(other) => return Err(shape(format!("element 0 is a {}", other.kind()))),
                None => return Err(shape("missing element 0")),
            };
            let order = match items.next() {
                Some(Literal::Dict(pairs)) => order_from_dict(pairs)?,
                Some(other) => return Err(shape(format!("element 1 is a {}", other.kind()))),
                None => return Err(shape("missing element 1")),
            };
            Snapshot::new(caches, order)
        }
        other => {
            return Err(shape(format!(
                "expected a dict or a 2-tuple, found a {}",
                other.kind()
            )))
        }
    };

    snapshot.validate().map_err(|e| shape(e.to_string()))?;
    Ok(snapshot)
}

fn shape(reason: impl Into<String>) -> LegacyError {
    LegacyError::Shape(reason.into())
}

fn expect_str(value: Literal, what: &str) -> Result<String> {
    match value {
        Literal::Str(s) => Ok(s),
        other => Err(shape(format!("{what} must be a string, found a {}", other.kind()))),
    }
}

fn expect_sequence(value: Literal, what: &str) -> Result<Vec<Literal>> {
    match value {
        Literal::List(items) | Literal::Tuple(items) => Ok(items),
        other => Err(shape(format!("{what} must be a list, found a {}", other.kind()))),
    }
}

fn skeleton_id(value: Literal) -> Result<SkeletonId> {
    SkeletonId::new(expect_str(value, "skeleton key")?).map_err(|e| shape(e.to_string()))
}

fn cache_name(value: Literal) -> Result<CacheName> {
    CacheName::new(expect_str(value, "cache name")?).map_err(|e| shape(e.to_string()))
}

/// Build the content map, deriving display order from textual key order.
///
/// A repeated key keeps its first position and takes its last value.
fn caches_from_dict(pairs: Vec<(Literal, Literal)>) -> Result<(CacheMap, OrderMap)> {
    let mut caches = CacheMap::new();
    let mut order = OrderMap::new();

    for (key, value) in pairs {
        let skeleton = skeleton_id(key)?;
        let cache_pairs = match value {
            Literal::Dict(pairs) => pairs,
            other => {
                return Err(shape(format!(
                    "caches of {skeleton} must be a dict, found a {}",
                    other.kind()
                )))
            }
        };

        let mut entries = BTreeMap::new();
        let mut names = Vec::new();
        for (cache_key, bones) in cache_pairs {
            let name = cache_name(cache_key)?;
            let bones = expect_sequence(bones, "bone list")?
                .into_iter()
                .map(|bone| expect_str(bone, "bone name").map(BoneName::from))
                .collect::<Result<Vec<_>>>()?;
            if !entries.contains_key(&name) {
                names.push(name.clone());
            }
            entries.insert(name, bones);
        }

        caches.insert(skeleton.clone(), entries);
        order.insert(skeleton, names);
    }

    Ok((caches, order))
}

fn order_from_dict(pairs: Vec<(Literal, Literal)>) -> Result<OrderMap> {
    let mut order = OrderMap::new();
    for (key, value) in pairs {
        let skeleton = skeleton_id(key)?;
        let names = expect_sequence(value, "cache order")?
            .into_iter()
            .map(cache_name)
            .collect::<Result<Vec<_>>>()?;
        order.insert(skeleton, names);
    }
    Ok(order)
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Deepest bracket nesting accepted. Cache files nest at most three levels.
const MAX_DEPTH: usize = 64;

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            depth: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> LegacyError {
        LegacyError::Syntax {
            offset: self.pos,
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, wanted: char) -> Result<()> {
        self.skip_whitespace();
        match self.bump() {
            Some(c) if c == wanted => Ok(()),
            Some(c) => {
                self.pos -= 1;
                Err(self.error(format!("expected {wanted:?}, found {c:?}")))
            }
            None => Err(self.error(format!("expected {wanted:?}, found end of input"))),
        }
    }

    /// Consume a separating comma if present. Returns `true` if one was read.
    fn comma(&mut self) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(',') {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn value(&mut self) -> Result<Literal> {
        self.skip_whitespace();
        match self.peek() {
            Some('\'') | Some('"') => self.string().map(Literal::Str),
            Some(open @ ('[' | '(' | '{')) => {
                if self.depth >= MAX_DEPTH {
                    return Err(self.error("nesting too deep"));
                }
                self.depth += 1;
                self.pos += 1;
                let value = self.container(open);
                self.depth -= 1;
                value
            }
            Some(c) => Err(self.error(format!("unsupported literal starting with {c:?}"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    /// The rest of a list, tuple, or dict whose opening bracket was consumed.
    fn container(&mut self, open: char) -> Result<Literal> {
        match open {
            '[' => {
                let (items, _) = self.items(']')?;
                Ok(Literal::List(items))
            }
            '(' => {
                let (mut items, trailing_comma) = self.items(')')?;
                // `(x)` is a parenthesized value, `(x,)` a 1-tuple.
                if items.len() == 1 && !trailing_comma {
                    Ok(items.remove(0))
                } else {
                    Ok(Literal::Tuple(items))
                }
            }
            _ => self.dict(),
        }
    }

    /// Comma-separated values up to `close`. Also reports whether the last
    /// value was followed by a comma.
    fn items(&mut self, close: char) -> Result<(Vec<Literal>, bool)> {
        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok((items, trailing_comma));
            }
            if !items.is_empty() && !trailing_comma {
                return Err(self.error(format!("expected ',' or {close:?}")));
            }
            items.push(self.value()?);
            trailing_comma = self.comma();
        }
    }

    fn dict(&mut self) -> Result<Literal> {
        let mut pairs = Vec::new();
        let mut separated = true;
        loop {
            self.skip_whitespace();
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(Literal::Dict(pairs));
            }
            if !separated {
                return Err(self.error("expected ',' or '}'"));
            }
            let key = self.value()?;
            self.expect(':')?;
            let value = self.value()?;
            pairs.push((key, value));
            separated = self.comma();
        }
    }

    fn string(&mut self) -> Result<String> {
        let quote = self.bump().ok_or_else(|| self.error("expected string"))?;
        let mut out = String::new();
        loop {
            let c = self
                .bump()
                .ok_or_else(|| self.error("unterminated string"))?;
            match c {
                c if c == quote => return Ok(out),
                '\n' => return Err(self.error("newline in string")),
                '\\' => self.escape(&mut out)?,
                c => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<()> {
        let c = self
            .bump()
            .ok_or_else(|| self.error("unterminated escape"))?;
        match c {
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            'x' => out.push(self.hex_char(2)?),
            'u' => out.push(self.hex_char(4)?),
            'U' => out.push(self.hex_char(8)?),
            // Unknown escapes keep their backslash.
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_char(&mut self, digits: usize) -> Result<char> {
        let mut code = 0u32;
        for _ in 0..digits {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("invalid hex escape"))?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| self.error(format!("invalid code point {code:#x}")))
    }
}
