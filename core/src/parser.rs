//! Value parsers and the type-keyed parser registry.
//!
//! A [`ValueParser`] looks at the tokens remaining after an argument was
//! matched and reports how many of them it consumed along with the produced
//! [`Value`]. Built-in parsers cover booleans, integers, floats, strings,
//! paths and network endpoints; [`ParserRegistry`] maps declared type names
//! to parsers so that adding a supported type is one table entry.
//!
//! # Examples
//!
//! ```
//! use cmdbind_core::{ParserRegistry, TokenStream, Value};
//!
//! let registry = ParserRegistry::with_builtins();
//! let int = registry.get("int").unwrap();
//! let tokens = ["42", "rest"];
//! let (width, value) = int.parse(TokenStream::new(&tokens)).unwrap();
//! assert_eq!(width, 1);
//! assert_eq!(value, Value::Int(42));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::{Value, ValueKind};

/// Immutable view over the tokens that have not been consumed yet.
#[derive(Debug, Clone, Copy)]
pub struct TokenStream<'a> {
    tokens: &'a [&'a str],
    offset: usize,
}

impl<'a> TokenStream<'a> {
    /// Creates a stream positioned at the first token.
    pub fn new(tokens: &'a [&'a str]) -> Self {
        Self { tokens, offset: 0 }
    }

    /// Returns the next token without consuming it.
    pub fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.offset).copied()
    }

    /// Returns the stream advanced by `count` tokens, stopping at the end.
    pub fn skip(self, count: usize) -> Self {
        Self {
            tokens: self.tokens,
            offset: (self.offset + count).min(self.tokens.len()),
        }
    }

    /// Tokens not consumed yet.
    pub fn remaining(&self) -> &'a [&'a str] {
        &self.tokens[self.offset..]
    }

    /// Returns `true` once every token has been consumed.
    pub fn is_empty(&self) -> bool {
        self.offset >= self.tokens.len()
    }

    /// Index of the next token in the original token list.
    pub fn position(&self) -> usize {
        self.offset
    }
}

/// Failure of a single value parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueParseError {
    /// The token could not be converted to the expected type.
    #[error("cannot parse '{token}' as '{expected}'")]
    InvalidFormat { token: String, expected: String },
    /// The stream ended before the parser found its token.
    #[error("missing the parameter for argument")]
    MissingParameter,
}

/// Converts tokens at the head of a stream into a typed value.
///
/// Implementations are pure: no I/O, no retries, no shared mutable state.
pub trait ValueParser: fmt::Debug + Send + Sync {
    /// Kind of the values this parser produces.
    fn kind(&self) -> ValueKind;

    /// Syntax shown in usage text, empty for zero-width flags.
    fn syntax(&self) -> &str;

    /// Parses the head of `stream`, returning the number of tokens consumed.
    fn parse(&self, stream: TokenStream<'_>) -> Result<(usize, Value), ValueParseError>;

    /// Returns `true` for zero-width parsers whose presence alone sets the
    /// value.
    fn is_flag(&self) -> bool {
        false
    }
}

/// Parser consuming exactly one token through a conversion function.
#[derive(Clone)]
pub struct TokenParser {
    kind: ValueKind,
    convert: fn(&str) -> Option<Value>,
}

impl TokenParser {
    /// Creates a one-token parser.
    pub fn new(kind: ValueKind, convert: fn(&str) -> Option<Value>) -> Self {
        Self { kind, convert }
    }

    /// Built-in parser for the given kind.
    pub fn builtin(kind: ValueKind) -> Self {
        let convert: fn(&str) -> Option<Value> = match kind {
            ValueKind::Bool => |token| parse_bool(token).map(Value::Bool),
            ValueKind::Int => |token| token.parse().ok().map(Value::Int),
            ValueKind::Float => |token| token.parse().ok().map(Value::Float),
            ValueKind::String => |token| Some(Value::String(token.to_string())),
            ValueKind::Path => |token| Some(Value::Path(PathBuf::from(token))),
            ValueKind::Endpoint => |token| parse_endpoint(token).map(Value::Endpoint),
        };
        Self::new(kind, convert)
    }
}

impl fmt::Debug for TokenParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenParser")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl ValueParser for TokenParser {
    fn kind(&self) -> ValueKind {
        self.kind
    }

    fn syntax(&self) -> &str {
        self.kind.name()
    }

    fn parse(&self, stream: TokenStream<'_>) -> Result<(usize, Value), ValueParseError> {
        let token = stream.peek().ok_or(ValueParseError::MissingParameter)?;
        (self.convert)(token)
            .map(|value| (1, value))
            .ok_or_else(|| ValueParseError::InvalidFormat {
                token: token.to_string(),
                expected: self.syntax().to_string(),
            })
    }
}

/// Zero-width boolean parser: presence yields a fixed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagParser {
    present: bool,
}

impl FlagParser {
    /// Creates a flag parser yielding `present` whenever the flag occurs.
    pub fn new(present: bool) -> Self {
        Self { present }
    }

    /// Value produced when the flag occurs.
    pub fn present(&self) -> bool {
        self.present
    }
}

impl ValueParser for FlagParser {
    fn kind(&self) -> ValueKind {
        ValueKind::Bool
    }

    fn syntax(&self) -> &str {
        ""
    }

    fn parse(&self, _stream: TokenStream<'_>) -> Result<(usize, Value), ValueParseError> {
        Ok((0, Value::Bool(self.present)))
    }

    fn is_flag(&self) -> bool {
        true
    }
}

fn parse_bool(token: &str) -> Option<bool> {
    if token.eq_ignore_ascii_case("true") {
        Some(true)
    } else if token.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Accepts `ip:port`, `[v6]:port`, or a bare address (port 0). IPv4
/// addresses may use the short dotted forms of [`parse_short_ipv4`].
fn parse_endpoint(token: &str) -> Option<SocketAddr> {
    if let Ok(addr) = token.parse::<SocketAddr>() {
        return Some(addr);
    }
    if let Ok(ip) = token.parse::<IpAddr>() {
        return Some(SocketAddr::new(ip, 0));
    }
    let (host, port) = match token.rsplit_once(':') {
        Some((host, port)) => (host, port.parse::<u16>().ok()?),
        None => (token, 0),
    };
    parse_short_ipv4(host).map(|ip| SocketAddr::new(IpAddr::V4(ip), port))
}

/// Parses `a`, `a.b`, `a.b.c` or `a.b.c.d` in decimal; the last part fills
/// the remaining low-order bytes, so `123.123.123` is `123.123.0.123`.
fn parse_short_ipv4(text: &str) -> Option<Ipv4Addr> {
    let parts = text
        .split('.')
        .map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            part.parse::<u32>().ok()
        })
        .collect::<Option<Vec<u32>>>()?;
    let (last, head) = parts.split_last()?;
    if head.len() > 3 || head.iter().any(|&part| part > 255) {
        return None;
    }

    let tail_bits = 8 * (4 - head.len() as u32);
    if tail_bits < 32 && last >> tail_bits != 0 {
        return None;
    }
    let prefix = head.iter().fold(0u32, |acc, &part| (acc << 8) | part);
    let addr = if tail_bits == 32 {
        *last
    } else {
        (prefix << tail_bits) | last
    };
    Some(Ipv4Addr::from(addr))
}

/// Type-keyed table of value parsers.
///
/// Type names are matched case-insensitively. Registering a name that is
/// already present replaces the previous parser.
#[derive(Debug, Clone)]
pub struct ParserRegistry {
    parsers: HashMap<String, Arc<dyn ValueParser>>,
}

impl ParserRegistry {
    /// Creates a registry without any parsers.
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Creates a registry with the built-in parsers and their aliases.
    pub fn with_builtins() -> Self {
        const BUILTINS: &[(ValueKind, &[&str])] = &[
            (ValueKind::Bool, &["bool", "boolean"]),
            (ValueKind::Int, &["int", "integer"]),
            (ValueKind::Float, &["float", "double"]),
            (ValueKind::String, &["string", "str"]),
            (ValueKind::Path, &["path", "file", "directory"]),
            (ValueKind::Endpoint, &["endpoint", "socket"]),
        ];

        let mut registry = Self::empty();
        for (kind, names) in BUILTINS {
            let parser: Arc<dyn ValueParser> = Arc::new(TokenParser::builtin(*kind));
            for name in *names {
                registry.register(*name, Arc::clone(&parser));
            }
        }
        registry
    }

    /// Adds or replaces the parser for `type_name`.
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        parser: Arc<dyn ValueParser>,
    ) -> &mut Self {
        let type_name: String = type_name.into();
        self.parsers.insert(type_name.to_ascii_lowercase(), parser);
        self
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with_parser(
        mut self,
        type_name: impl Into<String>,
        parser: Arc<dyn ValueParser>,
    ) -> Self {
        self.register(type_name, parser);
        self
    }

    /// Looks up the parser registered for `type_name`.
    pub fn get(&self, type_name: &str) -> Option<Arc<dyn ValueParser>> {
        self.parsers
            .get(&type_name.to_ascii_lowercase())
            .map(Arc::clone)
    }

    /// Returns `true` if `type_name` has a registered parser.
    pub fn supports(&self, type_name: &str) -> bool {
        self.parsers.contains_key(&type_name.to_ascii_lowercase())
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
