//! Argument declarations and resolved argument specs.
//!
//! An [`ArgumentDecl`] is the plain, serializable description a caller
//! writes (or loads from a file). Resolving it against a
//! [`ParserRegistry`] produces an [`ArgumentSpec`]: the immutable schema
//! entry with a bound value parser and a checked default.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::parser::{FlagParser, ParserRegistry, TokenStream, ValueParser};
use crate::{Arity, BoundValue, SchemaError, Value, ValueKind};

/// Identity of an argument within one schema.
///
/// Assigned by [`SchemaBuilder`](crate::SchemaBuilder) in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ArgumentId(pub(crate) usize);

impl ArgumentId {
    /// Position of the argument in the schema's declaration order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// One resolved schema entry.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use cmdbind_core::{ArgumentSpec, Arity, TokenParser, ValueKind};
///
/// let count = ArgumentSpec::new("count", Arity::One, Arc::new(TokenParser::builtin(ValueKind::Int)))
///     .with_short("c")
///     .at_position(0);
/// assert_eq!(count.long_name(), "count");
/// assert_eq!(count.result_type(), ValueKind::Int);
/// assert!(count.is_positional());
///
/// let quiet = ArgumentSpec::flag("quiet", false);
/// assert!(quiet.is_flag());
/// ```
#[derive(Debug, Clone)]
pub struct ArgumentSpec {
    pub(crate) id: ArgumentId,
    long_name: String,
    short_name: Option<String>,
    positional_index: Option<usize>,
    arity: Arity,
    default: Option<BoundValue>,
    parser: Arc<dyn ValueParser>,
    description: Option<String>,
}

impl ArgumentSpec {
    /// Creates a named argument without a default.
    pub fn new(long_name: impl Into<String>, arity: Arity, parser: Arc<dyn ValueParser>) -> Self {
        Self {
            id: ArgumentId::default(),
            long_name: long_name.into(),
            short_name: None,
            positional_index: None,
            arity,
            default: None,
            parser,
            description: None,
        }
    }

    /// Creates a boolean flag that binds `default` when absent and its
    /// negation when present.
    pub fn flag(long_name: impl Into<String>, default: bool) -> Self {
        Self::new(long_name, Arity::ZeroOrOne, Arc::new(FlagParser::new(!default)))
            .with_default(BoundValue::Single(Value::Bool(default)))
    }

    /// Sets the `-short` alias.
    pub fn with_short(mut self, short_name: impl Into<String>) -> Self {
        self.short_name = Some(short_name.into());
        self
    }

    /// Makes the argument positional at `index`.
    pub fn at_position(mut self, index: usize) -> Self {
        self.positional_index = Some(index);
        self
    }

    /// Declares the value bound when the argument is absent.
    pub fn with_default(mut self, default: BoundValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Adds a description for usage text.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn id(&self) -> ArgumentId {
        self.id
    }

    pub fn long_name(&self) -> &str {
        &self.long_name
    }

    pub fn short_name(&self) -> Option<&str> {
        self.short_name.as_deref()
    }

    pub fn positional_index(&self) -> Option<usize> {
        self.positional_index
    }

    pub fn is_positional(&self) -> bool {
        self.positional_index.is_some()
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn parser(&self) -> &dyn ValueParser {
        self.parser.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Kind of the values this argument binds.
    pub fn result_type(&self) -> ValueKind {
        self.parser.kind()
    }

    /// Returns `true` for zero-width boolean flags.
    pub fn is_flag(&self) -> bool {
        self.parser.is_flag()
    }

    /// The declared default, as written.
    pub fn declared_default(&self) -> Option<&BoundValue> {
        self.default.as_ref()
    }

    /// Value bound when the argument never occurs, or `None` if it is
    /// mandatory.
    pub fn default_value(&self) -> Option<BoundValue> {
        self.arity.get_default(self.default.as_ref())
    }

    /// Checks that the declared default fits the arity and the value kind.
    pub(crate) fn check_default(&self) -> Result<(), SchemaError> {
        let Some(default) = &self.default else {
            return Ok(());
        };
        if self.arity.is_mandatory() {
            return Err(SchemaError::DefaultNotAllowed {
                name: self.long_name.clone(),
                arity: self.arity,
            });
        }

        let shape_ok = match default {
            BoundValue::Absent | BoundValue::Single(_) => !self.arity.is_many(),
            BoundValue::Many(_) => self.arity.is_many(),
        };
        if shape_ok && default.has_kind(self.result_type()) {
            Ok(())
        } else {
            Err(SchemaError::WrongDefaultType {
                name: self.long_name.clone(),
                expected: self.result_type().name().to_string(),
            })
        }
    }
}

impl fmt::Display for ArgumentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} : {}{}",
            self.long_name,
            self.result_type(),
            self.arity.postfix()
        )?;
        if let Some(default) = self.default_value() {
            write!(f, " = {default}")?;
        }
        Ok(())
    }
}

/// Literal default as written in a declaration.
///
/// Textual literals are converted through the target type's parser when the
/// target type is not `string`, so `"8080"` works for an integer and
/// `"127.0.0.1:80"` for an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultLiteral {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<DefaultLiteral>),
}

impl From<bool> for DefaultLiteral {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for DefaultLiteral {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for DefaultLiteral {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for DefaultLiteral {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl<T: Into<DefaultLiteral>> From<Vec<T>> for DefaultLiteral {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// Declarative description of one argument.
///
/// This is the hand-written (or file-loaded) form of a schema entry. The
/// `type` names a parser in a [`ParserRegistry`].
///
/// # Examples
///
/// ```
/// use cmdbind_core::{ArgumentDecl, Arity, ParserRegistry};
///
/// let decl = ArgumentDecl::new("port", "int").with_short("p").with_default(8080i64);
/// let spec = decl.resolve(&ParserRegistry::with_builtins()).unwrap();
/// assert_eq!(spec.arity(), Arity::ZeroOrOne);
/// assert_eq!(spec.short_name(), Some("p"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentDecl {
    /// Long name, addressed as `--name`.
    pub name: String,
    /// Optional alias, addressed as `-short`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,
    /// Positional slot, if the argument may be given without its name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    /// Registered type name (e.g. `int`, `path`, `endpoint`).
    #[serde(rename = "type")]
    pub type_name: String,
    /// Explicit arity; inferred from `default` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arity: Option<Arity>,
    /// Value used when the argument is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultLiteral>,
    /// Description shown in usage text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ArgumentDecl {
    /// Creates a declaration with the given long name and type name.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short: None,
            position: None,
            type_name: type_name.into(),
            arity: None,
            default: None,
            description: None,
        }
    }

    pub fn with_short(mut self, short: impl Into<String>) -> Self {
        self.short = Some(short.into());
        self
    }

    pub fn at_position(mut self, index: usize) -> Self {
        self.position = Some(index);
        self
    }

    pub fn with_arity(mut self, arity: Arity) -> Self {
        self.arity = Some(arity);
        self
    }

    pub fn with_default(mut self, default: impl Into<DefaultLiteral>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Arity after inference: an explicit arity wins, a list default implies
    /// `ZeroOrMany`, any other default implies `ZeroOrOne`, otherwise `One`.
    pub fn effective_arity(&self) -> Arity {
        match (self.arity, &self.default) {
            (Some(arity), _) => arity,
            (None, Some(DefaultLiteral::List(_))) => Arity::ZeroOrMany,
            (None, Some(_)) => Arity::ZeroOrOne,
            (None, None) => Arity::One,
        }
    }

    /// Resolves the declaration into an [`ArgumentSpec`].
    ///
    /// A named, non-many `bool` becomes a zero-width flag whose presence
    /// binds the negation of its default. With an explicit [`Arity::One`]
    /// the flag stays mandatory and has no default.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::UnsupportedType`] if the type name has no parser.
    /// - [`SchemaError::DefaultNotAllowed`] for a default on a mandatory arity.
    /// - [`SchemaError::WrongDefaultType`] if the default does not convert.
    pub fn resolve(&self, registry: &ParserRegistry) -> Result<ArgumentSpec, SchemaError> {
        let parser = registry
            .get(&self.type_name)
            .ok_or_else(|| SchemaError::UnsupportedType(self.type_name.clone()))?;
        let arity = self.effective_arity();

        if arity.is_mandatory() && self.default.is_some() {
            return Err(SchemaError::DefaultNotAllowed {
                name: self.name.clone(),
                arity,
            });
        }

        let named_bool =
            parser.kind() == ValueKind::Bool && !arity.is_many() && self.position.is_none();
        let mut spec = if named_bool && self.arity == Some(Arity::One) {
            // Explicitly mandatory: the flag must occur and binds `true`.
            ArgumentSpec::new(self.name.clone(), Arity::One, Arc::new(FlagParser::new(true)))
        } else if named_bool {
            let default = match &self.default {
                None => false,
                Some(literal) => match self.convert_literal(literal, parser.as_ref())? {
                    Value::Bool(value) => value,
                    _ => return Err(self.wrong_default(parser.as_ref())),
                },
            };
            ArgumentSpec::flag(self.name.clone(), default)
        } else {
            let default = self.resolve_default(arity, parser.as_ref())?;
            let mut spec = ArgumentSpec::new(self.name.clone(), arity, parser);
            spec.default = default;
            spec
        };

        spec.short_name = self.short.clone();
        spec.positional_index = self.position;
        spec.description = self.description.clone();
        Ok(spec)
    }

    fn resolve_default(
        &self,
        arity: Arity,
        parser: &dyn ValueParser,
    ) -> Result<Option<BoundValue>, SchemaError> {
        let Some(literal) = &self.default else {
            return Ok(None);
        };
        let bound = match (arity.is_many(), literal) {
            (true, DefaultLiteral::List(items)) => BoundValue::Many(
                items
                    .iter()
                    .map(|item| self.convert_literal(item, parser))
                    .collect::<Result<_, _>>()?,
            ),
            (true, scalar) => BoundValue::Many(vec![self.convert_literal(scalar, parser)?]),
            (false, DefaultLiteral::List(_)) => return Err(self.wrong_default(parser)),
            (false, scalar) => BoundValue::Single(self.convert_literal(scalar, parser)?),
        };
        Ok(Some(bound))
    }

    fn convert_literal(
        &self,
        literal: &DefaultLiteral,
        parser: &dyn ValueParser,
    ) -> Result<Value, SchemaError> {
        let value = match (literal, parser.kind()) {
            (DefaultLiteral::Bool(value), ValueKind::Bool) => Value::Bool(*value),
            (DefaultLiteral::Int(value), ValueKind::Int) => Value::Int(*value),
            (DefaultLiteral::Int(value), ValueKind::Float) => Value::Float(*value as f64),
            (DefaultLiteral::Float(value), ValueKind::Float) => Value::Float(*value),
            (DefaultLiteral::Text(text), ValueKind::String) => Value::String(text.clone()),
            (DefaultLiteral::Text(text), _) => {
                let tokens = [text.as_str()];
                match parser.parse(TokenStream::new(&tokens)) {
                    Ok((_, value)) => value,
                    Err(_) => return Err(self.wrong_default(parser)),
                }
            }
            _ => return Err(self.wrong_default(parser)),
        };
        Ok(value)
    }

    fn wrong_default(&self, parser: &dyn ValueParser) -> SchemaError {
        SchemaError::WrongDefaultType {
            name: self.name.clone(),
            expected: parser.kind().name().to_string(),
        }
    }
}
