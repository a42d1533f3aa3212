//! Token-stream binding against a validated schema.
//!
//! [`Schema::bind`] performs one left-to-right scan over the tokens:
//!
//! 1. A token starting with `-` is a named token and must match the name
//!    table exactly; anything else fills the first positional slot that is
//!    still free (a "many" slot stays free forever).
//! 2. The matched argument's value parser reads the tokens after a named
//!    token, or the positional token itself.
//! 3. Values of "many" arguments accumulate; a second occurrence of any
//!    other argument is an error.
//!
//! Unknown tokens, duplicates and value parse failures stop the scan at the
//! first occurrence. Once the stream is exhausted, defaults are filled in and
//! every missing mandatory argument is reported together.
//!
//! Matching the reserved help argument ends the scan with an empty
//! [`ParseErrors`], the help sentinel.

use std::collections::HashMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

use crate::parser::{TokenStream, ValueParseError};
use crate::{ArgumentId, ArgumentSpec, AssembleError, BoundValue, Schema};

/// A single parse-time failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// A named token is not declared, or a bare token has no free slot.
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    /// A single-valued argument occurred more than once.
    #[error("duplicate argument '--{0}'")]
    DuplicateArgument(String),
    /// A mandatory argument never occurred.
    #[error("missing mandatory argument '--{0}'")]
    MissingMandatoryArgument(String),
    /// A value token could not be converted.
    #[error("cannot parse '{token}' as '{expected}'")]
    InvalidFormat { token: String, expected: String },
    /// The stream ended where an argument expected its value.
    #[error("missing the parameter for argument '--{0}'")]
    MissingArgumentParameter(String),
    /// The result factory rejected the bound values.
    #[error(transparent)]
    Assembly(#[from] AssembleError),
}

impl BindError {
    fn from_value_error(error: ValueParseError, spec: &ArgumentSpec) -> Self {
        match error {
            ValueParseError::InvalidFormat { token, expected } => {
                Self::InvalidFormat { token, expected }
            }
            ValueParseError::MissingParameter => {
                Self::MissingArgumentParameter(spec.long_name().to_string())
            }
        }
    }
}

/// Ordered list of parse failures.
///
/// An empty list is the help sentinel: the user asked for help, which the
/// boundary layer shows before exiting successfully.
///
/// # Examples
///
/// ```
/// use cmdbind_core::*;
///
/// let schema = SchemaBuilder::new()
///     .declare(ArgumentDecl::new("a", "int"))
///     .declare(ArgumentDecl::new("b", "int"))
///     .build()
///     .unwrap();
///
/// let errors = schema.bind(&["--help"]).unwrap_err();
/// assert!(errors.is_help_request());
/// assert_eq!(errors.exit_code(), 0);
///
/// let errors = schema.bind::<&str>(&[]).unwrap_err();
/// assert_eq!(errors.len(), 2);
/// assert_eq!(errors.exit_code(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseErrors(Vec<BindError>);

impl ParseErrors {
    /// The help sentinel.
    pub fn help() -> Self {
        Self(Vec::new())
    }

    /// Returns `true` if this is the help sentinel.
    pub fn is_help_request(&self) -> bool {
        self.0.is_empty()
    }

    /// Process exit code for the boundary layer: 0 for help, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_help_request() { 0 } else { 1 }
    }

    pub fn errors(&self) -> &[BindError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<BindError> {
        self.0
    }
}

impl From<BindError> for ParseErrors {
    fn from(error: BindError) -> Self {
        Self(vec![error])
    }
}

impl From<Vec<BindError>> for ParseErrors {
    fn from(errors: Vec<BindError>) -> Self {
        Self(errors)
    }
}

impl IntoIterator for ParseErrors {
    type Item = BindError;
    type IntoIter = std::vec::IntoIter<BindError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_help_request() {
            return f.write_str("help requested");
        }
        let messages = self.0.iter().map(ToString::to_string).collect::<Vec<_>>();
        f.write_str(&messages.join("\n"))
    }
}

impl std::error::Error for ParseErrors {}

/// Values bound by one successful parse, keyed by argument identity.
#[derive(Debug, Clone)]
pub struct BoundValues<'s> {
    schema: &'s Schema,
    values: HashMap<ArgumentId, BoundValue>,
}

impl<'s> BoundValues<'s> {
    /// The schema these values were bound against.
    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// Value bound to the argument with the given long name.
    pub fn get(&self, long_name: &str) -> Option<&BoundValue> {
        self.schema
            .find(long_name)
            .and_then(|spec| self.values.get(&spec.id()))
    }

    /// Value bound to the argument with the given identity.
    pub fn get_by_id(&self, id: ArgumentId) -> Option<&BoundValue> {
        self.values.get(&id)
    }

    /// Bound values in declaration order, excluding the help argument.
    pub fn iter(&self) -> impl Iterator<Item = (&'s ArgumentSpec, &BoundValue)> {
        let schema = self.schema;
        schema
            .arguments()
            .filter(move |spec| !schema.is_help(spec.id()))
            .filter_map(move |spec| self.values.get(&spec.id()).map(|value| (spec, value)))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Renders the values as a JSON object keyed by long name.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .iter()
            .map(|(spec, value)| {
                let json = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
                (spec.long_name().to_string(), json)
            })
            .collect();
        serde_json::Value::Object(map)
    }
}

impl Serialize for BoundValues<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (spec, value) in self.iter() {
            map.serialize_entry(spec.long_name(), value)?;
        }
        map.end()
    }
}

impl Schema {
    /// Binds a token stream against this schema.
    ///
    /// # Errors
    ///
    /// Returns [`ParseErrors`]: a single error for the first unknown,
    /// duplicate or malformed token; every missing mandatory argument at
    /// once; or the empty help sentinel.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdbind_core::*;
    ///
    /// let schema = SchemaBuilder::new()
    ///     .declare(ArgumentDecl::new("x", "int").with_arity(Arity::ZeroOrMany))
    ///     .build()
    ///     .unwrap();
    /// let bound = schema.bind(&["--x", "1", "--x", "2", "--x", "3"]).unwrap();
    /// assert_eq!(
    ///     bound.get("x"),
    ///     Some(&BoundValue::Many(vec![Value::Int(1), Value::Int(2), Value::Int(3)]))
    /// );
    /// ```
    pub fn bind<S: AsRef<str>>(&self, args: &[S]) -> Result<BoundValues<'_>, ParseErrors> {
        let tokens: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        let mut values: HashMap<ArgumentId, BoundValue> = HashMap::new();
        let mut stream = TokenStream::new(&tokens);

        while let Some(token) = stream.peek() {
            let (spec, marker_width) = self.match_token(token, &values)?;
            if self.is_help(spec.id()) {
                debug!(token, "Help requested");
                return Err(ParseErrors::help());
            }

            let rest = stream.skip(marker_width);
            let (value_width, value) = spec
                .parser()
                .parse(rest)
                .map_err(|err| BindError::from_value_error(err, spec))?;
            debug!(
                token,
                argument = spec.long_name(),
                consumed = marker_width + value_width,
                "Bound token"
            );

            if spec.arity().is_many() {
                let slot = values
                    .entry(spec.id())
                    .or_insert_with(|| BoundValue::Many(Vec::new()));
                if let BoundValue::Many(items) = slot {
                    items.push(value);
                }
            } else if values.contains_key(&spec.id()) {
                return Err(BindError::DuplicateArgument(spec.long_name().to_string()).into());
            } else {
                values.insert(spec.id(), BoundValue::Single(value));
            }

            // A zero-width parser on a positional token must still advance.
            stream = stream.skip((marker_width + value_width).max(1));
        }

        let mut missing = Vec::new();
        for spec in self.arguments() {
            if values.contains_key(&spec.id()) {
                continue;
            }
            match spec.default_value() {
                Some(default) => {
                    values.insert(spec.id(), default);
                }
                None => missing.push(BindError::MissingMandatoryArgument(
                    spec.long_name().to_string(),
                )),
            }
        }
        if !missing.is_empty() {
            debug!(missing = missing.len(), "Mandatory arguments missing");
            return Err(missing.into());
        }

        Ok(BoundValues {
            schema: self,
            values,
        })
    }

    /// Resolves a token to its spec and the width of its name marker.
    fn match_token(
        &self,
        token: &str,
        bound: &HashMap<ArgumentId, BoundValue>,
    ) -> Result<(&ArgumentSpec, usize), BindError> {
        if token.starts_with('-') {
            return self
                .lookup(token)
                .map(|spec| (spec, 1))
                .ok_or_else(|| BindError::UnknownOption(token.to_string()));
        }

        self.positionals()
            .find(|spec| !bound.contains_key(&spec.id()) || spec.arity().is_many())
            .map(|spec| (spec, 0))
            .ok_or_else(|| BindError::UnknownOption(token.to_string()))
    }
}
