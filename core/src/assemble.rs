//! Turning bound values into the caller's result type.
//!
//! The binder stops at [`BoundValues`]; building the final value is the job
//! of a caller-supplied factory. [`CommandLine`] pairs a schema with such a
//! factory, and the [`Arguments`] trait lets a type describe its own schema
//! and assembly in one place.
//!
//! # Examples
//!
//! ```
//! use cmdbind_core::*;
//!
//! #[derive(Debug)]
//! struct Sum {
//!     first: i64,
//!     rest: Vec<i64>,
//! }
//!
//! impl Arguments for Sum {
//!     fn declare(builder: SchemaBuilder) -> SchemaBuilder {
//!         builder
//!             .declare(ArgumentDecl::new("first", "int").at_position(0))
//!             .declare(ArgumentDecl::new("rest", "int").at_position(1).with_arity(Arity::ZeroOrMany))
//!     }
//!
//!     fn assemble(bound: &BoundValues<'_>) -> Result<Self, AssembleError> {
//!         Ok(Self {
//!             first: bound.value("first")?,
//!             rest: bound.value("rest")?,
//!         })
//!     }
//! }
//!
//! let command_line = CommandLine::<Sum>::for_type().unwrap();
//! let sum = command_line.parse(&["456", "1", "2", "3"]).unwrap();
//! assert_eq!(sum.first, 456);
//! assert_eq!(sum.rest, vec![1, 2, 3]);
//! ```

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::{
    BindError, BoundValue, BoundValues, ParseErrors, Schema, SchemaBuilder, SchemaError, Value,
};

/// Mismatch between a factory's expectations and the bound values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssembleError {
    /// The factory asked for a name the schema does not declare.
    #[error("no argument named '--{0}' in schema")]
    UnknownArgument(String),
    /// The bound value cannot be converted to the requested type.
    #[error("argument '--{name}' holds {found}, expected {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: String,
    },
}

/// Conversion from a bound value into a Rust type.
pub trait FromBoundValue: Sized {
    /// Description of the accepted shape, used in mismatch errors.
    const EXPECTED: &'static str;

    fn from_bound_value(value: &BoundValue) -> Option<Self>;
}

/// Conversion from a single scalar value.
trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Option<Self> {
        i64::from_value(value).and_then(|value| i32::try_from(value).ok())
    }
}

impl FromValue for u16 {
    fn from_value(value: &Value) -> Option<Self> {
        i64::from_value(value).and_then(|value| u16::try_from(value).ok())
    }
}

impl FromValue for usize {
    fn from_value(value: &Value) -> Option<Self> {
        i64::from_value(value).and_then(|value| usize::try_from(value).ok())
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(value) => Some(value.clone()),
            _ => None,
        }
    }
}

impl FromValue for PathBuf {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Path(value) => Some(value.clone()),
            _ => None,
        }
    }
}

impl FromValue for SocketAddr {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Endpoint(value) => Some(*value),
            _ => None,
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

macro_rules! impl_from_bound_value {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl FromBoundValue for $ty {
                const EXPECTED: &'static str = $name;

                fn from_bound_value(value: &BoundValue) -> Option<Self> {
                    value.as_single().and_then(<$ty>::from_value)
                }
            }

            impl FromBoundValue for Option<$ty> {
                const EXPECTED: &'static str = concat!("an optional ", $name);

                fn from_bound_value(value: &BoundValue) -> Option<Self> {
                    match value {
                        BoundValue::Absent => Some(None),
                        BoundValue::Single(value) => <$ty>::from_value(value).map(Some),
                        BoundValue::Many(_) => None,
                    }
                }
            }

            impl FromBoundValue for Vec<$ty> {
                const EXPECTED: &'static str = concat!("a sequence of ", $name);

                fn from_bound_value(value: &BoundValue) -> Option<Self> {
                    value
                        .as_many()?
                        .iter()
                        .map(<$ty>::from_value)
                        .collect()
                }
            }
        )*
    };
}

impl_from_bound_value! {
    bool => "Boolean",
    i64 => "Integer",
    i32 => "32-bit Integer",
    u16 => "16-bit unsigned Integer",
    usize => "unsigned Integer",
    f64 => "Float",
    String => "String",
    PathBuf => "Path",
    SocketAddr => "Endpoint",
    Value => "value",
}

impl FromBoundValue for BoundValue {
    const EXPECTED: &'static str = "any value";

    fn from_bound_value(value: &BoundValue) -> Option<Self> {
        Some(value.clone())
    }
}

impl BoundValues<'_> {
    /// Converts the value bound to `long_name` into `T`.
    ///
    /// # Errors
    ///
    /// [`AssembleError::UnknownArgument`] if the schema lacks the name, or
    /// [`AssembleError::TypeMismatch`] if the value does not convert.
    pub fn value<T: FromBoundValue>(&self, long_name: &str) -> Result<T, AssembleError> {
        let bound = self
            .get(long_name)
            .ok_or_else(|| AssembleError::UnknownArgument(long_name.to_string()))?;
        T::from_bound_value(bound).ok_or_else(|| AssembleError::TypeMismatch {
            name: long_name.to_string(),
            expected: T::EXPECTED,
            found: bound.describe(),
        })
    }
}

/// A type that describes its own arguments and how to build itself from
/// them.
pub trait Arguments: Sized {
    /// Adds this type's arguments to the builder.
    fn declare(builder: SchemaBuilder) -> SchemaBuilder;

    /// Builds the value from a successful parse.
    fn assemble(bound: &BoundValues<'_>) -> Result<Self, AssembleError>;
}

type Factory<T> = Box<dyn Fn(&BoundValues<'_>) -> Result<T, AssembleError> + Send + Sync>;

/// A schema paired with the factory that turns bound values into `T`.
///
/// Reusable and shareable across threads; each call to
/// [`parse`](Self::parse) owns its own accumulator.
pub struct CommandLine<T> {
    schema: Schema,
    factory: Factory<T>,
}

impl<T> CommandLine<T> {
    /// Pairs a built schema with a factory.
    pub fn new<F>(schema: Schema, factory: F) -> Self
    where
        F: Fn(&BoundValues<'_>) -> Result<T, AssembleError> + Send + Sync + 'static,
    {
        Self {
            schema,
            factory: Box::new(factory),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Parses the tokens and assembles the result.
    ///
    /// # Errors
    ///
    /// Returns the binder's [`ParseErrors`] unchanged (including the empty
    /// help sentinel), or a single [`BindError::Assembly`] if the factory
    /// fails.
    pub fn parse<S: AsRef<str>>(&self, args: &[S]) -> Result<T, ParseErrors> {
        let bound = self.schema.bind(args)?;
        (self.factory)(&bound).map_err(|err| BindError::Assembly(err).into())
    }

    /// Renders the usage text for this command line.
    pub fn help(&self) -> String {
        crate::render_help(&self.schema)
    }
}

impl<T: Arguments + 'static> CommandLine<T> {
    /// Builds the schema declared by `T` and uses [`Arguments::assemble`] as
    /// the factory.
    ///
    /// # Errors
    ///
    /// Returns the [`SchemaError`] raised while building `T`'s schema.
    pub fn for_type() -> Result<Self, SchemaError> {
        Self::for_type_with(SchemaBuilder::new())
    }

    /// Like [`for_type`](Self::for_type), starting from a preconfigured
    /// builder (program name, registry, help toggle).
    pub fn for_type_with(builder: SchemaBuilder) -> Result<Self, SchemaError> {
        let schema = T::declare(builder).build()?;
        Ok(Self::new(schema, T::assemble))
    }
}

impl<T> fmt::Debug for CommandLine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandLine")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArgumentDecl, Arity};

    #[derive(Debug, PartialEq)]
    struct Server {
        listen: SocketAddr,
        root: PathBuf,
        name: Option<String>,
        verbose: bool,
    }

    impl Arguments for Server {
        fn declare(builder: SchemaBuilder) -> SchemaBuilder {
            builder
                .program("serve")
                .declare(ArgumentDecl::new("listen", "endpoint").with_default("127.0.0.1:8080"))
                .declare(ArgumentDecl::new("root", "path").at_position(0))
                .declare(ArgumentDecl::new("name", "string").with_arity(Arity::ZeroOrOne))
                .declare(ArgumentDecl::new("verbose", "bool").with_short("v"))
        }

        fn assemble(bound: &BoundValues<'_>) -> Result<Self, AssembleError> {
            Ok(Self {
                listen: bound.value("listen")?,
                root: bound.value("root")?,
                name: bound.value("name")?,
                verbose: bound.value("verbose")?,
            })
        }
    }

    #[test]
    fn test_for_type_assembles_defaults() {
        let command_line = CommandLine::<Server>::for_type().unwrap();
        let server = command_line.parse(&["/srv/www"]).unwrap();
        assert_eq!(
            server,
            Server {
                listen: "127.0.0.1:8080".parse().unwrap(),
                root: PathBuf::from("/srv/www"),
                name: None,
                verbose: false,
            }
        );
    }

    #[test]
    fn test_for_type_assembles_supplied_values() {
        let command_line = CommandLine::<Server>::for_type().unwrap();
        let server = command_line
            .parse(&["-v", "--name", "Hello", "--listen", "[::1]:9000", "--root", "."])
            .unwrap();
        assert!(server.verbose);
        assert_eq!(server.name.as_deref(), Some("Hello"));
        assert_eq!(server.listen, "[::1]:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(server.root, PathBuf::from("."));
    }

    #[test]
    fn test_factory_mismatch_becomes_assembly_error() {
        let schema = SchemaBuilder::new()
            .declare(ArgumentDecl::new("n", "int"))
            .build()
            .unwrap();
        let command_line = CommandLine::new(schema, |bound| bound.value::<String>("n"));
        let errors = command_line.parse(&["--n", "3"]).unwrap_err();
        assert_eq!(
            errors.into_vec(),
            vec![BindError::Assembly(AssembleError::TypeMismatch {
                name: "n".to_string(),
                expected: "String",
                found: "a value of type Integer".to_string(),
            })]
        );
    }

    #[test]
    fn test_unknown_name_in_factory() {
        let schema = SchemaBuilder::new().build().unwrap();
        let command_line = CommandLine::new(schema, |bound| bound.value::<i64>("missing"));
        let errors = command_line.parse::<&str>(&[]).unwrap_err();
        assert_eq!(
            errors.into_vec(),
            vec![BindError::Assembly(AssembleError::UnknownArgument(
                "missing".to_string()
            ))]
        );
    }

    #[test]
    fn test_narrow_integer_conversions() {
        let big = BoundValue::Single(Value::Int(70_000));
        assert_eq!(u16::from_bound_value(&big), None);
        assert_eq!(i32::from_bound_value(&big), Some(70_000));
        let many = BoundValue::Many(vec![Value::Int(1), Value::Int(-1)]);
        assert_eq!(Vec::<usize>::from_bound_value(&many), None);
        assert_eq!(Vec::<i64>::from_bound_value(&many), Some(vec![1, -1]));
    }
}
