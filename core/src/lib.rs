//! Argument schema model and token binding engine.
//!
//! This crate turns an ordered list of command-line tokens into typed,
//! structured values, guided by a declarative schema:
//!
//! - [`Arity`]: how many occurrences an argument accepts and whether it
//!   falls back to a default.
//! - [`ValueParser`]: converts tokens into a typed [`Value`]; built-in
//!   parsers are looked up by type name in a [`ParserRegistry`].
//! - [`ArgumentSpec`] / [`ArgumentDecl`]: one schema entry, resolved or as
//!   declared.
//! - [`SchemaBuilder`]: validates a set of arguments (unique names, unique
//!   positional indices, a single trailing variadic positional) and builds
//!   an immutable [`Schema`].
//! - [`Schema::bind`]: the binding scan producing [`BoundValues`] or
//!   [`ParseErrors`].
//! - [`CommandLine`]: a schema plus a factory that assembles the caller's
//!   result type.
//!
//! Rendering usage text ([`render_help`]) and schema documents
//! ([`SchemaDocument`]) round out the boundary layer.
//!
//! # Example
//!
//! ```
//! use cmdbind_core::*;
//!
//! let schema = SchemaBuilder::new()
//!     .program("resize")
//!     .declare(ArgumentDecl::new("width", "int").at_position(0))
//!     .declare(ArgumentDecl::new("height", "int").at_position(1))
//!     .declare(ArgumentDecl::new("keep-aspect", "bool").with_short("k"))
//!     .build()
//!     .unwrap();
//!
//! let bound = schema.bind(&["640", "-k", "480"]).unwrap();
//! assert_eq!(bound.value::<i64>("width").unwrap(), 640);
//! assert_eq!(bound.value::<i64>("height").unwrap(), 480);
//! assert!(bound.value::<bool>("keep-aspect").unwrap());
//!
//! let errors = schema.bind(&["640"]).unwrap_err();
//! assert_eq!(
//!     errors.errors(),
//!     &[BindError::MissingMandatoryArgument("height".into())]
//! );
//! ```

mod arity;
mod assemble;
mod binder;
mod document;
mod help;
mod parser;
mod schema;
mod spec;
mod value;

pub use arity::Arity;
pub use assemble::{AssembleError, Arguments, CommandLine, FromBoundValue};
pub use binder::{BindError, BoundValues, ParseErrors};
pub use document::SchemaDocument;
pub use help::render_help;
pub use parser::{FlagParser, ParserRegistry, TokenParser, TokenStream, ValueParseError, ValueParser};
pub use schema::{HELP_NAME, HELP_SHORT, Schema, SchemaBuilder, SchemaError};
pub use spec::{ArgumentDecl, ArgumentId, ArgumentSpec, DefaultLiteral};
pub use value::{BoundValue, Value, ValueKind};
