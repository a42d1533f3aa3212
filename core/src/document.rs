//! Serializable schema documents.
//!
//! A [`SchemaDocument`] is the file form of a schema: program metadata plus
//! a list of [`ArgumentDecl`]s. It round-trips through JSON (and YAML, via
//! any serde format) and builds into a [`Schema`].
//!
//! # Example JSON
//!
//! ```json
//! {
//!   "program": "copy",
//!   "description": "Copy files into a directory.",
//!   "arguments": [
//!     { "name": "target", "type": "directory", "position": 0 },
//!     { "name": "sources", "type": "path", "position": 1, "arity": "one_or_many" },
//!     { "name": "force", "short": "f", "type": "bool" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::{ArgumentDecl, ParserRegistry, Schema, SchemaBuilder, SchemaError};

/// Program metadata and argument declarations.
///
/// # Examples
///
/// ```
/// use cmdbind_core::*;
///
/// let document: SchemaDocument = serde_json::from_str(r#"{
///     "program": "copy",
///     "arguments": [
///         { "name": "target", "type": "directory", "position": 0 },
///         { "name": "force", "short": "f", "type": "bool" }
///     ]
/// }"#).unwrap();
/// let schema = document.build(&ParserRegistry::with_builtins()).unwrap();
/// assert_eq!(schema.program(), Some("copy"));
/// assert!(schema.lookup("-f").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Program name shown in usage text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    /// Program description shown in usage text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether to add the reserved `--help`/`-h` argument.
    #[serde(default = "default_help")]
    pub help: bool,
    /// Argument declarations in order.
    #[serde(default)]
    pub arguments: Vec<ArgumentDecl>,
}

fn default_help() -> bool {
    true
}

impl SchemaDocument {
    /// Creates an empty document with the help argument enabled.
    pub fn new() -> Self {
        Self {
            program: None,
            description: None,
            help: true,
            arguments: Vec::new(),
        }
    }

    /// Builder-style helper to append a declaration.
    pub fn with_argument(mut self, decl: ArgumentDecl) -> Self {
        self.arguments.push(decl);
        self
    }

    /// Converts the document into a builder using `registry`.
    pub fn to_builder(&self, registry: &ParserRegistry) -> SchemaBuilder {
        let mut builder = SchemaBuilder::new().with_registry(registry.clone());
        if let Some(program) = &self.program {
            builder = builder.program(program.clone());
        }
        if let Some(description) = &self.description {
            builder = builder.description(description.clone());
        }
        if !self.help {
            builder = builder.without_help();
        }
        builder.declare_all(self.arguments.iter().cloned())
    }

    /// Builds and validates the schema.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError`] found.
    pub fn build(&self, registry: &ParserRegistry) -> Result<Schema, SchemaError> {
        self.to_builder(registry).build()
    }
}

impl Default for SchemaDocument {
    fn default() -> Self {
        Self::new()
    }
}
