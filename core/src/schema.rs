//! Schema validation and lookup tables.
//!
//! [`SchemaBuilder`] collects argument specs (or declarations to resolve),
//! validates the structural invariants, and produces an immutable
//! [`Schema`]: a name table keyed by `--long` and `-short` tokens plus the
//! positional specs ordered by index.
//!
//! Building fails fast on the first violation. Callers build a schema once
//! at startup and treat failure as a programming error.
//!
//! # Examples
//!
//! ```
//! use cmdbind_core::*;
//!
//! let schema = SchemaBuilder::new()
//!     .program("sum")
//!     .declare(ArgumentDecl::new("first", "int").at_position(0))
//!     .declare(ArgumentDecl::new("rest", "int").at_position(1).with_arity(Arity::ZeroOrMany))
//!     .build()
//!     .unwrap();
//! assert_eq!(schema.positionals().count(), 2);
//! assert!(schema.lookup("--rest").is_some());
//! assert!(schema.lookup("-h").is_some());
//!
//! // A variadic positional must occupy the last slot.
//! let err = SchemaBuilder::new()
//!     .declare(ArgumentDecl::new("rest", "int").at_position(0).with_arity(Arity::ZeroOrMany))
//!     .declare(ArgumentDecl::new("last", "int").at_position(1))
//!     .build()
//!     .unwrap_err();
//! assert!(matches!(err, SchemaError::VariadicPositionalNotLast { .. }));
//! ```

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::debug;

use crate::{ArgumentDecl, ArgumentId, ArgumentSpec, Arity, ParserRegistry};

/// Long name of the reserved help argument.
pub const HELP_NAME: &str = "help";
/// Short name of the reserved help argument.
pub const HELP_SHORT: &str = "h";

/// Schema construction errors.
///
/// These indicate a broken schema definition, never bad user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Two arguments share a `--long` or `-short` token.
    #[error("duplicate argument name: {0}")]
    DuplicateName(String),
    /// Two positional arguments share an index.
    #[error("positional index {0} was used multiple times")]
    DuplicatePositionalIndex(usize),
    /// More than one positional argument accepts many values.
    #[error("multiple variadic positional arguments: {first} and {second}")]
    MultipleVariadicPositionals { first: String, second: String },
    /// The variadic positional argument is not the last positional slot.
    #[error("variadic positional argument '{name}' at index {index} must be the last positional argument")]
    VariadicPositionalNotLast { name: String, index: usize },
    /// No value parser is registered for the declared type.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),
    /// The declared default does not match the argument's type or arity.
    #[error("wrong default value for '{name}': expected {expected}")]
    WrongDefaultType { name: String, expected: String },
    /// A default was declared on an arity that never uses one.
    #[error("argument '{name}' with arity {arity} cannot declare a default")]
    DefaultNotAllowed { name: String, arity: Arity },
    /// A long or short name is empty, contains whitespace, or starts with `-`.
    #[error("invalid argument name: '{0}'")]
    InvalidName(String),
}

#[derive(Debug)]
enum Entry {
    Spec(ArgumentSpec),
    Decl(ArgumentDecl),
}

/// Collects and validates argument definitions.
#[derive(Debug)]
pub struct SchemaBuilder {
    program: Option<String>,
    description: Option<String>,
    entries: Vec<Entry>,
    registry: ParserRegistry,
    help: bool,
}

impl SchemaBuilder {
    /// Creates a builder with the built-in parsers and the reserved
    /// `--help`/`-h` argument.
    pub fn new() -> Self {
        Self {
            program: None,
            description: None,
            entries: Vec::new(),
            registry: ParserRegistry::with_builtins(),
            help: true,
        }
    }

    /// Sets the program name shown in usage text.
    pub fn program(mut self, name: impl Into<String>) -> Self {
        self.program = Some(name.into());
        self
    }

    /// Sets the program description shown in usage text.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replaces the registry used to resolve declarations.
    pub fn with_registry(mut self, registry: ParserRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Omits the reserved help argument.
    pub fn without_help(mut self) -> Self {
        self.help = false;
        self
    }

    /// Adds a resolved argument spec.
    pub fn argument(mut self, spec: ArgumentSpec) -> Self {
        self.entries.push(Entry::Spec(spec));
        self
    }

    /// Adds a declaration, resolved against the registry at build time.
    pub fn declare(mut self, decl: ArgumentDecl) -> Self {
        self.entries.push(Entry::Decl(decl));
        self
    }

    /// Adds several declarations in order.
    pub fn declare_all(mut self, decls: impl IntoIterator<Item = ArgumentDecl>) -> Self {
        self.entries.extend(decls.into_iter().map(Entry::Decl));
        self
    }

    /// Validates the definitions and builds the schema.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError`] found, checking in order: type
    /// resolution and defaults, name validity and uniqueness, positional
    /// index uniqueness, and the variadic-positional rules.
    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut specs = Vec::with_capacity(self.entries.len() + 1);
        for entry in self.entries {
            let spec = match entry {
                Entry::Spec(spec) => spec,
                Entry::Decl(decl) => decl.resolve(&self.registry)?,
            };
            specs.push(spec);
        }
        if self.help {
            specs.push(help_argument());
        }

        for (index, spec) in specs.iter_mut().enumerate() {
            spec.id = ArgumentId(index);
            spec.check_default()?;
        }

        let names = index_names(&specs)?;
        let positionals = order_positionals(&specs)?;
        let help = self.help.then(|| ArgumentId(specs.len() - 1));

        debug!(
            arguments = specs.len(),
            positionals = positionals.len(),
            "Built argument schema"
        );

        Ok(Schema {
            program: self.program,
            description: self.description,
            specs,
            names,
            positionals,
            help,
        })
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn help_argument() -> ArgumentSpec {
    ArgumentSpec::flag(HELP_NAME, false)
        .with_short(HELP_SHORT)
        .with_description("Show this help page.")
}

fn validate_name(name: &str) -> Result<(), SchemaError> {
    if name.is_empty() || name.starts_with('-') || name.chars().any(char::is_whitespace) {
        return Err(SchemaError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn index_names(specs: &[ArgumentSpec]) -> Result<HashMap<String, ArgumentId>, SchemaError> {
    let mut names = HashMap::new();
    for spec in specs {
        validate_name(spec.long_name())?;
        let long = format!("--{}", spec.long_name());
        if names.insert(long.clone(), spec.id()).is_some() {
            return Err(SchemaError::DuplicateName(long));
        }

        if let Some(short_name) = spec.short_name() {
            validate_name(short_name)?;
            let short = format!("-{short_name}");
            if names.insert(short.clone(), spec.id()).is_some() {
                return Err(SchemaError::DuplicateName(short));
            }
        }
    }
    Ok(names)
}

fn order_positionals(specs: &[ArgumentSpec]) -> Result<Vec<ArgumentId>, SchemaError> {
    let mut used = HashSet::new();
    let mut variadic: Option<&ArgumentSpec> = None;
    let mut last_index = 0;

    for spec in specs {
        let Some(index) = spec.positional_index() else {
            continue;
        };
        if !used.insert(index) {
            return Err(SchemaError::DuplicatePositionalIndex(index));
        }
        if spec.arity().is_many() {
            if let Some(first) = variadic {
                return Err(SchemaError::MultipleVariadicPositionals {
                    first: first.long_name().to_string(),
                    second: spec.long_name().to_string(),
                });
            }
            variadic = Some(spec);
        }
        last_index = last_index.max(index);
    }

    if let Some(spec) = variadic {
        let index = spec.positional_index().unwrap_or_default();
        if index != last_index {
            return Err(SchemaError::VariadicPositionalNotLast {
                name: spec.long_name().to_string(),
                index,
            });
        }
    }

    let mut positionals: Vec<&ArgumentSpec> =
        specs.iter().filter(|spec| spec.is_positional()).collect();
    positionals.sort_by_key(|spec| spec.positional_index());
    Ok(positionals.into_iter().map(ArgumentSpec::id).collect())
}

/// A validated, immutable argument schema.
///
/// Safe to share across threads; every parse owns its own accumulator.
#[derive(Debug, Clone)]
pub struct Schema {
    program: Option<String>,
    description: Option<String>,
    specs: Vec<ArgumentSpec>,
    names: HashMap<String, ArgumentId>,
    positionals: Vec<ArgumentId>,
    help: Option<ArgumentId>,
}

impl Schema {
    /// Creates a builder; shorthand for [`SchemaBuilder::new`].
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    pub fn program(&self) -> Option<&str> {
        self.program.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// All arguments in declaration order (the help argument last).
    pub fn arguments(&self) -> impl Iterator<Item = &ArgumentSpec> {
        self.specs.iter()
    }

    /// Positional arguments in ascending index order.
    pub fn positionals(&self) -> impl Iterator<Item = &ArgumentSpec> {
        self.positionals.iter().map(|id| self.spec(*id))
    }

    /// Returns the spec with the given identity.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different schema.
    pub fn spec(&self, id: ArgumentId) -> &ArgumentSpec {
        &self.specs[id.0]
    }

    /// Looks up a full `--long` or `-short` token.
    pub fn lookup(&self, token: &str) -> Option<&ArgumentSpec> {
        self.names.get(token).map(|id| self.spec(*id))
    }

    /// Finds an argument by its long name (without dashes).
    pub fn find(&self, long_name: &str) -> Option<&ArgumentSpec> {
        self.specs.iter().find(|spec| spec.long_name() == long_name)
    }

    /// The reserved help argument, unless it was disabled.
    pub fn help_argument(&self) -> Option<&ArgumentSpec> {
        self.help.map(|id| self.spec(id))
    }

    pub(crate) fn is_help(&self, id: ArgumentId) -> bool {
        self.help == Some(id)
    }

    /// Number of arguments, including the help argument.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
