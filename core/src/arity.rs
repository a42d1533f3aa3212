//! Occurrence counts and default-value policy.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::BoundValue;

/// How many occurrences an argument accepts.
///
/// Only [`Arity::ZeroOrOne`] and [`Arity::ZeroOrMany`] ever supply a default;
/// a missing [`Arity::One`] or [`Arity::OneOrMany`] argument is an error.
///
/// # Examples
///
/// ```
/// use cmdbind_core::{Arity, BoundValue};
///
/// assert!(Arity::ZeroOrMany.is_many());
/// assert!(!Arity::ZeroOrOne.is_mandatory());
/// assert_eq!(Arity::One.get_default(None), None);
/// assert_eq!(
///     Arity::ZeroOrMany.get_default(None),
///     Some(BoundValue::Many(Vec::new()))
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arity {
    /// Exactly one occurrence.
    #[default]
    One,
    /// Zero or one occurrence; falls back to the declared default.
    ZeroOrOne,
    /// At least one occurrence, accumulated in order.
    OneOrMany,
    /// Any number of occurrences, accumulated in order; defaults to empty.
    ZeroOrMany,
}

impl Arity {
    /// Returns `true` if occurrences accumulate into a sequence.
    pub fn is_many(self) -> bool {
        matches!(self, Self::OneOrMany | Self::ZeroOrMany)
    }

    /// Returns `true` if absence of the argument is an error.
    pub fn is_mandatory(self) -> bool {
        matches!(self, Self::One | Self::OneOrMany)
    }

    /// Returns the value bound when the argument never occurs.
    ///
    /// `ZeroOrOne` without a declared default binds [`BoundValue::Absent`];
    /// `ZeroOrMany` without one binds the empty sequence.
    pub fn get_default(self, declared: Option<&BoundValue>) -> Option<BoundValue> {
        match self {
            Self::One | Self::OneOrMany => None,
            Self::ZeroOrOne => Some(declared.cloned().unwrap_or(BoundValue::Absent)),
            Self::ZeroOrMany => Some(
                declared
                    .cloned()
                    .unwrap_or_else(|| BoundValue::Many(Vec::new())),
            ),
        }
    }

    /// Postfix appended to the syntax description in usage text.
    pub fn postfix(self) -> &'static str {
        match self {
            Self::One => "",
            Self::ZeroOrOne => "?",
            Self::OneOrMany | Self::ZeroOrMany => "[]",
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::One => "one",
            Self::ZeroOrOne => "zero_or_one",
            Self::OneOrMany => "one_or_many",
            Self::ZeroOrMany => "zero_or_many",
        };
        f.write_str(name)
    }
}
