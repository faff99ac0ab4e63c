use std::fmt;

use strum::{EnumIs, EnumTryAs};
use thiserror::Error;

/// A single located diagnostic produced by one of the textual front-ends.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParserError {
    pub message: String,
    pub start: usize,
    pub end: usize,
}

impl ParserError {
    pub fn new(message: impl Into<String>, span: std::ops::Range<usize>) -> Self {
        Self {
            message: message.into(),
            start: span.start,
            end: span.end,
        }
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at {}..{})", self.message, self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs, EnumTryAs, Error)]
pub enum Error {
    /// The predicate text could not be tokenized or is structurally malformed.
    #[error(
        "Failed to read predicate source: {} error(s) reported, first is \"{}\".",
        .errors.len(),
        .errors.first().map(|e| e.message.as_str()).unwrap_or("<none>")
    )]
    ParserErrors { errors: Vec<ParserError> },

    /// The tree contained no node at all.
    #[error("The predicate source does not contain any expression.")]
    EmptyExpression,

    /// A node received the wrong number of arguments.
    #[error("Node `{node}` expects {expected} but was given {given}.")]
    ArityMismatch {
        node: String,
        expected: String,
        given: String,
    },

    /// A combinator argument does not evaluate to a boolean.
    #[error(
        "Argument #{index} of `{node}` must be a boolean predicate, but it produces values of class `{found}`."
    )]
    NotBoolean {
        node: String,
        index: usize,
        found: String,
    },

    /// A method argument cannot be passed to the declared parameter type.
    #[error(
        "Argument #{index} of method `{method}` produces `{found}`, which is not assignable to parameter type `{expected}`."
    )]
    NotAssignable {
        method: String,
        index: usize,
        expected: String,
        found: String,
    },

    /// Quantifiers and `empty` need the subject to be a known collection.
    #[error(
        "Node `{node}` requires a List or Collection subject, but the known types are {types}."
    )]
    NotACollection { node: String, types: String },

    /// A reflective name resolved to no member.
    #[error("Unable to resolve `{name}` against the known types {types}.")]
    UnresolvedReference { name: String, types: String },

    /// No overload of a method accepts the given arguments.
    #[error("Method `{name}` has no overload matching the given arguments; candidates are {candidates:?}.")]
    NoMatchingOverload {
        name: String,
        candidates: Vec<String>,
    },

    /// More than one overload (or identity class) fits equally well.
    #[error("Reference `{name}` is ambiguous between {candidates:?}.")]
    AmbiguousReference {
        name: String,
        candidates: Vec<String>,
    },

    /// `this` could not settle on a single subject class.
    #[error("Unable to determine the subject class of `this` from the known types {types}: {reason}.")]
    UnresolvedIdentity { types: String, reason: String },

    /// A type descriptor or reference suffix could not be parsed.
    #[error("Malformed type descriptor `{descriptor}`: {reason}.")]
    MalformedType { descriptor: String, reason: String },

    /// A class name is not present in the registry.
    #[error("Unknown class or interface `{name}`.")]
    UnknownClass { name: String },

    /// A class with this name was already registered.
    #[error("A class named `{name}` is already registered.")]
    DuplicateClass { name: String },

    /// A literal could not be interpreted as the declared constant type.
    #[error("Invalid constant of type `{ty}` with value \"{value}\": {reason}.")]
    InvalidConstant {
        ty: String,
        value: String,
        reason: String,
    },

    /// Parsing recursed beyond the configured bound.
    #[error("The predicate is nested deeper than the maximum allowed depth of {max}.")]
    NestingTooDeep { max: usize },

    /// The type lattice reported an impossible combination; this is a defect in the lattice rules.
    #[error("Impossible type hierarchy while adding `{ty}` to {types}.")]
    ImpossibleHierarchy { ty: String, types: String },

    /// A `get` placeholder was bound to a value of an incompatible class.
    #[error("Constant `{key}` expects a value of class `{expected}`, but was given `{found}`.")]
    ConstTypeMismatch {
        key: String,
        expected: String,
        found: String,
    },

    /// Neither the paren nor the xml style was requested.
    #[error("Style flags {bits:#06b} select neither the paren nor the xml syntax.")]
    InvalidStyle { bits: u8 },
}

/// An [`Error`] together with the chain of node words that were being parsed
/// when it occurred, innermost first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParseError {
    pub error: Error,
    pub trace: Vec<String>,
}

impl ParseError {
    pub fn add_trace(mut self, word: impl Into<String>) -> Self {
        self.trace.push(word.into());
        self
    }
}

impl From<Error> for ParseError {
    fn from(error: Error) -> Self {
        Self {
            error,
            trace: Vec::new(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if !self.trace.is_empty() {
            write!(f, "\nTrace:")?;
            for word in &self.trace {
                write!(f, "\n    at \"{word}\"")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Raised while executing or operating a finished tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[error("Evaluation failed: {message}")]
pub struct EvalError {
    pub message: String,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type PredResult<T> = Result<T, ParseError>;
pub type EvalResult<T> = Result<T, EvalError>;
