//! Type facts
//!
//! A [`Type`] is a possibly negated class membership fact about the subject of
//! a predicate, written `is:List`, `is:Not:String` or `is:Null`. The module is
//! split in three layers:
//!
//! - [`Type`] itself: parsing and printing of type descriptors.
//! - The lattice (see `compare.rs`): how a new fact relates to a known one,
//!   and how it interacts with the assumed type of a context.
//! - [`TypeList`] (see `list.rs`): the set of facts known about the subject at
//!   a given point of parsing, used to simplify type tests.

mod compare;
mod list;

use std::fmt;

pub use compare::{GuardUse, Hierarchy, Outcome, check_guard, compare, hierarchy};
pub use list::{AddResult, TypeList};

use crate::{
    registry::{ClassId, ClassRegistry},
    utils::Error,
};

const PREFIX: &str = "is:";
const NOT: &str = "not:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Type {
    pub negated: bool,
    pub class: ClassId,
}

impl Type {
    pub const fn new(negated: bool, class: ClassId) -> Self {
        Self { negated, class }
    }

    pub const fn of(class: ClassId) -> Self {
        Self::new(false, class)
    }

    /// The fact "is an Object", i.e. "is not null".
    pub const fn non_null() -> Self {
        Self::of(ClassId::OBJECT)
    }

    pub const fn negate(self) -> Self {
        Self::new(!self.negated, self.class)
    }

    /// Parses a descriptor such as `is:java.util.List`, `is:Not:List` or
    /// `is:Null`. Any number of case-insensitive `Not:` segments may follow
    /// the prefix, each toggling the negation.
    ///
    /// ```
    /// use hypred::{registry::{ClassId, ClassRegistry}, types::Type};
    ///
    /// let registry = ClassRegistry::new();
    /// let ty = Type::parse(&registry, "is:Not:List").unwrap();
    /// assert_eq!(ty, Type::new(true, ClassId::LIST));
    /// assert_eq!(Type::parse(&registry, "is:Null").unwrap(), Type::new(true, ClassId::OBJECT));
    /// ```
    pub fn parse(registry: &ClassRegistry, descriptor: &str) -> Result<Type, Error> {
        let malformed = |reason: &str| Error::MalformedType {
            descriptor: descriptor.to_string(),
            reason: reason.to_string(),
        };

        let mut rest = descriptor
            .strip_prefix(PREFIX)
            .ok_or_else(|| malformed("a type descriptor must start with `is:`, e.g. `is:java.util.List`"))?;
        let mut negated = false;
        while rest.get(..NOT.len()).is_some_and(|head| head.eq_ignore_ascii_case(NOT)) {
            negated = !negated;
            rest = &rest[NOT.len()..];
        }

        if rest.is_empty() {
            return Err(malformed("missing class name"));
        }
        if rest.eq_ignore_ascii_case("null") {
            return Ok(Type::new(!negated, ClassId::OBJECT));
        }
        Ok(Type::new(negated, registry.resolve(rest)?))
    }

    /// Whether knowing `self` makes `other` redundant.
    pub fn implies(self, registry: &ClassRegistry, other: Type) -> bool {
        compare(registry, self, other) == Outcome::NewRedundant
    }

    pub fn implied_by(self, registry: &ClassRegistry, other: Type) -> bool {
        other.implies(registry, self)
    }

    /// Renders the descriptor. `Object` is printed through its null form so
    /// that `is:Null` and `is:Not:Null` round-trip.
    pub fn fmt<'a>(&'a self, registry: &'a ClassRegistry, verbose: bool) -> impl fmt::Display + 'a {
        struct Fmt<'a> {
            ty: &'a Type,
            registry: &'a ClassRegistry,
            verbose: bool,
        }

        impl fmt::Display for Fmt<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.ty.class == ClassId::OBJECT {
                    return match self.ty.negated {
                        true => write!(f, "is:Null"),
                        false => write!(f, "is:Not:Null"),
                    };
                }
                write!(f, "{PREFIX}")?;
                if self.ty.negated {
                    write!(f, "Not:")?;
                }
                write!(f, "{}", self.registry.display_name(self.ty.class, self.verbose))
            }
        }

        Fmt {
            ty: self,
            registry,
            verbose,
        }
    }
}
