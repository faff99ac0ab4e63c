use std::fmt;

use log::trace;

use crate::{
    registry::{ClassId, ClassRegistry},
    types::{GuardUse, Outcome, Type, check_guard, compare},
};

/// Outcome of [`TypeList::add`], ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AddResult {
    /// The fact was already known; nothing changed.
    Ignored,
    /// The fact was recorded.
    Used,
    /// The fact contradicts what is known.
    Conflict,
    /// The lattice reported an impossible combination.
    Error,
}

/// Facts known about the subject at a point of parsing: an assumed type from
/// the enclosing context plus the facts accumulated by type tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeList {
    assumed: Type,
    known: Vec<Type>,
}

impl Default for TypeList {
    fn default() -> Self {
        Self::of_class(ClassId::OBJECT)
    }
}

impl TypeList {
    pub fn new(assumed: Type) -> Self {
        Self {
            assumed,
            known: Vec::new(),
        }
    }

    /// A fresh list assuming the subject is an instance of `class`.
    pub fn of_class(class: ClassId) -> Self {
        Self::new(Type::of(class))
    }

    pub fn assumed(&self) -> Type {
        self.assumed
    }

    pub fn known(&self) -> &[Type] {
        &self.known
    }

    /// Records `ty`, reconciling it with the assumed type first.
    pub fn add(&mut self, registry: &ClassRegistry, ty: Type) -> AddResult {
        let guard_use = check_guard(registry, self.assumed, ty);
        trace!("Adding {} under {}: {guard_use:?}", ty.fmt(registry, true), self.assumed.fmt(registry, true));
        match guard_use {
            GuardUse::Given => self.really_add(registry, ty),
            GuardUse::Guard => self.really_add(registry, self.assumed),
            GuardUse::Both => {
                let given = self.really_add(registry, ty);
                let guard = self.really_add(registry, self.assumed);
                given.max(guard)
            }
            GuardUse::NotGuard => self.really_add(registry, self.assumed.negate()),
            GuardUse::Conflict => AddResult::Conflict,
            GuardUse::Impossible => AddResult::Error,
        }
    }

    /// Merges `ty` into the known facts. The list is left untouched unless
    /// the merge succeeds.
    fn really_add(&mut self, registry: &ClassRegistry, ty: Type) -> AddResult {
        let mut known = self.known.clone();
        let mut used = false;
        let mut covered = false;

        let mut index = 0;
        while index < known.len() {
            match compare(registry, known[index], ty) {
                Outcome::AddsDetail => {}
                Outcome::Replace => {
                    used = true;
                    if covered {
                        known.remove(index);
                        continue;
                    }
                    known[index] = ty;
                    covered = true;
                }
                Outcome::NewRedundant => covered = true,
                Outcome::OldRedundant => {
                    used = true;
                    known.remove(index);
                    continue;
                }
                Outcome::Conflict => return AddResult::Conflict,
                Outcome::Impossible => return AddResult::Error,
            }
            index += 1;
        }

        if !covered {
            known.insert(0, ty);
            used = true;
        }
        self.known = known;
        if used { AddResult::Used } else { AddResult::Ignored }
    }

    pub fn fmt<'a>(&'a self, registry: &'a ClassRegistry) -> impl fmt::Display + 'a {
        struct Fmt<'a> {
            list: &'a TypeList,
            registry: &'a ClassRegistry,
        }

        impl fmt::Display for Fmt<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{{known: [")?;
                for (i, ty) in self.list.known.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", ty.fmt(self.registry, false))?;
                }
                write!(f, "], assumed: {}}}", self.list.assumed.fmt(self.registry, false))
            }
        }

        Fmt { list: self, registry }
    }
}
