use strum::EnumIs;

use crate::{
    registry::{ClassId, ClassRegistry},
    types::Type,
};

/// How the classes of two type facts relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs)]
pub enum Hierarchy {
    Equal,
    /// The first class is a subtype of the second.
    OneInstanceofTwo,
    /// The second class is a subtype of the first.
    TwoInstanceofOne,
    Unrelated,
}

/// Result of confronting a new fact with an already known one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs)]
pub enum Outcome {
    /// The new fact adds information without subsuming the old one.
    AddsDetail,
    /// The new fact is strictly stronger and supersedes the old one.
    Replace,
    /// The new fact follows from the old one.
    NewRedundant,
    /// The old fact follows from the new one.
    OldRedundant,
    /// Both facts cannot hold together.
    Conflict,
    /// The class relation itself is impossible (e.g. an interface extending a
    /// class other than `Object`).
    Impossible,
}

pub fn hierarchy(registry: &ClassRegistry, one: ClassId, two: ClassId) -> Hierarchy {
    if one == two {
        Hierarchy::Equal
    } else if registry.is_assignable(two, one) {
        Hierarchy::OneInstanceofTwo
    } else if registry.is_assignable(one, two) {
        Hierarchy::TwoInstanceofOne
    } else {
        Hierarchy::Unrelated
    }
}

/// Compares a known fact `old` with a `new` one.
///
/// The result depends on the negation of both facts, whether each class is an
/// interface, their [`Hierarchy`], and for unrelated classes whether the class
/// side is final.
pub fn compare(registry: &ClassRegistry, old: Type, new: Type) -> Outcome {
    use Hierarchy::*;
    use Outcome::*;

    let old_iface = registry.is_interface(old.class);
    let new_iface = registry.is_interface(new.class);
    let old_is_object = old.class == ClassId::OBJECT;
    let new_is_object = new.class == ClassId::OBJECT;
    let old_final = || registry.is_final(old.class);
    let new_final = || registry.is_final(new.class);
    let relation = hierarchy(registry, old.class, new.class);

    // Pick `when_object` if the class side is `Object`, the only class an
    // interface may be a subtype of.
    let object_or = |is_object: bool, when_object: Outcome| if is_object { when_object } else { Impossible };

    match (old.negated, old_iface, new.negated, new_iface) {
        // is:Class / is:Class
        (false, false, false, false) => match relation {
            Equal | OneInstanceofTwo => NewRedundant,
            TwoInstanceofOne => Replace,
            Unrelated => Conflict,
        },
        // is:Class / is:Interface
        (false, false, false, true) => match relation {
            Equal => Impossible,
            OneInstanceofTwo => NewRedundant,
            TwoInstanceofOne => object_or(old_is_object, AddsDetail),
            Unrelated if old_final() => Conflict,
            Unrelated => AddsDetail,
        },
        // is:Class / is:Not:Class
        (false, false, true, false) => match relation {
            Equal | OneInstanceofTwo => Conflict,
            TwoInstanceofOne => AddsDetail,
            Unrelated => NewRedundant,
        },
        // is:Class / is:Not:Interface
        (false, false, true, true) => match relation {
            Equal => Impossible,
            OneInstanceofTwo => Conflict,
            TwoInstanceofOne => object_or(old_is_object, AddsDetail),
            Unrelated if old_final() => NewRedundant,
            Unrelated => AddsDetail,
        },
        // is:Interface / is:Class
        (false, true, false, false) => match relation {
            Equal => Impossible,
            OneInstanceofTwo => object_or(new_is_object, NewRedundant),
            TwoInstanceofOne => OldRedundant,
            Unrelated if new_final() => Conflict,
            Unrelated => AddsDetail,
        },
        // is:Interface / is:Interface
        (false, true, false, true) => match relation {
            Equal | OneInstanceofTwo => NewRedundant,
            TwoInstanceofOne => Replace,
            Unrelated => AddsDetail,
        },
        // is:Interface / is:Not:Class
        (false, true, true, false) => match relation {
            Equal => Impossible,
            OneInstanceofTwo => object_or(new_is_object, Conflict),
            TwoInstanceofOne => AddsDetail,
            Unrelated if new_final() => NewRedundant,
            Unrelated => AddsDetail,
        },
        // is:Interface / is:Not:Interface
        (false, true, true, true) => match relation {
            Equal | OneInstanceofTwo => Conflict,
            TwoInstanceofOne | Unrelated => AddsDetail,
        },
        // is:Not:Class / is:Class
        (true, false, false, false) => match relation {
            Equal | TwoInstanceofOne => Conflict,
            OneInstanceofTwo => AddsDetail,
            Unrelated => OldRedundant,
        },
        // is:Not:Class / is:Interface
        (true, false, false, true) => match relation {
            Equal => Impossible,
            OneInstanceofTwo => AddsDetail,
            TwoInstanceofOne => object_or(old_is_object, Conflict),
            Unrelated if old_final() => OldRedundant,
            Unrelated => AddsDetail,
        },
        // is:Not:Class / is:Not:Class
        (true, false, true, false) => match relation {
            Equal | TwoInstanceofOne => NewRedundant,
            OneInstanceofTwo => Replace,
            Unrelated => AddsDetail,
        },
        // is:Not:Class / is:Not:Interface
        (true, false, true, true) => match relation {
            Equal => Impossible,
            OneInstanceofTwo => Replace,
            TwoInstanceofOne => object_or(old_is_object, NewRedundant),
            Unrelated => AddsDetail,
        },
        // is:Not:Interface / is:Class
        (true, true, false, false) => match relation {
            Equal => Impossible,
            OneInstanceofTwo => object_or(new_is_object, AddsDetail),
            TwoInstanceofOne => Conflict,
            Unrelated => AddsDetail,
        },
        // is:Not:Interface / is:Interface
        (true, true, false, true) => match relation {
            Equal | TwoInstanceofOne => Conflict,
            OneInstanceofTwo | Unrelated => AddsDetail,
        },
        // is:Not:Interface / is:Not:Class
        (true, true, true, false) => match relation {
            Equal => Impossible,
            OneInstanceofTwo => object_or(new_is_object, OldRedundant),
            TwoInstanceofOne => NewRedundant,
            Unrelated => AddsDetail,
        },
        // is:Not:Interface / is:Not:Interface
        (true, true, true, true) => match relation {
            Equal | TwoInstanceofOne => NewRedundant,
            OneInstanceofTwo => Replace,
            Unrelated => AddsDetail,
        },
    }
}

/// What to record when adding a fact to a context whose assumed type is
/// `guard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs)]
pub enum GuardUse {
    /// Record the new fact only.
    Given,
    /// Record the guard only.
    Guard,
    /// Record both the new fact and the guard.
    Both,
    /// Record the negation of the guard.
    NotGuard,
    Conflict,
    Impossible,
}

pub fn check_guard(registry: &ClassRegistry, guard: Type, new: Type) -> GuardUse {
    match compare(registry, new, guard) {
        Outcome::AddsDetail if new.negated => GuardUse::Given,
        Outcome::AddsDetail => GuardUse::Both,
        Outcome::Replace => GuardUse::Guard,
        Outcome::NewRedundant => GuardUse::Given,
        Outcome::OldRedundant if new.negated => GuardUse::Given,
        Outcome::OldRedundant => GuardUse::Guard,
        Outcome::Conflict if new.negated => GuardUse::NotGuard,
        Outcome::Conflict => GuardUse::Conflict,
        Outcome::Impossible => GuardUse::Impossible,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(registry: &ClassRegistry, descriptor: &str) -> Type {
        Type::parse(registry, descriptor).unwrap()
    }

    #[test]
    fn narrower_positive_class_replaces_broader() {
        let registry = ClassRegistry::new();
        let exception = ty(&registry, "is:Exception");
        let npe = ty(&registry, "is:NullPointerException");
        assert_eq!(compare(&registry, exception, npe), Outcome::Replace);
        assert_eq!(compare(&registry, npe, exception), Outcome::NewRedundant);
    }

    #[test]
    fn negated_interfaces_mirror_negated_classes() {
        let registry = ClassRegistry::new();
        let not_collection = ty(&registry, "is:Not:Collection");
        let not_list = ty(&registry, "is:Not:List");
        assert_eq!(compare(&registry, not_collection, not_list), Outcome::NewRedundant);
        assert_eq!(compare(&registry, not_list, not_collection), Outcome::Replace);
    }

    #[test]
    fn final_class_conflicts_with_unrelated_interface() {
        let registry = ClassRegistry::new();
        let string = ty(&registry, "is:String");
        let list = ty(&registry, "is:List");
        assert_eq!(compare(&registry, string, list), Outcome::Conflict);
        assert_eq!(compare(&registry, list, string), Outcome::Conflict);
        let vector = ty(&registry, "is:Vector");
        assert_eq!(compare(&registry, vector, ty(&registry, "is:Set")), Outcome::AddsDetail);
    }

    #[test]
    fn null_conflicts_with_any_class() {
        let registry = ClassRegistry::new();
        let null = ty(&registry, "is:Null");
        assert_eq!(compare(&registry, null, ty(&registry, "is:String")), Outcome::Conflict);
        assert_eq!(compare(&registry, null, ty(&registry, "is:List")), Outcome::Conflict);
        assert_eq!(compare(&registry, null, null), Outcome::NewRedundant);
        assert_eq!(compare(&registry, ty(&registry, "is:List"), Type::non_null()), Outcome::NewRedundant);
    }
}
