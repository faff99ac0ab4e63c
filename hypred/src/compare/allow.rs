use log::warn;

use crate::{
    compare::equal,
    ops::Op,
    registry::{ClassId, ClassRegistry},
    types::Type,
};

/// Decomposes `b` when it is a conjunction or a disjunction.
fn against_combinator(registry: &ClassRegistry, a: &Op, b: &Op) -> bool {
    match b {
        Op::And(bs) => bs.iter().all(|b| allow(registry, a, b)),
        Op::Or(bs) => bs.iter().any(|b| allow(registry, a, b)),
        _ => false,
    }
}

/// Whether a type test is implied by membership in `class`.
fn implied_by_class(registry: &ClassRegistry, class: ClassId, b: &Op) -> bool {
    match b {
        Op::TypeTest(ty) => Type::of(class).implies(registry, *ty),
        _ => false,
    }
}

/// Every argument implies `b`, except type tests that a sibling non type-test
/// argument already implies, as in `(and is:X (X:method))`. The discounted
/// type tests may restrict which subjects reach the others, so this is an
/// approximation.
fn and_discounting_type_tests(registry: &ClassRegistry, args: &[Op], b: &Op) -> bool {
    let mut discounted = 0;
    for arg in args {
        if allow(registry, arg, b) {
            continue;
        }
        let redundant = arg.is_type_test()
            && args
                .iter()
                .any(|other| !other.is_type_test() && allow(registry, other, arg));
        if !redundant {
            return false;
        }
        discounted += 1;
    }
    if discounted > 0 {
        warn!("Implication established after discounting {discounted} redundant type test(s)");
    }
    true
}

/// Conservative implication: `true` only when every subject satisfying `a`
/// is known to satisfy `b`.
pub fn allow(registry: &ClassRegistry, a: &Op, b: &Op) -> bool {
    if equal(a, b) {
        return true;
    }

    match (a, b) {
        (Op::TypeTest(ta), Op::TypeTest(tb)) => ta.implies(registry, *tb),

        (Op::And(xs), Op::And(ys)) => ys.iter().all(|y| xs.iter().any(|x| allow(registry, x, y))),
        (Op::And(xs), Op::TypeTest(_)) => xs.iter().any(|x| allow(registry, x, b)),
        (Op::And(xs), _) => {
            and_discounting_type_tests(registry, xs, b)
                || xs.iter().any(|x| allow(registry, x, b))
                || against_combinator(registry, a, b)
        }

        (Op::Or(xs), _) => xs.iter().all(|x| allow(registry, x, b)),

        (Op::Not(x), Op::Not(y)) => allow(registry, y, x),

        (Op::All(x), Op::All(y)) | (Op::Exists(x), Op::Exists(y)) => {
            allow(registry, &x.predicate, &y.predicate)
        }
        (Op::All(_) | Op::Exists(_) | Op::Empty(_), Op::TypeTest(_)) => {
            implied_by_class(registry, ClassId::COLLECTION, b)
        }

        (Op::Apply(x), Op::Apply(y)) => {
            equal(&x.producer, &y.producer) && allow(registry, &x.consumer, &y.consumer)
        }

        (Op::MethodCall(call), Op::TypeTest(_)) if !call.method.is_static => {
            implied_by_class(registry, call.method.owner, b)
        }

        _ => against_combinator(registry, a, b),
    }
}
