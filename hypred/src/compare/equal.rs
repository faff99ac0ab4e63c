use std::sync::Arc;

use crate::ops::Op;

/// Every argument on one side has an equal partner on the other.
fn same_members(a: &[Op], b: &[Op]) -> bool {
    let covers = |from: &[Op], to: &[Op]| from.iter().all(|x| to.iter().any(|y| equal(x, y)));
    covers(a, b) && covers(b, a)
}

pub fn equal(a: &Op, b: &Op) -> bool {
    match (a, b) {
        (Op::Constant(a), Op::Constant(b)) => a.class == b.class && a.value.same(&b.value),
        (Op::Get(a), Op::Get(b)) => a.key == b.key && a.class == b.class,
        (Op::True, Op::True) | (Op::False, Op::False) => true,
        (Op::And(a), Op::And(b)) | (Op::Or(a), Op::Or(b)) => same_members(a, b),
        (Op::Not(a), Op::Not(b)) => equal(a, b),
        (Op::All(a), Op::All(b)) | (Op::Exists(a), Op::Exists(b)) => equal(&a.predicate, &b.predicate),
        (Op::Empty(_), Op::Empty(_)) => true,
        (Op::TypeTest(a), Op::TypeTest(b)) => a == b,
        (Op::FieldAccess(a), Op::FieldAccess(b)) => Arc::ptr_eq(a, b) || a == b,
        (Op::MethodCall(a), Op::MethodCall(b)) => {
            (Arc::ptr_eq(&a.method, &b.method) || a.method == b.method)
                && a.args.len() == b.args.len()
                && a.args.iter().zip(&b.args).all(|(x, y)| equal(x, y))
        }
        (Op::Apply(a), Op::Apply(b)) => equal(&a.producer, &b.producer) && equal(&a.consumer, &b.consumer),
        (Op::Identity(_), Op::Identity(_)) => true,
        _ => false,
    }
}
