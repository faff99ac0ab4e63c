use hypred::{
    registry::ClassRegistry,
    types::{AddResult, GuardUse, Outcome, Type, TypeList, check_guard, compare},
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

fn ty(registry: &ClassRegistry, descriptor: &str) -> Type {
    Type::parse(registry, descriptor).expect("descriptor should parse")
}

const POOL: &[&str] = &[
    "Object",
    "String",
    "Exception",
    "RuntimeException",
    "NullPointerException",
    "IllegalArgumentException",
    "Collection",
    "List",
    "Set",
    "Map",
    "AbstractList",
    "ArrayList",
    "LinkedList",
    "Vector",
    "HashSet",
    "TreeSet",
    "HashMap",
    "Integer",
];

#[test]
fn descriptors() {
    let registry = ClassRegistry::new();
    assert_eq!(ty(&registry, "is:Not:Not:List"), ty(&registry, "is:List"));
    assert_eq!(ty(&registry, "is:NOT:null"), ty(&registry, "is:Not:Null"));
    assert_eq!(ty(&registry, "is:java.util.List"), ty(&registry, "is:List"));

    assert!(Type::parse(&registry, "List").unwrap_err().is_malformed_type());
    assert!(Type::parse(&registry, "is:").unwrap_err().is_malformed_type());
    assert!(Type::parse(&registry, "is:Nullable").unwrap_err().is_unknown_class());

    assert_eq!(ty(&registry, "is:Null").fmt(&registry, false).to_string(), "is:Null");
    assert_eq!(ty(&registry, "is:Not:Null").fmt(&registry, false).to_string(), "is:Not:Null");
    assert_eq!(ty(&registry, "is:Not:List").fmt(&registry, false).to_string(), "is:Not:List");
    assert_eq!(
        ty(&registry, "is:Not:List").fmt(&registry, true).to_string(),
        "is:Not:java.util.List"
    );
}

#[test]
fn lattice_cases() {
    let registry = ClassRegistry::new();
    let cases = [
        ("is:Exception", "is:NullPointerException", Outcome::Replace),
        ("is:NullPointerException", "is:Exception", Outcome::NewRedundant),
        ("is:String", "is:Exception", Outcome::Conflict),
        ("is:ArrayList", "is:List", Outcome::NewRedundant),
        ("is:String", "is:List", Outcome::Conflict),
        ("is:Exception", "is:List", Outcome::AddsDetail),
        ("is:List", "is:ArrayList", Outcome::OldRedundant),
        ("is:List", "is:Set", Outcome::AddsDetail),
        ("is:Collection", "is:List", Outcome::Replace),
        ("is:String", "is:Not:String", Outcome::Conflict),
        ("is:String", "is:Not:List", Outcome::NewRedundant),
        ("is:ArrayList", "is:Not:Set", Outcome::AddsDetail),
        ("is:Not:List", "is:Not:ArrayList", Outcome::NewRedundant),
        ("is:Not:ArrayList", "is:Not:List", Outcome::Replace),
        ("is:Not:Collection", "is:Not:List", Outcome::NewRedundant),
        ("is:Not:List", "is:Not:Collection", Outcome::Replace),
        ("is:Not:List", "is:Not:Set", Outcome::AddsDetail),
        ("is:Null", "is:String", Outcome::Conflict),
        ("is:Null", "is:List", Outcome::Conflict),
        ("is:Null", "is:Not:List", Outcome::NewRedundant),
        ("is:Not:String", "is:Vector", Outcome::OldRedundant),
    ];
    for (old, new, expected) in cases {
        assert_eq!(
            compare(&registry, ty(&registry, old), ty(&registry, new)),
            expected,
            "comparing known {old} with {new}"
        );
    }
}

#[test]
fn guard_uses() {
    let registry = ClassRegistry::new();
    let cases = [
        ("is:Not:Null", "is:String", GuardUse::Given),
        ("is:List", "is:Set", GuardUse::Both),
        ("is:ArrayList", "is:List", GuardUse::Guard),
        ("is:NullPointerException", "is:Exception", GuardUse::Guard),
        ("is:String", "is:Not:String", GuardUse::NotGuard),
        ("is:String", "is:List", GuardUse::Conflict),
        ("is:String", "is:Not:List", GuardUse::Given),
    ];
    for (guard, new, expected) in cases {
        assert_eq!(
            check_guard(&registry, ty(&registry, guard), ty(&registry, new)),
            expected,
            "adding {new} under {guard}"
        );
    }
}

#[test]
fn type_list_accumulates_facts() {
    let registry = ClassRegistry::new();
    let mut list = TypeList::default();

    assert_eq!(list.add(&registry, ty(&registry, "is:Exception")), AddResult::Used);
    assert_eq!(list.add(&registry, ty(&registry, "is:Not:Null")), AddResult::Ignored);
    assert_eq!(list.add(&registry, ty(&registry, "is:NullPointerException")), AddResult::Used);
    assert_eq!(list.known(), &[ty(&registry, "is:NullPointerException")]);
    assert_eq!(list.add(&registry, ty(&registry, "is:Exception")), AddResult::Ignored);
    assert_eq!(list.add(&registry, ty(&registry, "is:List")), AddResult::Used);
    assert_eq!(list.add(&registry, ty(&registry, "is:String")), AddResult::Conflict);
    assert_eq!(list.known().len(), 2);
}

#[test]
fn interface_is_replaced_by_implementing_class() {
    let registry = ClassRegistry::new();
    let mut list = TypeList::default();
    assert_eq!(list.add(&registry, ty(&registry, "is:List")), AddResult::Used);
    assert_eq!(list.add(&registry, ty(&registry, "is:ArrayList")), AddResult::Used);
    assert_eq!(list.known(), &[ty(&registry, "is:ArrayList")]);
}

#[test]
fn failed_add_leaves_list_untouched() {
    let registry = ClassRegistry::new();
    let mut list = TypeList::default();
    list.add(&registry, ty(&registry, "is:List"));
    list.add(&registry, ty(&registry, "is:Not:HashSet"));
    let before = list.clone();

    // Drops `is:Not:HashSet` first, then conflicts with `is:List`.
    assert_eq!(list.add(&registry, ty(&registry, "is:String")), AddResult::Conflict);
    assert_eq!(list, before);
}

#[test]
fn null_facts() {
    let registry = ClassRegistry::new();
    let mut list = TypeList::default();
    assert_eq!(list.add(&registry, ty(&registry, "is:Null")), AddResult::Used);
    assert_eq!(list.add(&registry, ty(&registry, "is:Not:String")), AddResult::Ignored);
    assert_eq!(list.add(&registry, ty(&registry, "is:String")), AddResult::Conflict);
    assert_eq!(list.add(&registry, ty(&registry, "is:Not:Null")), AddResult::Conflict);
}

#[test]
fn randomized_lattice_consistency() {
    let registry = ClassRegistry::new();
    let mut rng = ChaCha20Rng::seed_from_u64(0x5eed);
    let pick = |rng: &mut ChaCha20Rng| {
        let name = POOL[rng.random_range(0..POOL.len())];
        let ty = ty(&registry, &format!("is:{name}"));
        if rng.random_bool(0.5) { ty.negate() } else { ty }
    };

    for _ in 0..2000 {
        let a = pick(&mut rng);
        let b = pick(&mut rng);
        let forward = compare(&registry, a, b);

        assert_eq!(compare(&registry, a, a), Outcome::NewRedundant, "{a:?} against itself");
        assert_ne!(forward, Outcome::Impossible, "{a:?} against {b:?}");
        assert_eq!(
            forward == Outcome::Conflict,
            compare(&registry, b, a) == Outcome::Conflict,
            "conflicts are symmetric for {a:?} and {b:?}"
        );
        if forward == Outcome::NewRedundant {
            assert_eq!(
                compare(&registry, a, b.negate()),
                Outcome::Conflict,
                "{a:?} implies {b:?} so it contradicts its negation"
            );
        }
    }
}
