mod common;

use hypred::{
    ops::Op,
    value::{Instance, Value},
};

use common::{class, factory, list, paren, person};

#[test]
fn person_predicate() {
    let factory = factory();
    let op = paren(r#"(and is:Person (isAdult) (name (startsWith "A")))"#);

    assert!(op.execute(&person(&factory, "Alice", 30)).unwrap());
    assert!(!op.execute(&person(&factory, "Alex", 12)).unwrap());
    assert!(!op.execute(&person(&factory, "Bob", 40)).unwrap());
    assert!(!op.execute(&Value::from("Alice")).unwrap());
    assert!(!op.execute(&Value::Null).unwrap());
}

#[test]
fn subclass_instances_pass_type_tests() {
    let factory = factory();
    let employee = Value::object(
        Instance::new(class(&factory, "Employee"))
            .with_field("name", "Eve")
            .with_field("age", 51)
            .with_field("company", "ACME"),
    );
    let op = paren(r#"(and is:Person (olderThan (const "int" "50")))"#);
    assert!(op.execute(&employee).unwrap());
    assert!(paren(r#"(and is:Employee (company (equals "ACME")))"#).execute(&employee).unwrap());
    assert!(!paren("is:Employee").execute(&person(&factory, "Alice", 30)).unwrap());
}

#[test]
fn quantifiers_over_lists() {
    let factory = factory();
    let all = paren(r#"(and is:List (all (and is:String (startsWith "a"))))"#);
    assert!(all.execute(&list(&factory, ["ab".into(), "ac".into()])).unwrap());
    assert!(!all.execute(&list(&factory, ["ab".into(), "b".into()])).unwrap());
    assert!(!all.execute(&list(&factory, ["ab".into(), Value::from(3)])).unwrap());
    assert!(all.execute(&list(&factory, [])).unwrap());

    let exists = paren("(and is:List (exists is:Null))");
    assert!(exists.execute(&list(&factory, [Value::Null, "x".into()])).unwrap());
    assert!(!exists.execute(&list(&factory, ["x".into()])).unwrap());

    let empty = paren("(and is:List (empty))");
    assert!(empty.execute(&list(&factory, [])).unwrap());
    assert!(!empty.execute(&list(&factory, ["x".into()])).unwrap());
}

#[test]
fn quantifiers_on_null_subjects() {
    let op = paren("(and is:List (all (false)) (exists (true)) (empty))");
    let Op::And(args) = op.op() else {
        panic!("expected a conjunction");
    };
    let registry = common::registry();
    let results: Vec<bool> = args[1..]
        .iter()
        .map(|arg| arg.execute(&registry, &Value::Null).unwrap())
        .collect();
    assert_eq!(results, vec![true, false, true]);
}

#[test]
fn identity_and_string_methods() {
    assert!(paren(r#"(and is:String (apply (this) (equals "x")))"#).execute(&"x".into()).unwrap());
    assert!(
        paren(r#"(and is:String (apply (indexOf-char (const "char" "b")) (equals (const "int" "1"))))"#)
            .execute(&"abc".into())
            .unwrap()
    );
    assert!(
        paren(r#"(and is:String (length (greaterThan (const "int" "2"))))"#)
            .execute(&"abc".into())
            .unwrap()
    );

    let this = paren("(this)");
    assert_eq!(this.operate(&Value::from(7)).unwrap().try_as_int(), Some(7));
    let constant = paren(r#"(const "long" "-5")"#);
    assert_eq!(constant.operate(&Value::Null).unwrap().try_as_long(), Some(-5));
    assert!(constant.execute(&Value::Null).is_err());
}

#[test]
fn placeholders_bind_after_parsing() {
    let mut op = paren(r#"(and is:String (equals (get "expected")))"#);
    assert!(op.execute(&"TEST".into()).is_err());

    op.set_const("unrelated", 1).unwrap();
    op.set_const("expected", "TEST").unwrap();
    assert!(op.execute(&"TEST".into()).unwrap());
    assert!(!op.execute(&"test".into()).unwrap());

    let factory = factory();
    let mut typed = paren(r#"(and is:Person (olderThan (get "limit" "int")))"#);
    let err = typed.set_const("limit", "twenty").unwrap_err();
    assert!(err.is_const_type_mismatch(), "{err}");
    typed.set_const("limit", 20).unwrap();
    assert!(typed.execute(&person(&factory, "Alice", 30)).unwrap());
    assert!(!typed.execute(&person(&factory, "Alex", 12)).unwrap());
}

#[test]
fn evaluation_errors() {
    let factory = factory();
    let friends = paren("(and is:Person (friends (isEmpty)))");
    let err = friends.execute(&person(&factory, "Alice", 30)).unwrap_err();
    assert!(err.message.contains("isEmpty"), "{err}");

    let with_friends = Value::object(
        Instance::new(class(&factory, "Person"))
            .with_field("name", "Alice")
            .with_field("friends", list(&factory, [])),
    );
    assert!(friends.execute(&with_friends).unwrap());

    let adult = paren("(and is:Person (isAdult))");
    let ageless = Value::object(Instance::new(class(&factory, "Person")));
    let err = adult.execute(&ageless).unwrap_err();
    assert!(err.message.contains("isAdult"), "{err}");
}
