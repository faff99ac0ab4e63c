use hypred::{
    Error,
    registry::{ClassBuilder, ClassId, ClassRegistry},
    value::Value,
};

#[test]
fn builtin_names_resolve() {
    let registry = ClassRegistry::try_new().expect("builtin pool should install");
    assert!(!registry.is_empty());
    for (name, id) in [
        ("Object", ClassId::OBJECT),
        ("String", ClassId::STRING),
        ("java.lang.String", ClassId::STRING),
        ("int", ClassId::INT),
        ("List", ClassId::LIST),
    ] {
        assert_eq!(registry.resolve(name), Ok(id), "{name}");
    }
    let array_list = registry.resolve("ArrayList").unwrap();
    assert!(registry.is_assignable(ClassId::LIST, array_list));
    assert!(registry.is_assignable(ClassId::COLLECTION, array_list));
    assert!(registry.resolve("Nope").unwrap_err().is_unknown_class());
}

#[test]
fn classes_may_refer_to_each_other() {
    let registry = ClassRegistry::new();
    let ids = registry
        .define_all([
            ClassBuilder::class("shop.Order")
                .field("customer", "Customer")
                .method("next", &[], "Order", |_, _| Ok(Value::Null)),
            ClassBuilder::class("shop.Customer").field("last", "shop.Order"),
        ])
        .expect("mutually referring classes should be definable");
    let [order, customer] = ids.as_slice() else {
        panic!("expected two identifiers, got {ids:?}");
    };
    assert_eq!(registry.field(*order, "customer", false).unwrap().ty, *customer);
    assert_eq!(registry.field(*customer, "last", false).unwrap().ty, *order);
    let next = registry
        .methods_named(*order, "next", false)
        .and_then(|found| found.left())
        .unwrap();
    assert_eq!(next.ret, *order);
}

#[test]
fn failed_batches_register_nothing() {
    let registry = ClassRegistry::new();
    let before = registry.len();
    let err = registry
        .define_all([
            ClassBuilder::class("shop.Cart"),
            ClassBuilder::class("shop.Item").field("price", "Money"),
        ])
        .unwrap_err();
    assert_eq!(err, Error::UnknownClass { name: "Money".into() });
    assert_eq!(registry.len(), before);
    assert!(registry.lookup("shop.Cart").is_none());

    let err = registry
        .define_all([ClassBuilder::class("a.A").extends("a.B"), ClassBuilder::class("a.B").extends("a.A")])
        .unwrap_err();
    assert!(err.is_malformed_type(), "{err}");

    registry.define(ClassBuilder::class("shop.Cart")).unwrap();
    assert!(registry.define(ClassBuilder::class("shop.Cart")).unwrap_err().is_duplicate_class());
}

#[test]
fn views_share_classes_but_not_packages() {
    let registry = ClassRegistry::new();
    let shop = registry.with_packages(["java.lang.", "shop."]);
    let cart = shop.define(ClassBuilder::class("shop.Cart")).unwrap();

    assert_eq!(shop.lookup("Cart"), Some(cart));
    assert_eq!(registry.lookup("Cart"), None);
    assert_eq!(registry.lookup("shop.Cart"), Some(cart));
    assert_eq!(shop.display_name(cart, false), "Cart");
    assert_eq!(registry.display_name(cart, false), "shop.Cart");
    assert_eq!(shop.lookup("List"), None);
    assert_eq!(registry.len(), shop.len());
}
