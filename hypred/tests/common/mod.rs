#![allow(dead_code)]

use std::sync::Arc;

use hypred::{
    Operator, OperatorFactory, Style,
    conf::FactoryConfig,
    registry::{ClassBuilder, ClassId, ClassRegistry},
    utils::EvalError,
    value::{Instance, Value},
};

fn age_of(this: &Value) -> Result<i32, EvalError> {
    this.try_as_object_ref()
        .and_then(|person| person.fields.get("age"))
        .and_then(|age| age.as_i64())
        .map(|age| age as i32)
        .ok_or_else(|| EvalError::new("person without an age"))
}

/// A registry with a small `demo` package on top of the builtin pool.
pub fn registry() -> Arc<ClassRegistry> {
    let registry = ClassRegistry::new();
    registry
        .define(
            ClassBuilder::class("demo.Person")
                .field("name", "String")
                .field("age", "int")
                .field("friends", "List")
                .constant("SPECIES", "String", "human")
                .static_field("population", "int", 42)
                .method("getName", &[], "String", |this, _| {
                    Ok(this
                        .try_as_object_ref()
                        .and_then(|person| person.fields.get("name").cloned())
                        .unwrap_or(Value::Null))
                })
                .method("isAdult", &[], "boolean", |this, _| Ok(Value::from(age_of(this)? >= 18)))
                .method("olderThan", &["int"], "boolean", |this, args| {
                    let limit = args[0].as_i64().unwrap_or_default();
                    Ok(Value::from(i64::from(age_of(this)?) > limit))
                })
                .method("greet", &["String"], "String", |_, args| Ok(Value::from(format!("hello {}", args[0]))))
                .method("greet", &["Object"], "String", |_, _| Ok(Value::from("hello stranger")))
                .method("pair", &["String", "Object"], "boolean", |_, _| Ok(Value::from(true)))
                .method("pair", &["Object", "String"], "boolean", |_, _| Ok(Value::from(false)))
                .method("describe", &[], "String", |_, _| Ok(Value::from("a person")))
                .method("describe", &["String"], "String", |_, args| Ok(Value::from(format!("a {}", args[0]))))
                .static_method("isValidName", &["String"], "boolean", |this, args| {
                    assert!(this.is_null());
                    Ok(Value::from(args[0].try_as_str_ref().is_some_and(|name| !name.is_empty())))
                }),
        )
        .expect("demo.Person should be definable");
    registry
        .define(
            ClassBuilder::class("demo.Employee")
                .extends("demo.Person")
                .field("company", "String"),
        )
        .expect("demo.Employee should be definable");
    Arc::new(registry)
}

pub fn config() -> FactoryConfig {
    FactoryConfig {
        packages: vec!["java.lang.".into(), "java.util.".into(), "demo.".into()],
        ..FactoryConfig::default()
    }
}

pub fn factory() -> OperatorFactory {
    OperatorFactory::with_config(registry(), config())
}

pub fn paren(text: &str) -> Operator {
    factory()
        .create_styled(Style::PAREN, text)
        .unwrap_or_else(|err| panic!("`{text}` should parse: {err}"))
}

pub fn class(factory: &OperatorFactory, name: &str) -> ClassId {
    factory.registry().resolve(name).expect("class should exist")
}

pub fn person(factory: &OperatorFactory, name: &str, age: i32) -> Value {
    Value::object(
        Instance::new(class(factory, "demo.Person"))
            .with_field("name", name)
            .with_field("age", age),
    )
}

pub fn list(factory: &OperatorFactory, elements: impl IntoIterator<Item = Value>) -> Value {
    Value::object(Instance::collection(class(factory, "ArrayList"), elements))
}
