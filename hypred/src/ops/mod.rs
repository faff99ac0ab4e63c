//! Predicate trees
//!
//! An [`Op`] is a node of a parsed predicate. Boolean nodes ([`Op::And`],
//! [`Op::TypeTest`], ...) are *executed* against a subject; value nodes
//! ([`Op::FieldAccess`], [`Op::MethodCall`], ...) are *operated* to produce a
//! new value, typically consumed by an [`Op::Apply`].
//!
//! Trees are produced by [`OpBuilder`] from a token stream, bound with
//! [`Op::set_const`], evaluated through [`Op::execute`] / [`Op::operate`] and
//! serialized back with [`Op::accept`].

mod builder;
mod constant;
mod eval;
mod reference;
mod serialize;

use std::sync::Arc;

use strum::{EnumDiscriminants, EnumIs};

pub use builder::{DEFAULT_MAX_DEPTH, OpBuilder};

use crate::{
    compare::equal,
    registry::{ClassId, ClassRegistry, FieldInfo, MethodInfo},
    types::Type,
    utils::Error,
    value::Value,
};

/// A literal of a primitive, string or null value.
#[derive(Debug, Clone)]
pub struct Constant {
    pub class: ClassId,
    pub value: Value,
}

/// A named placeholder, bound after parsing with [`Op::set_const`].
#[derive(Debug, Clone)]
pub struct Get {
    pub key: String,
    pub class: ClassId,
    pub value: Option<Value>,
}

impl Get {
    fn bind(&mut self, registry: &ClassRegistry, value: &Value) -> Result<(), Error> {
        if let Some(found) = value.class()
            && self.class != ClassId::OBJECT
            && !registry.is_assignable(self.class, found)
        {
            return Err(Error::ConstTypeMismatch {
                key: self.key.clone(),
                expected: registry.name(self.class),
                found: registry.name(found),
            });
        }
        self.value = Some(value.clone());
        Ok(())
    }
}

/// Which collection protocol a quantified subject was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    List,
    Collection,
}

#[derive(Debug, Clone)]
pub struct Quantifier {
    pub kind: CollectionKind,
    pub predicate: Box<Op>,
}

#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: Arc<MethodInfo>,
    pub args: Vec<Op>,
}

/// Evaluates `consumer` on the value produced by `producer`.
#[derive(Debug, Clone)]
pub struct Apply {
    pub producer: Box<Op>,
    pub consumer: Box<Op>,
}

impl Apply {
    pub fn new(producer: Op, consumer: Op) -> Self {
        Self {
            producer: Box::new(producer),
            consumer: Box::new(consumer),
        }
    }
}

#[derive(Debug, Clone, EnumIs, EnumDiscriminants)]
#[strum_discriminants(name(OpKind), derive(Hash, PartialOrd, Ord))]
pub enum Op {
    Constant(Constant),
    Get(Get),
    True,
    False,
    And(Vec<Op>),
    Or(Vec<Op>),
    Not(Box<Op>),
    /// Holds when the predicate holds for every element (or the subject is null).
    All(Quantifier),
    /// Holds when the predicate holds for some element of a non-null subject.
    Exists(Quantifier),
    /// Holds when the subject is null or has no element.
    Empty(CollectionKind),
    TypeTest(Type),
    FieldAccess(Arc<FieldInfo>),
    MethodCall(MethodCall),
    Apply(Apply),
    /// Returns the subject itself.
    Identity(ClassId),
}

impl PartialEq for Op {
    fn eq(&self, other: &Self) -> bool {
        equal(self, other)
    }
}

impl Op {
    pub fn kind(&self) -> OpKind {
        self.into()
    }

    /// Class of the values this node produces; boolean nodes produce `boolean`.
    pub fn return_class(&self) -> ClassId {
        match self {
            Op::Constant(constant) => constant.class,
            Op::Get(get) => get.class,
            Op::FieldAccess(field) => field.ty,
            Op::MethodCall(call) => call.method.ret,
            Op::Identity(class) => *class,
            _ => ClassId::BOOLEAN,
        }
    }

    pub fn is_boolean(&self) -> bool {
        self.return_class() == ClassId::BOOLEAN
    }

    /// Binds every `(get key ..)` placeholder named `key` to `value`.
    pub fn set_const(&mut self, registry: &ClassRegistry, key: &str, value: &Value) -> Result<(), Error> {
        match self {
            Op::Get(get) if get.key == key => get.bind(registry, value)?,
            Op::And(args) | Op::Or(args) => {
                for arg in args {
                    arg.set_const(registry, key, value)?;
                }
            }
            Op::Not(inner) => inner.set_const(registry, key, value)?,
            Op::All(quantifier) | Op::Exists(quantifier) => quantifier.predicate.set_const(registry, key, value)?,
            Op::MethodCall(call) => {
                for arg in &mut call.args {
                    arg.set_const(registry, key, value)?;
                }
            }
            Op::Apply(apply) => {
                apply.producer.set_const(registry, key, value)?;
                apply.consumer.set_const(registry, key, value)?;
            }
            _ => {}
        }
        Ok(())
    }
}

/// Name of a method as written in predicates. Static methods are qualified
/// by their declaring class, as is every method when `verbose`; overloaded
/// names carry their parameter list so that they resolve back to the same
/// method.
pub fn method_label(registry: &ClassRegistry, method: &MethodInfo, verbose: bool) -> String {
    let mut label = match (verbose, method.is_static) {
        (false, false) => method.name.clone(),
        _ => format!("{}:{}", registry.display_name(method.owner, verbose), method.name),
    };
    if registry.is_overloaded(method.owner, &method.name) {
        let params: Vec<String> = method.params.iter().map(|p| registry.display_name(*p, verbose)).collect();
        label.push('-');
        label.push_str(&params.join(":"));
    }
    label
}

pub fn field_label(registry: &ClassRegistry, field: &FieldInfo, verbose: bool) -> String {
    match (verbose, field.is_static) {
        (false, false) => field.name.clone(),
        (false, true) => format!("{}:{}", registry.display_name(field.owner, false), field.name),
        (true, _) => format!("{}:{}", registry.name(field.owner), field.name),
    }
}
