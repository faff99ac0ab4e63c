use std::sync::Arc;

use crate::{registry::ClassKind, utils::EvalResult, value::Value};

use super::Invoker;

pub(super) struct FieldSpec {
    pub name: String,
    pub ty: String,
    pub is_static: bool,
    pub is_final: bool,
    pub value: Option<Value>,
}

pub(super) struct MethodSpec {
    pub name: String,
    pub params: Vec<String>,
    pub ret: String,
    pub is_static: bool,
    pub invoker: Invoker,
}

/// Declarative description of a class, registered with
/// [`ClassRegistry::define`](super::ClassRegistry::define).
///
/// Type names are resolved when the class is defined, so they may use the
/// simple name of any class in a default package or the name of the class
/// being built.
///
/// ```
/// use hypred::{registry::{ClassBuilder, ClassRegistry}, value::Value};
///
/// let registry = ClassRegistry::new();
/// let person = registry
///     .define(
///         ClassBuilder::class("demo.Person")
///             .field("name", "String")
///             .method("greeting", &[], "String", |_, _| Ok(Value::from("hello"))),
///     )
///     .unwrap();
/// assert!(registry.field(person, "name", false).is_some());
/// ```
pub struct ClassBuilder {
    pub(super) name: String,
    pub(super) kind: ClassKind,
    pub(super) is_final: bool,
    pub(super) superclass: Option<String>,
    pub(super) interfaces: Vec<String>,
    pub(super) fields: Vec<FieldSpec>,
    pub(super) methods: Vec<MethodSpec>,
}

impl ClassBuilder {
    fn with_kind(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_final: kind.is_primitive(),
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::with_kind(name, ClassKind::Class)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::with_kind(name, ClassKind::Interface)
    }

    pub(super) fn primitive(name: impl Into<String>) -> Self {
        Self::with_kind(name, ClassKind::Primitive)
    }

    pub fn final_class(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// An instance field, read from [`Instance::fields`](crate::value::Instance::fields).
    pub fn field(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            ty: ty.into(),
            is_static: false,
            is_final: false,
            value: None,
        });
        self
    }

    pub fn static_field(mut self, name: impl Into<String>, ty: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            ty: ty.into(),
            is_static: true,
            is_final: false,
            value: Some(value.into()),
        });
        self
    }

    /// A `static final` field. When its value is null, a string or a
    /// primitive, references to it are folded into constants while parsing.
    pub fn constant(mut self, name: impl Into<String>, ty: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            ty: ty.into(),
            is_static: true,
            is_final: true,
            value: Some(value.into()),
        });
        self
    }

    fn push_method<F>(mut self, name: impl Into<String>, params: &[&str], ret: impl Into<String>, is_static: bool, invoker: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        self.methods.push(MethodSpec {
            name: name.into(),
            params: params.iter().map(|p| p.to_string()).collect(),
            ret: ret.into(),
            is_static,
            invoker: Arc::new(invoker),
        });
        self
    }

    pub fn method<F>(self, name: impl Into<String>, params: &[&str], ret: impl Into<String>, invoker: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        self.push_method(name, params, ret, false, invoker)
    }

    /// A static method; its invoker receives [`Value::Null`] as receiver.
    pub fn static_method<F>(self, name: impl Into<String>, params: &[&str], ret: impl Into<String>, invoker: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        self.push_method(name, params, ret, true, invoker)
    }
}
