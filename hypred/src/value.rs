//! Runtime values flowing through an evaluated predicate.
//!
//! Primitive values carry no class handle of their own; their class is the
//! matching builtin primitive of the [`ClassRegistry`](crate::registry::ClassRegistry).
//! Objects are shared [`Instance`]s tagged with the class they were created for.

use std::{collections::BTreeMap, fmt, sync::Arc};

use strum::{EnumIs, EnumTryAs};

use crate::registry::ClassId;

#[derive(Debug, Clone, EnumIs, EnumTryAs)]
pub enum Value {
    Null,
    Boolean(bool),
    Byte(i8),
    Char(char),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(Arc<str>),
    Object(Arc<Instance>),
}

/// An object of a registered class: named fields and, for collection
/// classes, an ordered list of elements.
#[derive(Debug, Clone)]
pub struct Instance {
    pub class: ClassId,
    pub fields: BTreeMap<String, Value>,
    pub elements: Option<Vec<Value>>,
}

impl Instance {
    pub fn new(class: ClassId) -> Self {
        Self {
            class,
            fields: BTreeMap::new(),
            elements: None,
        }
    }

    /// Creates a collection instance (list, set, ...) holding `elements`.
    pub fn collection(class: ClassId, elements: impl IntoIterator<Item = Value>) -> Self {
        Self {
            class,
            fields: BTreeMap::new(),
            elements: Some(elements.into_iter().collect()),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

impl Value {
    pub fn object(instance: Instance) -> Self {
        Value::Object(Arc::new(instance))
    }

    /// The class of the value, or `None` for [`Value::Null`].
    pub fn class(&self) -> Option<ClassId> {
        Some(match self {
            Value::Null => return None,
            Value::Boolean(_) => ClassId::BOOLEAN,
            Value::Byte(_) => ClassId::BYTE,
            Value::Char(_) => ClassId::CHAR,
            Value::Short(_) => ClassId::SHORT,
            Value::Int(_) => ClassId::INT,
            Value::Long(_) => ClassId::LONG,
            Value::Float(_) => ClassId::FLOAT,
            Value::Double(_) => ClassId::DOUBLE,
            Value::Str(_) => ClassId::STRING,
            Value::Object(instance) => instance.class,
        })
    }

    /// Elements of a collection value, if this value is one.
    pub fn elements(&self) -> Option<&[Value]> {
        match self {
            Value::Object(instance) => instance.elements.as_deref(),
            _ => None,
        }
    }

    /// Widens integral values for numeric comparisons.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Byte(v) => Some(v.into()),
            Value::Short(v) => Some(v.into()),
            Value::Int(v) => Some(v.into()),
            Value::Long(v) => Some(v),
            Value::Char(c) => Some(u32::from(c).into()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float(v) => Some(v.into()),
            Value::Double(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    /// Structural equality used when comparing constant nodes.
    ///
    /// Floating point values are compared bitwise, so a `NaN` constant is the
    /// same as itself. Objects are compared by identity.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "{v}"),
            Value::Short(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Double(v) => write!(f, "{v:?}"),
            Value::Str(v) => write!(f, "{v}"),
            Value::Object(instance) => write!(f, "<object of class #{}>", instance.class.0),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from! {
    bool => Boolean,
    i8 => Byte,
    char => Char,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value.into())
    }
}

impl From<Instance> for Value {
    fn from(value: Instance) -> Self {
        Value::object(value)
    }
}
