//! The builtin class pool.
//!
//! Installation order is significant: the first classes land on the
//! identifiers exposed as constants on [`ClassId`](super::ClassId).

use std::cmp::Ordering;

use log::debug;

use crate::{
    registry::{ClassBuilder, ClassRegistry},
    utils::{Error, EvalError, EvalResult},
    value::Value,
};

fn arg(args: &[Value], index: usize) -> EvalResult<&Value> {
    args.get(index)
        .ok_or_else(|| EvalError::new(format!("missing argument #{index}")))
}

fn receiver_str(receiver: &Value) -> EvalResult<&str> {
    match receiver {
        Value::Str(s) => Ok(s),
        other => Err(EvalError::new(format!("expected a string receiver, got `{other}`"))),
    }
}

fn arg_str(args: &[Value], index: usize) -> EvalResult<&str> {
    receiver_str(arg(args, index)?)
}

fn receiver_elements(receiver: &Value) -> EvalResult<&[Value]> {
    receiver
        .elements()
        .ok_or_else(|| EvalError::new(format!("expected a collection receiver, got `{receiver}`")))
}

fn count(len: usize) -> Value {
    Value::Int(i32::try_from(len).unwrap_or(i32::MAX))
}

fn compare_numbers(a: &Value, b: &Value) -> EvalResult<Ordering> {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return Ok(a.cmp(&b));
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a
            .partial_cmp(&b)
            .ok_or_else(|| EvalError::new("comparison with NaN")),
        _ => Err(EvalError::new(format!("cannot compare `{a}` with `{b}`"))),
    }
}

fn object() -> ClassBuilder {
    ClassBuilder::class("java.lang.Object")
        .method("equals", &["Object"], "boolean", |this, args| {
            Ok(Value::Boolean(this.same(arg(args, 0)?)))
        })
        .method("toString", &[], "String", |this, _| Ok(Value::from(this.to_string())))
}

fn primitive(name: &str) -> ClassBuilder {
    let builder = ClassBuilder::primitive(name).method("equals", &[name], "boolean", |this, args| {
        Ok(Value::Boolean(this.same(arg(args, 0)?)))
    });
    if name == "boolean" {
        return builder;
    }
    builder
        .method("lessThan", &[name], "boolean", |this, args| {
            Ok(Value::Boolean(compare_numbers(this, arg(args, 0)?)?.is_lt()))
        })
        .method("greaterThan", &[name], "boolean", |this, args| {
            Ok(Value::Boolean(compare_numbers(this, arg(args, 0)?)?.is_gt()))
        })
}

fn string() -> ClassBuilder {
    ClassBuilder::class("java.lang.String")
        .final_class()
        .method("length", &[], "int", |this, _| Ok(count(receiver_str(this)?.chars().count())))
        .method("isEmpty", &[], "boolean", |this, _| Ok(Value::Boolean(receiver_str(this)?.is_empty())))
        .method("equals", &["Object"], "boolean", |this, args| {
            Ok(Value::Boolean(this.same(arg(args, 0)?)))
        })
        .method("equalsIgnoreCase", &["String"], "boolean", |this, args| {
            let (this, other) = (receiver_str(this)?, arg_str(args, 0)?);
            Ok(Value::Boolean(this.to_lowercase() == other.to_lowercase()))
        })
        .method("startsWith", &["String"], "boolean", |this, args| {
            Ok(Value::Boolean(receiver_str(this)?.starts_with(arg_str(args, 0)?)))
        })
        .method("endsWith", &["String"], "boolean", |this, args| {
            Ok(Value::Boolean(receiver_str(this)?.ends_with(arg_str(args, 0)?)))
        })
        .method("contains", &["String"], "boolean", |this, args| {
            Ok(Value::Boolean(receiver_str(this)?.contains(arg_str(args, 0)?)))
        })
        .method("indexOf", &["String"], "int", |this, args| {
            let this = receiver_str(this)?;
            Ok(match this.find(arg_str(args, 0)?) {
                Some(pos) => count(this[..pos].chars().count()),
                None => Value::Int(-1),
            })
        })
        .method("indexOf", &["char"], "int", |this, args| {
            let Value::Char(needle) = arg(args, 0)? else {
                return Err(EvalError::new("indexOf expects a char"));
            };
            Ok(match receiver_str(this)?.chars().position(|c| c == *needle) {
                Some(pos) => count(pos),
                None => Value::Int(-1),
            })
        })
        .method("compareTo", &["String"], "int", |this, args| {
            let ordering = receiver_str(this)?.cmp(arg_str(args, 0)?);
            Ok(Value::Int(ordering as i32))
        })
        .method("toUpperCase", &[], "String", |this, _| Ok(Value::from(receiver_str(this)?.to_uppercase())))
        .method("toLowerCase", &[], "String", |this, _| Ok(Value::from(receiver_str(this)?.to_lowercase())))
        .method("trim", &[], "String", |this, _| Ok(Value::from(receiver_str(this)?.trim())))
        .static_method("valueOf", &["int"], "String", |_, args| Ok(Value::from(arg(args, 0)?.to_string())))
}

fn collection() -> ClassBuilder {
    ClassBuilder::interface("java.util.Collection")
        .method("size", &[], "int", |this, _| Ok(count(receiver_elements(this)?.len())))
        .method("isEmpty", &[], "boolean", |this, _| {
            Ok(Value::Boolean(receiver_elements(this)?.is_empty()))
        })
        .method("contains", &["Object"], "boolean", |this, args| {
            let needle = arg(args, 0)?;
            Ok(Value::Boolean(receiver_elements(this)?.iter().any(|e| e.same(needle))))
        })
}

fn list() -> ClassBuilder {
    ClassBuilder::interface("java.util.List")
        .implements("Collection")
        .method("get", &["int"], "Object", |this, args| {
            let index = arg(args, 0)?
                .as_i64()
                .ok_or_else(|| EvalError::new("list index must be integral"))?;
            usize::try_from(index)
                .ok()
                .and_then(|index| receiver_elements(this).ok()?.get(index).cloned())
                .ok_or_else(|| EvalError::new(format!("list index {index} out of bounds")))
        })
        .method("indexOf", &["Object"], "int", |this, args| {
            let needle = arg(args, 0)?;
            Ok(match receiver_elements(this)?.iter().position(|e| e.same(needle)) {
                Some(pos) => count(pos),
                None => Value::Int(-1),
            })
        })
}

fn map() -> ClassBuilder {
    ClassBuilder::interface("java.util.Map")
        .method("size", &[], "int", |this, _| Ok(count(receiver_elements(this)?.len())))
        .method("isEmpty", &[], "boolean", |this, _| {
            Ok(Value::Boolean(receiver_elements(this)?.is_empty()))
        })
}

pub(super) fn install(registry: &ClassRegistry) -> Result<(), Error> {
    // The leading classes land on the identifiers fixed by `ClassId`.
    let mut pool = vec![object()];
    pool.extend(["boolean", "byte", "char", "short", "int", "long", "float", "double"].map(primitive));
    pool.extend([string(), collection(), list()]);
    pool.extend([
        ClassBuilder::interface("java.util.Set").implements("Collection"),
        map(),
        ClassBuilder::class("java.util.AbstractList").implements("List"),
        ClassBuilder::class("java.util.ArrayList").extends("AbstractList"),
        ClassBuilder::class("java.util.LinkedList").extends("AbstractList"),
        ClassBuilder::class("java.util.Vector").extends("AbstractList"),
        ClassBuilder::class("java.util.HashSet").implements("Set"),
        ClassBuilder::class("java.util.TreeSet").implements("Set"),
        ClassBuilder::class("java.util.HashMap").implements("Map"),
        ClassBuilder::class("java.util.TreeMap").implements("Map"),
        ClassBuilder::class("java.lang.Integer")
            .final_class()
            .constant("MAX_VALUE", "int", i32::MAX)
            .constant("MIN_VALUE", "int", i32::MIN),
        ClassBuilder::class("java.lang.Boolean").final_class(),
        ClassBuilder::class("java.lang.Exception"),
        ClassBuilder::class("java.lang.RuntimeException").extends("Exception"),
        ClassBuilder::class("java.lang.IllegalArgumentException").extends("RuntimeException"),
        ClassBuilder::class("java.lang.NullPointerException").extends("RuntimeException"),
    ]);
    let ids = registry.define_all(pool)?;
    debug!("Installed {} builtin classes", ids.len());
    Ok(())
}
