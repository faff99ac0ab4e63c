use crate::{
    ops::{CollectionKind, Op},
    registry::{ClassId, ClassRegistry, FieldInfo},
    types::Type,
    utils::{EvalError, EvalResult},
    value::Value,
};

fn as_bool(value: Value) -> EvalResult<bool> {
    match value {
        Value::Boolean(b) => Ok(b),
        other => Err(EvalError::new(format!("expected a boolean, got `{other}`"))),
    }
}

fn elements<'v>(kind: CollectionKind, node: &str, subject: &'v Value) -> EvalResult<&'v [Value]> {
    subject
        .elements()
        .ok_or_else(|| EvalError::new(format!("`{node}` expects a {kind:?} subject, got `{subject}`")))
}

fn type_test(registry: &ClassRegistry, ty: Type, subject: &Value) -> bool {
    match subject.class() {
        None => ty.negated,
        Some(class) => {
            let is_instance = ty.class == ClassId::OBJECT || registry.is_assignable(ty.class, class);
            is_instance != ty.negated
        }
    }
}

fn read_field(field: &FieldInfo, subject: &Value) -> EvalResult<Value> {
    if field.is_static {
        return Ok(field.value.clone().unwrap_or(Value::Null));
    }
    match subject {
        Value::Object(instance) => Ok(instance.fields.get(&field.name).cloned().unwrap_or(Value::Null)),
        Value::Null => Err(EvalError::new(format!("cannot read field `{}` of null", field.name))),
        other => Err(EvalError::new(format!("cannot read field `{}` of `{other}`", field.name))),
    }
}

impl Op {
    /// Evaluates a boolean node against `subject`.
    pub fn execute(&self, registry: &ClassRegistry, subject: &Value) -> EvalResult<bool> {
        match self {
            Op::True => Ok(true),
            Op::False => Ok(false),
            Op::And(args) => {
                for arg in args {
                    if !arg.execute(registry, subject)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Op::Or(args) => {
                for arg in args {
                    if arg.execute(registry, subject)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Op::Not(inner) => Ok(!inner.execute(registry, subject)?),
            Op::TypeTest(ty) => Ok(type_test(registry, *ty, subject)),
            Op::All(quantifier) => {
                if subject.is_null() {
                    return Ok(true);
                }
                for element in elements(quantifier.kind, "all", subject)? {
                    if !quantifier.predicate.execute(registry, element)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Op::Exists(quantifier) => {
                if subject.is_null() {
                    return Ok(false);
                }
                for element in elements(quantifier.kind, "exists", subject)? {
                    if quantifier.predicate.execute(registry, element)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Op::Empty(kind) => match subject {
                Value::Null => Ok(true),
                subject => Ok(elements(*kind, "empty", subject)?.is_empty()),
            },
            Op::Apply(apply) => {
                let value = apply.producer.operate(registry, subject)?;
                apply.consumer.execute(registry, &value)
            }
            Op::Constant(_) | Op::Get(_) | Op::FieldAccess(_) | Op::MethodCall(_) | Op::Identity(_) => {
                as_bool(self.operate(registry, subject)?)
            }
        }
    }

    /// Computes the value produced by a node for `subject`. Boolean nodes
    /// produce their truth value.
    pub fn operate(&self, registry: &ClassRegistry, subject: &Value) -> EvalResult<Value> {
        match self {
            Op::Constant(constant) => Ok(constant.value.clone()),
            Op::Get(get) => get
                .value
                .clone()
                .ok_or_else(|| EvalError::new(format!("constant `{}` was never bound", get.key))),
            Op::FieldAccess(field) => read_field(field, subject),
            Op::MethodCall(call) => {
                let args = call
                    .args
                    .iter()
                    .map(|arg| arg.operate(registry, subject))
                    .collect::<EvalResult<Vec<_>>>()?;
                let receiver = match (call.method.is_static, subject) {
                    (true, _) => &Value::Null,
                    (false, Value::Null) => {
                        return Err(EvalError::new(format!("cannot invoke `{}` on null", call.method.name)));
                    }
                    (false, subject) => subject,
                };
                call.method.invoke(receiver, &args).map_err(|err| {
                    EvalError::new(format!(
                        "`{}.{}` failed: {}",
                        registry.name(call.method.owner),
                        call.method.name,
                        err.message
                    ))
                })
            }
            Op::Identity(_) => Ok(subject.clone()),
            _ => self.execute(registry, subject).map(Value::Boolean),
        }
    }
}
