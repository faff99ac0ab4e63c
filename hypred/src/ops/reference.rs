use std::sync::Arc;

use either::Either;
use log::debug;

use crate::{
    ops::{Apply, Constant, MethodCall, Op, builder::OpBuilder, method_label},
    registry::{ClassId, ClassRegistry, FieldInfo, MethodInfo},
    syntax::VisitTokenizer,
    types::TypeList,
    utils::{Error, PredResult},
    value::Value,
};

/// A reflective reference `[Class:]name[-Param:Param...]`.
///
/// The qualifier restricts the lookup to that class; a parameter list
/// (possibly empty, written `name-`) selects one overload exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reference {
    pub qualifier: Option<ClassId>,
    pub name: String,
    pub params: Option<Vec<ClassId>>,
}

impl Reference {
    pub fn parse(registry: &ClassRegistry, word: &str) -> Result<Reference, Error> {
        let malformed = |reason: String| Error::MalformedType {
            descriptor: word.to_string(),
            reason,
        };
        let resolve = |name: &str| {
            registry
                .lookup(name)
                .ok_or_else(|| malformed(format!("unknown class `{name}`")))
        };

        let text = word.trim_start_matches(':');
        let (head, params) = match text.split_once('-') {
            Some((head, params)) => (head, Some(params)),
            None => (text, None),
        };
        let (qualifier, name) = match head.split_once(':') {
            Some((qualifier, name)) => (Some(resolve(qualifier)?), name),
            None => (None, head),
        };
        if name.is_empty() {
            return Err(malformed("missing member name".to_string()));
        }

        let params = match params {
            None => None,
            Some("") => Some(Vec::new()),
            Some(params) => Some(params.split(':').map(resolve).collect::<Result<_, _>>()?),
        };
        Ok(Reference {
            qualifier,
            name: name.to_string(),
            params,
        })
    }
}

fn foldable(value: &Option<Value>) -> Option<Value> {
    match value {
        Some(Value::Object(_)) => None,
        Some(value) => Some(value.clone()),
        None => Some(Value::Null),
    }
}

impl OpBuilder<'_> {
    /// Resolves a member reference against, in order: the positive known
    /// facts, the assumed class, `Object` when the assumed class is an
    /// interface, and finally the static members of the qualifier.
    pub(super) fn parse_reference(
        &mut self,
        tokens: &mut VisitTokenizer<'_>,
        word: &str,
        ctx: TypeList,
    ) -> PredResult<(Op, TypeList)> {
        let reference = Reference::parse(self.registry, word)?;

        let mut candidates: Vec<(ClassId, bool)> = ctx
            .known()
            .iter()
            .filter(|ty| !ty.negated)
            .map(|ty| (ty.class, false))
            .collect();
        let assumed = ctx.assumed();
        if !assumed.negated {
            candidates.push((assumed.class, false));
            if self.registry.is_interface(assumed.class) {
                candidates.push((ClassId::OBJECT, false));
            }
        }
        if let Some(qualifier) = reference.qualifier {
            candidates.push((qualifier, true));
        }

        for (class, is_static) in candidates {
            if let Some(step) = self.try_reference(tokens, &reference, class, is_static, &ctx)? {
                return Ok(step);
            }
        }
        Err(Error::UnresolvedReference {
            name: word.to_string(),
            types: ctx.fmt(self.registry).to_string(),
        }
        .into())
    }

    fn try_reference(
        &mut self,
        tokens: &mut VisitTokenizer<'_>,
        reference: &Reference,
        class: ClassId,
        is_static: bool,
        ctx: &TypeList,
    ) -> PredResult<Option<(Op, TypeList)>> {
        let class = match reference.qualifier {
            None => class,
            Some(qualifier) if qualifier == class => class,
            Some(qualifier) if self.registry.is_assignable(qualifier, class) => qualifier,
            Some(_) => return Ok(None),
        };
        let name = reference.name.as_str();

        match &reference.params {
            None => match self.registry.methods_named(class, name, is_static) {
                Some(Either::Left(method)) => return self.parse_method(tokens, method, ctx.clone()).map(Some),
                Some(Either::Right(overloads)) => {
                    return self.parse_overloaded(tokens, name, overloads, ctx.clone()).map(Some);
                }
                None => {}
            },
            Some(params) => {
                return match self.registry.method_exact(class, name, params, is_static) {
                    Some(method) => self.parse_method(tokens, method, ctx.clone()).map(Some),
                    None => Ok(None),
                };
            }
        }

        match self.registry.field(class, name, is_static) {
            Some(field) => self.parse_field(tokens, field, ctx.clone()).map(Some),
            None => Ok(None),
        }
    }

    /// Wraps `producer` with an optional consumer predicate `(member pred)`.
    fn parse_consumer(
        &mut self,
        tokens: &mut VisitTokenizer<'_>,
        node: &str,
        producer: Op,
        produced: TypeList,
        ctx: TypeList,
    ) -> PredResult<(Op, TypeList)> {
        let (consumer, _) = self.next_op(tokens, produced.clone())?;
        let Some(consumer) = consumer else {
            return Ok((producer, produced));
        };
        let consumer = self.boolean_arg(node, 0, consumer)?;
        self.expect_end(tokens, node, "at most one consumer predicate")?;
        let op = match consumer {
            Op::True | Op::False => consumer,
            consumer => Op::Apply(Apply::new(producer, consumer)),
        };
        Ok((op, ctx))
    }

    fn parse_field(&mut self, tokens: &mut VisitTokenizer<'_>, field: Arc<FieldInfo>, ctx: TypeList) -> PredResult<(Op, TypeList)> {
        let produced = TypeList::of_class(field.ty);
        let node = field.name.clone();
        let access = match foldable(&field.value) {
            Some(value) if field.is_static && field.is_final => {
                debug!("Folding static final field `{}` into a constant", field.name);
                Op::Constant(Constant {
                    class: field.ty,
                    value,
                })
            }
            _ => Op::FieldAccess(field),
        };
        self.parse_consumer(tokens, &node, access, produced, ctx)
    }

    pub(super) fn parse_method(
        &mut self,
        tokens: &mut VisitTokenizer<'_>,
        method: Arc<MethodInfo>,
        ctx: TypeList,
    ) -> PredResult<(Op, TypeList)> {
        let node = method_label(self.registry, &method, true);
        let produced = TypeList::of_class(method.ret);

        if method.params.is_empty() {
            let call = Op::MethodCall(MethodCall {
                method,
                args: Vec::new(),
            });
            return self.parse_consumer(tokens, &node, call, produced, ctx);
        }

        let expected = format!("{} argument(s)", method.params.len());
        let mut args = Vec::with_capacity(method.params.len());
        for (index, param) in method.params.iter().enumerate() {
            let (arg, _) = self.next_op(tokens, ctx.clone())?;
            let Some(arg) = arg else {
                return Err(Error::ArityMismatch {
                    node,
                    expected,
                    given: index.to_string(),
                }
                .into());
            };
            if !self.registry.is_assignable(*param, arg.return_class()) {
                return Err(Error::NotAssignable {
                    method: node,
                    index,
                    expected: self.registry.name(*param),
                    found: self.registry.name(arg.return_class()),
                }
                .into());
            }
            args.push(arg);
        }
        self.expect_end(tokens, &node, &expected)?;
        Ok((Op::MethodCall(MethodCall { method, args }), produced))
    }

    fn parse_overloaded(
        &mut self,
        tokens: &mut VisitTokenizer<'_>,
        name: &str,
        overloads: Vec<Arc<MethodInfo>>,
        ctx: TypeList,
    ) -> PredResult<(Op, TypeList)> {
        let registry = self.registry;
        let labels = |methods: &[&Arc<MethodInfo>]| -> Vec<String> {
            methods.iter().map(|m| method_label(registry, m, true)).collect()
        };

        if overloads.iter().any(|method| method.params.is_empty()) {
            return Err(Error::AmbiguousReference {
                name: name.to_string(),
                candidates: labels(&overloads.iter().collect::<Vec<_>>()),
            }
            .into());
        }

        // Arguments are read once to pick the overload, then again against
        // the chosen parameters.
        let start = tokens.mark();
        let mut args = Vec::new();
        while let (Some(arg), _) = self.next_op(tokens, ctx.clone())? {
            args.push(arg);
        }

        // 0 for an exact parameter match, 1 for each argument that is only assignable.
        let score = |method: &MethodInfo| -> Option<usize> {
            if method.params.len() != args.len() {
                return None;
            }
            method.params.iter().zip(&args).try_fold(0, |acc, (param, arg)| {
                let found = arg.return_class();
                match found == *param {
                    true => Some(acc),
                    false if registry.is_assignable(*param, found) => Some(acc + 1),
                    false => None,
                }
            })
        };
        let scored: Vec<(usize, &Arc<MethodInfo>)> = overloads
            .iter()
            .filter_map(|method| score(method.as_ref()).map(|s| (s, method)))
            .collect();

        let Some(best) = scored.iter().map(|(s, _)| *s).min() else {
            return Err(Error::NoMatchingOverload {
                name: name.to_string(),
                candidates: labels(&overloads.iter().collect::<Vec<_>>()),
            }
            .into());
        };
        let winners: Vec<&Arc<MethodInfo>> = scored
            .iter()
            .filter(|(s, _)| *s == best)
            .map(|(_, method)| *method)
            .collect();
        let [winner] = winners.as_slice() else {
            return Err(Error::AmbiguousReference {
                name: name.to_string(),
                candidates: labels(&winners),
            }
            .into());
        };

        let method = Arc::clone(winner);
        debug!("Resolved overloaded `{name}` to {}", method_label(registry, &method, true));
        tokens.reset(start);
        self.parse_method(tokens, method, ctx)
    }
}
