use std::iter;

use log::{error, trace};

use crate::{
    compare::equal,
    ops::{Apply, CollectionKind, Constant, Get, Op, Quantifier},
    registry::{ClassId, ClassRegistry},
    syntax::{Token, VisitTokenizer},
    types::{AddResult, Type, TypeList},
    utils::{Error, PredResult},
    value::Value,
};

/// Maximum node nesting accepted by [`OpBuilder`].
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// A parsed node (if any) and the type context it leaves behind for the next
/// sibling.
pub type Step = (Option<Op>, TypeList);

/// Recursive-descent builder turning a token stream into a simplified
/// [`Op`] tree.
///
/// Each parse call receives the [`TypeList`] of facts known about the current
/// subject and returns the list the following sibling should see. Branches
/// (`or` arguments, method arguments, quantified predicates) work on their own
/// copy.
pub struct OpBuilder<'r> {
    pub(super) registry: &'r ClassRegistry,
    max_depth: usize,
    depth: usize,
}

fn arity(node: &str, expected: impl Into<String>, given: impl Into<String>) -> Error {
    Error::ArityMismatch {
        node: node.to_string(),
        expected: expected.into(),
        given: given.into(),
    }
}

fn push_unique(args: &mut Vec<Op>, op: Op) {
    if !args.iter().any(|known| equal(known, &op)) {
        args.push(op);
    }
}

impl<'r> OpBuilder<'r> {
    pub fn new(registry: &'r ClassRegistry) -> Self {
        Self {
            registry,
            max_depth: DEFAULT_MAX_DEPTH,
            depth: 0,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Builds the first tree of the stream, assuming an `Object` subject.
    pub fn build(&mut self, tokens: &mut VisitTokenizer<'_>) -> PredResult<Op> {
        self.depth = 0;
        let (op, _) = self.next_op(tokens, TypeList::default())?;
        op.ok_or_else(|| Error::EmptyExpression.into())
    }

    /// Parses the next node, or returns `None` when the enclosing node ends.
    pub fn next_op(&mut self, tokens: &mut VisitTokenizer<'_>, ctx: TypeList) -> PredResult<Step> {
        match tokens.next_token() {
            Token::End | Token::EndOfTree => Ok((None, ctx)),
            Token::Constant { ty, value } => {
                let constant = Constant::parse(self.registry, ty.as_deref(), value)?;
                let ctx = TypeList::of_class(constant.class);
                Ok((Some(Op::Constant(constant)), ctx))
            }
            Token::Word(word) => {
                if self.depth >= self.max_depth {
                    return Err(Error::NestingTooDeep { max: self.max_depth }.into());
                }
                self.depth += 1;
                let result = self.parse_word(tokens, word, ctx);
                self.depth -= 1;
                match result {
                    Ok((op, ctx)) => Ok((Some(op), ctx)),
                    Err(err) => Err(err.add_trace(word.as_str())),
                }
            }
        }
    }

    fn parse_word(&mut self, tokens: &mut VisitTokenizer<'_>, word: &str, ctx: TypeList) -> PredResult<(Op, TypeList)> {
        trace!("Parsing `{word}` under {}", ctx.fmt(self.registry));
        match word {
            "const" => self.parse_const(tokens),
            "get" => self.parse_get(tokens),
            "all" => self.parse_quantifier(tokens, ctx, "all", Op::All),
            "exists" => self.parse_quantifier(tokens, ctx, "exists", Op::Exists),
            "empty" => self.parse_empty(tokens, ctx),
            "and" => self.parse_and(tokens, ctx),
            "or" => self.parse_or(tokens, ctx),
            "not" => self.parse_not(tokens, ctx),
            "true" => self.parse_leaf(tokens, "true", Op::True, ctx),
            "false" => self.parse_leaf(tokens, "false", Op::False, ctx),
            "apply" => self.parse_apply(tokens, ctx),
            "this" => self.parse_this(tokens, ctx),
            word if word.starts_with("is:") => self.parse_type_test(tokens, word, ctx),
            word => self.parse_reference(tokens, word, ctx),
        }
    }

    /// Consumes the end of a node that takes no further argument.
    pub(super) fn expect_end(&mut self, tokens: &mut VisitTokenizer<'_>, node: &str, expected: &str) -> PredResult<()> {
        match tokens.next_token() {
            Token::End | Token::EndOfTree => Ok(()),
            _ => Err(arity(node, expected, "more").into()),
        }
    }

    pub(super) fn boolean_arg(&self, node: &str, index: usize, op: Op) -> PredResult<Op> {
        if op.is_boolean() {
            return Ok(op);
        }
        Err(Error::NotBoolean {
            node: node.to_string(),
            index,
            found: self.registry.display_name(op.return_class(), true),
        }
        .into())
    }

    /// Parses and discards the remaining arguments of a node.
    fn skip_rest(&mut self, tokens: &mut VisitTokenizer<'_>, ctx: &TypeList) -> PredResult<()> {
        while let (Some(_), _) = self.next_op(tokens, ctx.clone())? {}
        Ok(())
    }

    /// Records a type fact and simplifies the test accordingly.
    fn add_type(&self, ctx: &mut TypeList, ty: Type) -> PredResult<Op> {
        match ctx.add(self.registry, ty) {
            AddResult::Ignored => Ok(Op::True),
            AddResult::Used => Ok(Op::TypeTest(ty)),
            AddResult::Conflict => Ok(Op::False),
            AddResult::Error => {
                let ty = ty.fmt(self.registry, true).to_string();
                let types = ctx.fmt(self.registry).to_string();
                error!("Type lattice reported an impossible hierarchy adding {ty} to {types}");
                Err(Error::ImpossibleHierarchy { ty, types }.into())
            }
        }
    }

    fn string_arg(&mut self, tokens: &mut VisitTokenizer<'_>, node: &str) -> PredResult<Option<String>> {
        match self.next_op(tokens, TypeList::default())? {
            (None, _) => Ok(None),
            (
                Some(Op::Constant(Constant {
                    value: Value::Str(value),
                    ..
                })),
                _,
            ) => Ok(Some(value.to_string())),
            (Some(other), _) => Err(Error::InvalidConstant {
                ty: "String".to_string(),
                value: format!("{:?}", other.kind()),
                reason: format!("`{node}` only accepts string literal arguments"),
            }
            .into()),
        }
    }

    fn parse_const(&mut self, tokens: &mut VisitTokenizer<'_>) -> PredResult<(Op, TypeList)> {
        let Some(first) = self.string_arg(tokens, "const")? else {
            return Err(arity("const", "a value or a type and a value", "none").into());
        };
        let constant = match self.string_arg(tokens, "const")? {
            None => Constant::string(first),
            Some(value) => {
                self.expect_end(tokens, "const", "a value or a type and a value")?;
                Constant::parse(self.registry, Some(&first), &value)?
            }
        };
        let ctx = TypeList::of_class(constant.class);
        Ok((Op::Constant(constant), ctx))
    }

    fn parse_get(&mut self, tokens: &mut VisitTokenizer<'_>) -> PredResult<(Op, TypeList)> {
        let Some(key) = self.string_arg(tokens, "get")? else {
            return Err(arity("get", "a key and an optional class name", "none").into());
        };
        let class = match self.string_arg(tokens, "get")? {
            None => ClassId::OBJECT,
            Some(name) => {
                self.expect_end(tokens, "get", "a key and an optional class name")?;
                self.registry.resolve(&name)?
            }
        };
        let get = Get {
            key,
            class,
            value: None,
        };
        Ok((Op::Get(get), TypeList::of_class(class)))
    }

    fn parse_leaf(&mut self, tokens: &mut VisitTokenizer<'_>, node: &str, op: Op, ctx: TypeList) -> PredResult<(Op, TypeList)> {
        self.expect_end(tokens, node, "no arguments")?;
        Ok((op, ctx))
    }

    fn parse_type_test(&mut self, tokens: &mut VisitTokenizer<'_>, word: &str, mut ctx: TypeList) -> PredResult<(Op, TypeList)> {
        self.expect_end(tokens, word, "no arguments")?;
        let ty = Type::parse(self.registry, word)?;
        let op = self.add_type(&mut ctx, ty)?;
        Ok((op, ctx))
    }

    /// Conjunction. Facts from type-test arguments are visible to the later
    /// arguments; the context is restored once the node is done.
    fn parse_and(&mut self, tokens: &mut VisitTokenizer<'_>, ctx: TypeList) -> PredResult<(Op, TypeList)> {
        let mut facts = ctx.clone();
        let mut args = Vec::new();
        let mut has_true = false;

        for index in 0.. {
            let (op, next) = self.next_op(tokens, facts.clone())?;
            let Some(op) = op else {
                break;
            };
            match self.boolean_arg("and", index, op)? {
                Op::True => has_true = true,
                Op::False => {
                    self.skip_rest(tokens, &facts)?;
                    return Ok((Op::False, ctx));
                }
                Op::And(inner) => inner.into_iter().for_each(|op| push_unique(&mut args, op)),
                op @ Op::TypeTest(_) => {
                    facts = next;
                    push_unique(&mut args, op);
                }
                op => push_unique(&mut args, op),
            }
        }

        let op = match args.len() {
            0 if has_true => Op::True,
            0 => Op::False,
            1 => args.pop().unwrap_or(Op::False),
            _ => Op::And(args),
        };
        Ok((op, ctx))
    }

    /// Disjunction. Every argument is parsed under a copy of the incoming
    /// context.
    fn parse_or(&mut self, tokens: &mut VisitTokenizer<'_>, ctx: TypeList) -> PredResult<(Op, TypeList)> {
        let mut args = Vec::new();

        for index in 0.. {
            let (op, _) = self.next_op(tokens, ctx.clone())?;
            let Some(op) = op else {
                break;
            };
            match self.boolean_arg("or", index, op)? {
                Op::True => {
                    self.skip_rest(tokens, &ctx)?;
                    return Ok((Op::True, ctx));
                }
                Op::False => {}
                Op::Or(inner) => inner.into_iter().for_each(|op| push_unique(&mut args, op)),
                op => push_unique(&mut args, op),
            }
        }

        let op = match args.len() {
            0 => Op::False,
            1 => args.pop().unwrap_or(Op::False),
            _ => Op::Or(args),
        };
        Ok((op, ctx))
    }

    fn parse_not(&mut self, tokens: &mut VisitTokenizer<'_>, mut ctx: TypeList) -> PredResult<(Op, TypeList)> {
        let (op, _) = self.next_op(tokens, ctx.clone())?;
        let op = op.ok_or_else(|| arity("not", "exactly one argument", "none"))?;
        let op = self.boolean_arg("not", 0, op)?;
        self.expect_end(tokens, "not", "exactly one argument")?;

        let op = match op {
            Op::Not(inner) => *inner,
            Op::True => Op::False,
            Op::False => Op::True,
            Op::TypeTest(ty) => self.add_type(&mut ctx, ty.negate())?,
            op => Op::Not(Box::new(op)),
        };
        Ok((op, ctx))
    }

    fn parse_apply(&mut self, tokens: &mut VisitTokenizer<'_>, ctx: TypeList) -> PredResult<(Op, TypeList)> {
        let (producer, produced) = self.next_op(tokens, ctx.clone())?;
        let producer = producer.ok_or_else(|| arity("apply", "exactly two arguments", "none"))?;
        let (consumer, _) = self.next_op(tokens, produced)?;
        let consumer = consumer.ok_or_else(|| arity("apply", "exactly two arguments", "one"))?;
        let consumer = self.boolean_arg("apply", 1, consumer)?;
        self.expect_end(tokens, "apply", "exactly two arguments")?;

        let op = match consumer {
            Op::True | Op::False => consumer,
            consumer => Op::Apply(Apply::new(producer, consumer)),
        };
        Ok((op, ctx))
    }

    /// Collection protocol of the subject, from the first positive fact that
    /// names a list or a collection.
    fn collection_kind(&self, ctx: &TypeList, node: &str) -> PredResult<CollectionKind> {
        let facts = ctx.known().iter().copied().chain(iter::once(ctx.assumed()));
        for ty in facts.filter(|ty| !ty.negated) {
            if self.registry.is_assignable(ClassId::LIST, ty.class) {
                return Ok(CollectionKind::List);
            }
            if self.registry.is_assignable(ClassId::COLLECTION, ty.class) {
                return Ok(CollectionKind::Collection);
            }
        }
        Err(Error::NotACollection {
            node: node.to_string(),
            types: ctx.fmt(self.registry).to_string(),
        }
        .into())
    }

    fn parse_quantifier(
        &mut self,
        tokens: &mut VisitTokenizer<'_>,
        ctx: TypeList,
        node: &str,
        make: fn(Quantifier) -> Op,
    ) -> PredResult<(Op, TypeList)> {
        let kind = self.collection_kind(&ctx, node)?;
        let (predicate, _) = self.next_op(tokens, TypeList::default())?;
        let predicate = predicate.ok_or_else(|| arity(node, "exactly one predicate", "none"))?;
        let predicate = self.boolean_arg(node, 0, predicate)?;
        self.expect_end(tokens, node, "exactly one predicate")?;

        let op = make(Quantifier {
            kind,
            predicate: Box::new(predicate),
        });
        Ok((op, ctx))
    }

    fn parse_empty(&mut self, tokens: &mut VisitTokenizer<'_>, ctx: TypeList) -> PredResult<(Op, TypeList)> {
        let kind = self.collection_kind(&ctx, "empty")?;
        self.expect_end(tokens, "empty", "no arguments")?;
        Ok((Op::Empty(kind), ctx))
    }

    /// `this`: the subject itself, typed by the most specific positive fact.
    fn parse_this(&mut self, tokens: &mut VisitTokenizer<'_>, ctx: TypeList) -> PredResult<(Op, TypeList)> {
        self.expect_end(tokens, "this", "no arguments")?;

        let facts = iter::once(ctx.assumed()).chain(ctx.known().iter().copied());
        let mut class: Option<ClassId> = None;
        for ty in facts.filter(|ty| !ty.negated) {
            class = match class {
                None => Some(ty.class),
                Some(current) if self.registry.is_assignable(current, ty.class) => Some(ty.class),
                Some(current) if self.registry.is_assignable(ty.class, current) => Some(current),
                Some(_) => {
                    return Err(Error::UnresolvedIdentity {
                        types: ctx.fmt(self.registry).to_string(),
                        reason: "the subject is known to be of several unrelated classes".to_string(),
                    }
                    .into());
                }
            };
        }

        let class = class.ok_or_else(|| Error::UnresolvedIdentity {
            types: ctx.fmt(self.registry).to_string(),
            reason: "no positive type is known".to_string(),
        })?;
        Ok((Op::Identity(class), ctx))
    }
}
