use crate::{
    ops::{Op, field_label, method_label},
    registry::{ClassId, ClassRegistry},
    syntax::{ParenPrinter, TreeVisitor, XmlPrinter},
};

fn node(registry: &ClassRegistry, visitor: &mut impl TreeVisitor, word: &str, children: &[&Op]) {
    visitor.visit_word(word);
    for child in children {
        child.accept(registry, visitor);
    }
    visitor.visit_end();
}

impl Op {
    /// Sends the tree to `visitor` as the events a front-end would produce
    /// when reading it back.
    pub fn accept(&self, registry: &ClassRegistry, visitor: &mut impl TreeVisitor) {
        let verbose = visitor.is_verbose();
        match self {
            Op::Constant(constant) => {
                let (ty, value) = constant.serialized(registry);
                visitor.visit_constant(ty.as_deref(), &value);
            }
            Op::Get(get) => {
                visitor.visit_word("get");
                visitor.visit_constant(None, &get.key);
                if get.class != ClassId::OBJECT {
                    visitor.visit_constant(None, &registry.name(get.class));
                }
                visitor.visit_end();
            }
            Op::True => node(registry, visitor, "true", &[]),
            Op::False => node(registry, visitor, "false", &[]),
            Op::And(args) => node(registry, visitor, "and", &args.iter().collect::<Vec<_>>()),
            Op::Or(args) => node(registry, visitor, "or", &args.iter().collect::<Vec<_>>()),
            Op::Not(inner) => node(registry, visitor, "not", &[inner.as_ref()]),
            Op::All(quantifier) => node(registry, visitor, "all", &[quantifier.predicate.as_ref()]),
            Op::Exists(quantifier) => node(registry, visitor, "exists", &[quantifier.predicate.as_ref()]),
            Op::Empty(_) => node(registry, visitor, "empty", &[]),
            Op::TypeTest(ty) => node(registry, visitor, &ty.fmt(registry, verbose).to_string(), &[]),
            Op::FieldAccess(field) => node(registry, visitor, &field_label(registry, field, verbose), &[]),
            Op::MethodCall(call) => node(
                registry,
                visitor,
                &method_label(registry, &call.method, verbose),
                &call.args.iter().collect::<Vec<_>>(),
            ),
            // Members without arguments take their consumer directly: `(length pred)`.
            Op::Apply(apply) => match (verbose, apply.producer.as_ref()) {
                (false, Op::FieldAccess(field)) => node(
                    registry,
                    visitor,
                    &field_label(registry, field, false),
                    &[apply.consumer.as_ref()],
                ),
                (false, Op::MethodCall(call)) if call.args.is_empty() => node(
                    registry,
                    visitor,
                    &method_label(registry, &call.method, false),
                    &[apply.consumer.as_ref()],
                ),
                _ => node(
                    registry,
                    visitor,
                    "apply",
                    &[apply.producer.as_ref(), apply.consumer.as_ref()],
                ),
            },
            Op::Identity(_) => node(registry, visitor, "this", &[]),
        }
    }

    pub fn to_paren(&self, registry: &ClassRegistry, pretty: bool, verbose: bool) -> String {
        let mut printer = ParenPrinter::new(pretty, verbose);
        self.accept(registry, &mut printer);
        printer.visit_end_of_tree();
        printer.finish()
    }

    pub fn to_xml(&self, registry: &ClassRegistry, pretty: bool, verbose: bool) -> String {
        let mut printer = XmlPrinter::new(pretty, verbose);
        self.accept(registry, &mut printer);
        printer.visit_end_of_tree();
        printer.finish()
    }
}
