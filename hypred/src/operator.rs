//! Parsed predicates ready for evaluation and comparison.

use std::{fmt, sync::Arc};

use bitflags::bitflags;
use log::{debug, info};

use crate::{
    compare::{allow, equal},
    conf::FactoryConfig,
    ops::{Op, OpBuilder},
    registry::ClassRegistry,
    syntax::{BufferedVisitor, paren, xml},
    utils::{Error, EvalResult, PredResult},
    value::Value,
};

bitflags! {
    /// Syntax and printing options. [`Style::PAREN`] takes precedence over
    /// [`Style::XML`] when both are set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Style: u8 {
        const PAREN = 1 << 0;
        const XML = 1 << 1;
        const PRETTY = 1 << 2;
        const VERBOSE = 1 << 3;
    }
}

impl Style {
    pub const DEFAULT: Style = Style::XML.union(Style::PRETTY);
}

impl Default for Style {
    fn default() -> Self {
        Style::DEFAULT
    }
}

/// Creates [`Operator`]s from predicate text.
///
/// ```
/// use std::sync::Arc;
/// use hypred::{operator::{OperatorFactory, Style}, registry::ClassRegistry};
///
/// let factory = OperatorFactory::new(Arc::new(ClassRegistry::new()));
/// let op = factory
///     .create_styled(Style::PAREN, r#"(and is:String (equals "TEST"))"#)
///     .unwrap();
/// assert!(op.execute(&"TEST".into()).unwrap());
/// assert!(!op.execute(&"test".into()).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct OperatorFactory {
    registry: Arc<ClassRegistry>,
    config: FactoryConfig,
}

impl OperatorFactory {
    pub fn new(registry: Arc<ClassRegistry>) -> Self {
        Self::with_config(registry, FactoryConfig::default())
    }

    /// Creates a factory resolving simple class names in the configured
    /// packages. The classes of `registry` are shared, its packages are not.
    pub fn with_config(registry: Arc<ClassRegistry>, config: FactoryConfig) -> Self {
        let registry = Arc::new(registry.with_packages(config.packages.iter().cloned()));
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<ClassRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    pub fn default_style(&self) -> Style {
        self.config.style()
    }

    /// Parses `text` in the configured syntax.
    pub fn create(&self, text: &str) -> PredResult<Operator> {
        self.create_styled(self.default_style(), text)
    }

    pub fn create_styled(&self, style: Style, text: &str) -> PredResult<Operator> {
        let mut buffer = BufferedVisitor::new();
        if style.contains(Style::PAREN) {
            paren::parse(text, &mut buffer)?;
        } else if style.contains(Style::XML) {
            xml::parse_with_depth(text, self.config.max_depth, &mut buffer)?;
        } else {
            return Err(Error::InvalidStyle { bits: style.bits() }.into());
        }
        debug!("Read {} token(s) from predicate source", buffer.tokens().len());

        let mut tokens = buffer.tokenizer();
        let op = OpBuilder::new(&self.registry)
            .with_max_depth(self.config.max_depth)
            .build(&mut tokens)?;
        info!("Built predicate {}", op.to_paren(&self.registry, false, false));
        Ok(Operator {
            op,
            registry: self.registry.clone(),
        })
    }
}

/// A predicate together with the registry it was resolved against.
#[derive(Debug, Clone)]
pub struct Operator {
    op: Op,
    registry: Arc<ClassRegistry>,
}

impl Operator {
    pub fn new(op: Op, registry: Arc<ClassRegistry>) -> Self {
        Self { op, registry }
    }

    pub fn op(&self) -> &Op {
        &self.op
    }

    pub fn into_op(self) -> Op {
        self.op
    }

    pub fn execute(&self, subject: &Value) -> EvalResult<bool> {
        self.op.execute(&self.registry, subject)
    }

    pub fn operate(&self, subject: &Value) -> EvalResult<Value> {
        self.op.operate(&self.registry, subject)
    }

    /// Binds every `(get key ..)` placeholder named `key`.
    pub fn set_const(&mut self, key: &str, value: impl Into<Value>) -> Result<(), Error> {
        self.op.set_const(&self.registry, key, &value.into())
    }

    /// Whether every subject accepted by `self` is accepted by `other`.
    pub fn implies(&self, other: &Operator) -> bool {
        allow(&self.registry, &self.op, &other.op)
    }

    pub fn implied_by(&self, other: &Operator) -> bool {
        other.implies(self)
    }

    /// Whether one predicate implies the other, in either direction.
    pub fn allows(&self, other: &Operator) -> bool {
        self.implies(other) || other.implies(self)
    }

    pub fn equals(&self, other: &Operator) -> bool {
        equal(&self.op, &other.op)
    }

    pub fn to_string_styled(&self, style: Style) -> String {
        let pretty = style.contains(Style::PRETTY);
        let verbose = style.contains(Style::VERBOSE);
        if style.contains(Style::PAREN) || !style.contains(Style::XML) {
            self.op.to_paren(&self.registry, pretty, verbose)
        } else {
            self.op.to_xml(&self.registry, pretty, verbose)
        }
    }
}

impl PartialEq for Operator {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_styled(Style::DEFAULT))
    }
}
