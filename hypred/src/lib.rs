//! A typed predicate language over reflectively inspected subjects.
//!
//! Predicates are written in a paren or an XML syntax, resolved against a
//! [`ClassRegistry`](registry::ClassRegistry), simplified while they are
//! built, and can then be evaluated, bound, compared for structural equality
//! and checked for implication.
//!
//! ```
//! use std::sync::Arc;
//! use hypred::{operator::{OperatorFactory, Style}, registry::ClassRegistry};
//!
//! let factory = OperatorFactory::new(Arc::new(ClassRegistry::new()));
//! let narrow = factory.create_styled(Style::PAREN, "(and is:String (isEmpty))").unwrap();
//! let broad = factory.create_styled(Style::PAREN, "is:String").unwrap();
//! assert!(narrow.implies(&broad));
//! assert!(!broad.implies(&narrow));
//! ```

pub mod compare;
pub mod conf;
pub mod operator;
pub mod ops;
pub mod registry;
pub mod syntax;
pub mod types;
pub mod utils;
pub mod value;

pub use operator::{Operator, OperatorFactory, Style};
pub use utils::{Error, EvalError, ParseError};
