//! Predicate syntax
//!
//! Both textual front-ends, paren (`(and is:String (isEmpty))`) and XML
//! (`<and><is:String/><isEmpty/></and>`), describe the same tree and report it
//! as a flat stream of events to a [`TreeVisitor`]:
//!
//! - `word` opens a node named by the word,
//! - `constant` emits a literal leaf with an optional type name,
//! - `end` closes the most recently opened node,
//! - `end_of_tree` terminates the stream.
//!
//! Events are buffered (see [`BufferedVisitor`]) and consumed by the tree
//! builder through a [`VisitTokenizer`]. The same events drive the printers
//! ([`ParenPrinter`], [`XmlPrinter`]) when a finished tree is serialized.

mod buffer;
pub mod paren;
pub mod xml;

pub use buffer::{BufferedVisitor, Mark, Token, VisitTokenizer};
pub use paren::ParenPrinter;
pub use xml::XmlPrinter;

/// Receiver of tree events.
pub trait TreeVisitor {
    /// Verbose visitors receive fully qualified member and class names.
    fn is_verbose(&self) -> bool {
        false
    }

    fn visit_word(&mut self, word: &str);

    /// A literal. A missing `ty` denotes a plain string.
    fn visit_constant(&mut self, ty: Option<&str>, value: &str);

    fn visit_end(&mut self);

    fn visit_end_of_tree(&mut self) {}
}
