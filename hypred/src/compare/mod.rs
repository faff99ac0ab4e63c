//! Structural comparison of predicate trees
//!
//! - [`equal`]: two trees denote the same predicate up to the order of
//!   conjunction and disjunction arguments.
//! - [`allow`]: a conservative implication check. `allow(a, b)` returning
//!   `true` means every subject satisfying `a` also satisfies `b`; `false`
//!   means the implication could not be established.

mod allow;
mod equal;

pub use allow::allow;
pub use equal::equal;
