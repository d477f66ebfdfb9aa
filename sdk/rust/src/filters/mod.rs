//! Predicate-to-filter-expression translation
//!
//! Compiles query predicates (comparisons, pattern matches, set membership,
//! null checks, boolean flags, raw fragments and nested groups) into the
//! OData filter syntax accepted by the search service's `filter` parameter.
//!
//! ## Usage
//!
//! ```
//! use azure_scout::filters::{Connective, FilterCompiler, Operator, PredicateNode};
//!
//! let tree = vec![
//!     PredicateNode::is_in("status", ["active", "pending"]),
//!     PredicateNode::group(
//!         Connective::And,
//!         vec![
//!             PredicateNode::basic("age", Operator::Ge, 18),
//!             PredicateNode::basic("age", Operator::Le, 65),
//!         ],
//!     ),
//! ];
//!
//! let filter = FilterCompiler::default().compile(&tree).unwrap();
//! assert_eq!(
//!     filter,
//!     "search.in(status, 'active,pending', ',') and (age ge 18 and age le 65)"
//! );
//! ```

mod compiler;
mod error;
mod literal;
mod parser;
mod types;

pub use compiler::{
    CompilerOptions, DEFAULT_MAX_DEPTH, FilterCompiler, compile, format_comparison,
    format_membership, format_pattern,
};
pub use error::FilterError;
pub use literal::{escape_literal, normalize_raw, quote_literal, unquote_literal};
pub use parser::{PredicateParser, parse_predicates};
pub use types::{Connective, Operator, PatternKind, PredicateNode, Scalar};
