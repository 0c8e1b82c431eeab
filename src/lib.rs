//! S-expression query compiler
//!
//! Translates an s-expression query language into a backend-agnostic
//! [`QueryTree`] over an inverted-index mail database: field prefixes,
//! macros, saved queries, regular-expression and wildcard sub-queries,
//! range predicates, and user-defined headers all resolve here. The engine
//! that stores, indexes, and evaluates the resulting tree is reached only
//! through the narrow [`Backend`] collaborator interface — this crate never
//! touches storage, ranking, or ingestion.
//!
//! ```ignore
//! // Requires the `test-backend` feature for `StubBackend`; any `Backend`
//! // implementation works here.
//! use sexpquery::backend::stub::StubBackend;
//!
//! let backend = StubBackend::new();
//! let tree = sexpquery::compile(&backend, "(from alice)").unwrap();
//! println!("{tree:?}");
//! ```

pub mod backend;
pub mod environment;
pub mod error;
pub mod prefix_table;
pub mod query_tree;
pub mod sexp;
#[cfg(feature = "porter-stemmer")]
pub mod stemmer;
mod translator;

pub use backend::Backend;
pub use environment::Environment;
pub use error::{CompileError, CompileResult};
pub use prefix_table::{CombineOp, Initial, PrefixEntry, PrefixFlags, PREFIX_TABLE};
pub use query_tree::{Op, OpaqueQuery, OpaqueSource, QueryTree};
pub use sexp::{AtomKind, Sexp};
pub use translator::compile;
