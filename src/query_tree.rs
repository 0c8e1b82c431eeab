//! The compiled output query tree
//!
//! A [`QueryTree`] is the compiler's result: a backend-agnostic abstract
//! query built from a fixed operator alphabet plus opaque leaves handed back
//! verbatim from external collaborators (regex/date/lastmod/infix/named
//! queries, which the compiler never inspects).

use serde::{Deserialize, Serialize};

use crate::prefix_table::CombineOp;

/// The output of `compile`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryTree {
    /// Matches every document.
    MatchAll,
    /// Matches no document.
    MatchNothing,
    /// A single stemmed term, already carrying its field prefix.
    Term(String),
    /// A positional phrase: consecutive prefixed words.
    Phrase(Vec<String>),
    /// A prefix/wildcard match, already carrying its field prefix.
    Wildcard(String),
    /// An internal node combining children with one backend operator.
    Combine(Op, Vec<QueryTree>),
    /// An opaque leaf produced by an external collaborator (regex-to-query,
    /// date/lastmod-range-to-query, infix-parse, named-query, or
    /// query-expand). The compiler treats this as a black box.
    Opaque(OpaqueQuery),
}

/// The backend combinator of a [`QueryTree::Combine`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    And,
    Or,
    AndNot,
}

impl TryFrom<CombineOp> for Op {
    type Error = ();

    fn try_from(value: CombineOp) -> Result<Self, Self::Error> {
        match value {
            CombineOp::And => Ok(Self::And),
            CombineOp::Or => Ok(Self::Or),
            CombineOp::AndNot => Ok(Self::AndNot),
            CombineOp::Wildcard | CombineOp::Invalid => Err(()),
        }
    }
}

/// A value handed back verbatim by an external collaborator. The compiler
/// never constructs or inspects the payload — it only plumbs it through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpaqueQuery {
    /// Which collaborator produced this leaf (for diagnostics/`Debug`).
    pub source: OpaqueSource,
    /// The backend-specific payload, serialized as JSON so this crate stays
    /// independent of any concrete backend's query representation.
    pub payload: serde_json::Value,
}

/// Which external collaborator produced an [`OpaqueQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpaqueSource {
    Regex,
    DateRange,
    LastmodRange,
    Infix,
    NamedQuery,
    QueryExpand,
}

impl QueryTree {
    /// Fold `children` pairwise with `op`, starting from `initial` as the
    /// left operand of the first combination — `fold(op, i, [a, b, c])`
    /// builds `Combine(op, [Combine(op, [Combine(op, [i, a]), b]), c])`.
    ///
    /// This mirrors the reference design's recursive combiner, which
    /// folds one child into the accumulated query at a time rather than
    /// building a single flat n-ary node, and is non-short-circuiting:
    /// every child is combined even once the accumulator has already
    /// collapsed to `MatchNothing`. With no children the fold is just
    /// `initial` (the identity), matching `(and)` ⇒ `MatchAll` and
    /// `(or)` ⇒ `MatchNothing`.
    #[must_use]
    pub fn fold(op: Op, initial: Self, children: Vec<Self>) -> Self {
        children
            .into_iter()
            .fold(initial, |acc, child| Self::Combine(op, vec![acc, child]))
    }
}
