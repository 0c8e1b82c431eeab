//! Static prefix table: the operator/field keyword alphabet
//!
//! Each entry governs one reserved head symbol: the backend combiner it
//! folds children with, the identity seed for that fold, and a bitset of
//! contextual flags that gate which dispatch rules apply. The table is
//! scanned linearly (bounded, ~25 entries) rather than hashed — matching
//! the reference design's own tradeoff, since the translator already does
//! one AST-sized pass per compile and the table is tiny by comparison.

use bitflags::bitflags;

bitflags! {
    /// Contextual flags attached to a prefix-table entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PrefixFlags: u32 {
        /// This head opens a field scope (`parent` becomes this entry).
        const FIELD    = 1 << 0;
        /// Terms under this field are opaque identifiers: no stemming, no
        /// lowercasing.
        const BOOLEAN  = 1 << 1;
        /// The tail must be exactly one basic atom.
        const SINGLE   = 1 << 2;
        /// `*` and `starts-with` are legal under this field.
        const WILDCARD = 1 << 3;
        /// `regex`/`rx` are legal under this field.
        const REGEX    = 1 << 4;
        /// This head itself dispatches to the regex-to-query helper.
        const DO_REGEX = 1 << 5;
        /// `matching`/`of` are legal under this field.
        const EXPAND   = 1 << 6;
        /// This head itself dispatches to the query-expansion helper.
        const DO_EXPAND = 1 << 7;
        /// This head is legal only at the top level (not inside any field).
        const ORPHAN   = 1 << 8;
        /// This head opens a range scope (`date`, `lastmod`).
        const RANGE    = 1 << 9;
        /// Bare atoms under this field have a trailing `/` stripped.
        const PATHNAME = 1 << 10;
    }
}

/// The backend combiner a prefix-table entry folds its children with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineOp {
    And,
    Or,
    AndNot,
    Wildcard,
    /// Not a simple fold — the head has its own dispatch rule (`date`,
    /// `infix`, `query`, `regex`, `rx`, `matching`, `of`).
    Invalid,
}

/// The left-identity seed injected before folding a combiner's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Initial {
    /// `MatchAll` — left-identity for `AND`.
    MatchAll,
    /// `MatchNothing` — left-identity for `OR`.
    MatchNothing,
}

/// One entry of the static prefix table.
#[derive(Debug, Clone, Copy)]
pub struct PrefixEntry {
    pub name: &'static str,
    pub op: CombineOp,
    pub initial: Initial,
    pub flags: PrefixFlags,
}

impl PrefixEntry {
    #[must_use]
    pub const fn has(&self, flags: PrefixFlags) -> bool {
        self.flags.contains(flags)
    }
}

macro_rules! entry {
    ($name:literal, $op:expr, $initial:expr, $flags:expr) => {
        PrefixEntry {
            name: $name,
            op: $op,
            initial: $initial,
            flags: $flags,
        }
    };
}

use CombineOp::{And, AndNot, Invalid, Or, Wildcard};
use Initial::{MatchAll, MatchNothing};

/// The fixed operator/field-keyword alphabet, in the order the reference
/// design embeds it (alphabetical by head symbol, `and`/`or`/`not` lead).
pub const PREFIX_TABLE: &[PrefixEntry] = &[
    entry!("and", And, MatchAll, PrefixFlags::empty()),
    entry!(
        "attachment",
        And,
        MatchAll,
        PrefixFlags::FIELD.union(PrefixFlags::WILDCARD).union(PrefixFlags::EXPAND)
    ),
    entry!("body", And, MatchAll, PrefixFlags::FIELD),
    entry!("date", Invalid, MatchAll, PrefixFlags::RANGE),
    entry!(
        "from",
        And,
        MatchAll,
        PrefixFlags::FIELD
            .union(PrefixFlags::WILDCARD)
            .union(PrefixFlags::REGEX)
            .union(PrefixFlags::EXPAND)
    ),
    entry!(
        "folder",
        Or,
        MatchNothing,
        PrefixFlags::FIELD
            .union(PrefixFlags::BOOLEAN)
            .union(PrefixFlags::WILDCARD)
            .union(PrefixFlags::REGEX)
            .union(PrefixFlags::EXPAND)
            .union(PrefixFlags::PATHNAME)
    ),
    entry!(
        "id",
        Or,
        MatchNothing,
        PrefixFlags::FIELD
            .union(PrefixFlags::BOOLEAN)
            .union(PrefixFlags::WILDCARD)
            .union(PrefixFlags::REGEX)
    ),
    entry!(
        "infix",
        Invalid,
        MatchAll,
        PrefixFlags::SINGLE.union(PrefixFlags::ORPHAN)
    ),
    entry!(
        "is",
        And,
        MatchAll,
        PrefixFlags::FIELD
            .union(PrefixFlags::BOOLEAN)
            .union(PrefixFlags::WILDCARD)
            .union(PrefixFlags::REGEX)
            .union(PrefixFlags::EXPAND)
    ),
    entry!("lastmod", Invalid, MatchAll, PrefixFlags::RANGE),
    entry!("matching", And, MatchAll, PrefixFlags::DO_EXPAND),
    entry!(
        "mid",
        Or,
        MatchNothing,
        PrefixFlags::FIELD
            .union(PrefixFlags::BOOLEAN)
            .union(PrefixFlags::WILDCARD)
            .union(PrefixFlags::REGEX)
    ),
    entry!(
        "mimetype",
        And,
        MatchAll,
        PrefixFlags::FIELD.union(PrefixFlags::WILDCARD).union(PrefixFlags::EXPAND)
    ),
    entry!("not", AndNot, MatchAll, PrefixFlags::empty()),
    entry!("of", And, MatchAll, PrefixFlags::DO_EXPAND),
    entry!("or", Or, MatchNothing, PrefixFlags::empty()),
    entry!(
        "path",
        Or,
        MatchNothing,
        PrefixFlags::FIELD
            .union(PrefixFlags::BOOLEAN)
            .union(PrefixFlags::WILDCARD)
            .union(PrefixFlags::REGEX)
            .union(PrefixFlags::PATHNAME)
    ),
    entry!(
        "property",
        And,
        MatchAll,
        PrefixFlags::FIELD
            .union(PrefixFlags::BOOLEAN)
            .union(PrefixFlags::WILDCARD)
            .union(PrefixFlags::REGEX)
            .union(PrefixFlags::EXPAND)
    ),
    entry!(
        "query",
        Invalid,
        MatchNothing,
        PrefixFlags::SINGLE.union(PrefixFlags::ORPHAN)
    ),
    entry!(
        "regex",
        Invalid,
        MatchAll,
        PrefixFlags::SINGLE.union(PrefixFlags::DO_REGEX)
    ),
    entry!(
        "rx",
        Invalid,
        MatchAll,
        PrefixFlags::SINGLE.union(PrefixFlags::DO_REGEX)
    ),
    entry!("starts-with", Wildcard, MatchAll, PrefixFlags::SINGLE),
    entry!(
        "subject",
        And,
        MatchAll,
        PrefixFlags::FIELD
            .union(PrefixFlags::WILDCARD)
            .union(PrefixFlags::REGEX)
            .union(PrefixFlags::EXPAND)
    ),
    entry!(
        "tag",
        And,
        MatchAll,
        PrefixFlags::FIELD
            .union(PrefixFlags::BOOLEAN)
            .union(PrefixFlags::WILDCARD)
            .union(PrefixFlags::REGEX)
            .union(PrefixFlags::EXPAND)
    ),
    entry!(
        "thread",
        Or,
        MatchNothing,
        PrefixFlags::FIELD
            .union(PrefixFlags::BOOLEAN)
            .union(PrefixFlags::WILDCARD)
            .union(PrefixFlags::REGEX)
            .union(PrefixFlags::EXPAND)
    ),
    entry!(
        "to",
        And,
        MatchAll,
        PrefixFlags::FIELD.union(PrefixFlags::WILDCARD).union(PrefixFlags::EXPAND)
    ),
];

/// Look up a reserved head symbol in the table.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static PrefixEntry> {
    PREFIX_TABLE.iter().find(|entry| entry.name == name)
}

/// Reserved head symbols, including `macro` which has no table entry but is
/// handled specially by the translator.
pub const RESERVED_HEADS: &[&str] = &[
    "and", "attachment", "body", "date", "from", "folder", "id", "infix", "is", "lastmod",
    "macro", "matching", "mid", "mimetype", "not", "of", "or", "path", "property", "query",
    "regex", "rx", "starts-with", "subject", "tag", "thread", "to",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_reserved_head_except_macro_has_an_entry() {
        for head in RESERVED_HEADS {
            if *head == "macro" {
                assert!(lookup(head).is_none());
            } else {
                assert!(lookup(head).is_some(), "missing table entry for {head}");
            }
        }
    }

    #[test]
    fn table_entries_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for entry in PREFIX_TABLE {
            assert!(seen.insert(entry.name), "duplicate entry {}", entry.name);
        }
    }

    #[test]
    fn and_or_not_have_no_flags() {
        assert_eq!(lookup("and").unwrap().flags, PrefixFlags::empty());
        assert_eq!(lookup("or").unwrap().flags, PrefixFlags::empty());
        assert_eq!(lookup("not").unwrap().flags, PrefixFlags::empty());
    }

    #[test]
    fn from_has_expected_flags() {
        let from = lookup("from").unwrap();
        assert!(from.has(PrefixFlags::FIELD));
        assert!(from.has(PrefixFlags::WILDCARD));
        assert!(from.has(PrefixFlags::REGEX));
        assert!(from.has(PrefixFlags::EXPAND));
        assert!(!from.has(PrefixFlags::BOOLEAN));
    }

    #[test]
    fn folder_is_boolean_and_pathname() {
        let folder = lookup("folder").unwrap();
        assert!(folder.has(PrefixFlags::BOOLEAN));
        assert!(folder.has(PrefixFlags::PATHNAME));
    }

    #[test]
    fn infix_and_query_are_orphan_single() {
        for name in ["infix", "query"] {
            let e = lookup(name).unwrap();
            assert!(e.has(PrefixFlags::ORPHAN));
            assert!(e.has(PrefixFlags::SINGLE));
        }
    }

    #[test]
    fn unknown_head_not_found() {
        assert!(lookup("bogus").is_none());
    }
}
