//! The external collaborator interface
//!
//! Everything the translator needs from the inverted-index engine, the
//! stemmer, Unicode word-iteration, and the regex/date/lastmod/infix/saved
//! query helpers is reached through this one trait. The engine itself —
//! storage, indexing, ranking, evaluation — is out of this crate's scope;
//! `Backend` is the narrow seam the compiler depends on instead.
//!
//! Implementations must be `Send + Sync`: the compiler is single-threaded
//! and synchronous, but callers may share one backend across concurrently
//! running compiles as long as the backend itself tolerates concurrent
//! reads — the same contract the teacher crate's `SearchEngine` and
//! `DocumentSource` traits carry.

use crate::error::CompileResult;
use crate::query_tree::QueryTree;

/// The narrow interface the translator consumes from the inverted-index
/// engine and its surrounding collaborators.
pub trait Backend: Send + Sync {
    /// The internal term-prefix string for a field (e.g. `from` → `Xfrom:`).
    fn term_prefix(&self, field_name: &str) -> String;

    /// Reduce a word to its morphological root for index lookup.
    fn stem(&self, word: &str) -> String;

    /// Lowercase `text` using the backend's Unicode casing rules.
    fn unicode_lower(&self, text: &str) -> String;

    /// Split `text` into lowercase Unicode words (word-character runs).
    ///
    /// Default implementation uses `unicode-segmentation`'s Unicode word
    /// boundaries and the backend's own `unicode_lower`.
    fn unicode_words(&self, text: &str) -> Vec<String> {
        use unicode_segmentation::UnicodeSegmentation;
        text.unicode_words()
            .map(|w| self.unicode_lower(w))
            .collect()
    }

    /// Returns `true` if `c` is a character that makes up index words (as
    /// opposed to whitespace or punctuation that separates them).
    fn unicode_is_wordchar(&self, c: char) -> bool {
        c.is_alphanumeric()
    }

    /// Returns `true` if `text` is, in its entirety, a single run of word
    /// characters — no embedded whitespace or punctuation at all. A basic
    /// atom passing this check is stemmed as one term; anything else
    /// (including every quoted atom) is treated as a phrase.
    fn is_single_word(&self, text: &str) -> bool {
        !text.is_empty() && text.chars().all(|c| self.unicode_is_wordchar(c))
    }

    /// Compile a regex pattern scoped to `field_name` into a backend query.
    ///
    /// # Errors
    /// Returns [`crate::error::CompileError::XapianException`] (or
    /// `BadQuerySyntax` if the pattern itself is malformed) on failure.
    fn regex_to_query(&self, field_name: &str, pattern: &str) -> CompileResult<QueryTree>;

    /// Compile a `(from, to)` date range into a backend query.
    ///
    /// # Errors
    /// Returns an error if the bounds cannot be parsed as dates.
    fn date_range_to_query(&self, from: &str, to: &str) -> CompileResult<QueryTree>;

    /// Compile a `(from, to)` lastmod range into a backend query.
    ///
    /// # Errors
    /// Returns an error if the bounds cannot be parsed.
    fn lastmod_range_to_query(&self, from: &str, to: &str) -> CompileResult<QueryTree>;

    /// Parse `text` with the backend's own infix query-string grammar.
    ///
    /// # Errors
    /// Returns `BadQuerySyntax` on a syntax error in `text`, or
    /// `XapianException` on any other backend failure.
    fn infix_parse(&self, text: &str) -> CompileResult<QueryTree>;

    /// Resolve a named query (the `(query "name")` form).
    ///
    /// # Errors
    /// Returns an error if `name` does not resolve to a stored query.
    fn named_query(&self, name: &str) -> CompileResult<QueryTree>;

    /// Expand `sub_tree` (already translated) scoped to `field_name`, used
    /// by `matching`/`of` and by any field carrying `EXPAND`.
    ///
    /// # Errors
    /// Returns an error if expansion fails.
    fn query_expand(&self, field_name: &str, sub_tree: QueryTree) -> CompileResult<QueryTree>;

    /// Look up a configuration value by key (used to resolve saved squeries
    /// under `squery.<name>`). Returns `None` if unset or empty.
    fn config_get(&self, key: &str) -> Option<String>;

    /// Look up the internal prefix for a user-defined header, if `name` was
    /// registered as one.
    fn user_prefix_get(&self, name: &str) -> Option<String>;

    /// Emit a diagnostic message. The translator calls this exactly once
    /// for every `BadQuerySyntax` it raises, right before returning it, so
    /// this is the single diagnostic sink for the whole compile. The
    /// default implementation routes through `tracing`; callers with their
    /// own sink may override it.
    fn log(&self, message: &str) {
        tracing::warn!(target: "sexpquery::translator", "{message}");
    }
}

#[cfg(any(test, feature = "test-backend"))]
pub mod stub;

#[cfg(test)]
mod tests {
    use super::*;

    struct MinimalBackend;

    impl Backend for MinimalBackend {
        fn term_prefix(&self, field_name: &str) -> String {
            format!("X{field_name}:")
        }

        fn stem(&self, word: &str) -> String {
            word.to_string()
        }

        fn unicode_lower(&self, text: &str) -> String {
            text.to_lowercase()
        }

        fn regex_to_query(&self, _field_name: &str, _pattern: &str) -> CompileResult<QueryTree> {
            Ok(QueryTree::MatchAll)
        }

        fn date_range_to_query(&self, _from: &str, _to: &str) -> CompileResult<QueryTree> {
            Ok(QueryTree::MatchAll)
        }

        fn lastmod_range_to_query(&self, _from: &str, _to: &str) -> CompileResult<QueryTree> {
            Ok(QueryTree::MatchAll)
        }

        fn infix_parse(&self, _text: &str) -> CompileResult<QueryTree> {
            Ok(QueryTree::MatchAll)
        }

        fn named_query(&self, _name: &str) -> CompileResult<QueryTree> {
            Ok(QueryTree::MatchAll)
        }

        fn query_expand(&self, _field_name: &str, sub_tree: QueryTree) -> CompileResult<QueryTree> {
            Ok(sub_tree)
        }

        fn config_get(&self, _key: &str) -> Option<String> {
            None
        }

        fn user_prefix_get(&self, _name: &str) -> Option<String> {
            None
        }
    }

    #[test]
    fn default_unicode_words_splits_on_boundaries() {
        let backend = MinimalBackend;
        assert_eq!(backend.unicode_words("Alice Smith"), vec!["alice", "smith"]);
    }

    #[test]
    fn default_is_single_word() {
        let backend = MinimalBackend;
        assert!(backend.is_single_word("alice"));
        assert!(!backend.is_single_word("alice smith"));
    }

    #[test]
    fn default_log_does_not_panic() {
        MinimalBackend.log("diagnostic message");
    }
}
