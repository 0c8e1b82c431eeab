//! A deterministic in-memory [`Backend`] for tests
//!
//! Mirrors the teacher crate's `StubEngine`/`StubSource` pattern: no real
//! index, no real stemmer, just enough fixed behavior to drive the
//! translator end-to-end and make assertions on the resulting
//! [`QueryTree`] reproducible.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::backend::Backend;
use crate::error::{CompileError, CompileResult};
use crate::query_tree::{OpaqueQuery, OpaqueSource, QueryTree};

/// An in-memory stand-in for the inverted-index engine and its
/// collaborators, configurable with saved squeries and user-defined
/// header prefixes.
#[derive(Default)]
pub struct StubBackend {
    /// `squery.<name>` config values, as raw s-expression text.
    squeries: Mutex<HashMap<String, String>>,
    /// User-defined header name -> internal prefix.
    user_prefixes: Mutex<HashMap<String, String>>,
}

impl StubBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `squery.<name>` so `(<name> ...)` resolves through the
    /// saved-squery expansion path.
    #[must_use]
    pub fn with_squery(self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.squeries.lock().expect("lock").insert(name.into(), body.into());
        self
    }

    /// Register a user-defined header, giving it an internal prefix.
    #[must_use]
    pub fn with_user_prefix(self, name: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.user_prefixes
            .lock()
            .expect("lock")
            .insert(name.into(), prefix.into());
        self
    }
}

impl Backend for StubBackend {
    fn term_prefix(&self, field_name: &str) -> String {
        let initial = field_name.chars().next().unwrap_or('X').to_ascii_uppercase();
        format!("{initial}{field_name}:")
    }

    fn stem(&self, word: &str) -> String {
        // A toy stemmer: drop a trailing "s", "ed", or "ing".
        let lower = word.to_lowercase();
        for suffix in ["ing", "ed", "s"] {
            if let Some(stripped) = lower.strip_suffix(suffix) {
                if !stripped.is_empty() {
                    return stripped.to_string();
                }
            }
        }
        lower
    }

    fn unicode_lower(&self, text: &str) -> String {
        text.to_lowercase()
    }

    fn regex_to_query(&self, field_name: &str, pattern: &str) -> CompileResult<QueryTree> {
        if pattern.is_empty() {
            return Err(CompileError::bad_syntax("empty regex pattern"));
        }
        Ok(QueryTree::Opaque(OpaqueQuery {
            source: OpaqueSource::Regex,
            payload: serde_json::json!({ "field": field_name, "pattern": pattern }),
        }))
    }

    fn date_range_to_query(&self, from: &str, to: &str) -> CompileResult<QueryTree> {
        Ok(QueryTree::Opaque(OpaqueQuery {
            source: OpaqueSource::DateRange,
            payload: serde_json::json!({ "from": from, "to": to }),
        }))
    }

    fn lastmod_range_to_query(&self, from: &str, to: &str) -> CompileResult<QueryTree> {
        Ok(QueryTree::Opaque(OpaqueQuery {
            source: OpaqueSource::LastmodRange,
            payload: serde_json::json!({ "from": from, "to": to }),
        }))
    }

    fn infix_parse(&self, text: &str) -> CompileResult<QueryTree> {
        if text.trim().is_empty() {
            return Err(CompileError::bad_syntax("empty infix query"));
        }
        Ok(QueryTree::Opaque(OpaqueQuery {
            source: OpaqueSource::Infix,
            payload: serde_json::json!({ "text": text }),
        }))
    }

    fn named_query(&self, name: &str) -> CompileResult<QueryTree> {
        Ok(QueryTree::Opaque(OpaqueQuery {
            source: OpaqueSource::NamedQuery,
            payload: serde_json::json!({ "name": name }),
        }))
    }

    fn query_expand(&self, field_name: &str, sub_tree: QueryTree) -> CompileResult<QueryTree> {
        let payload = serde_json::to_value(&sub_tree).map_err(CompileError::from)?;
        Ok(QueryTree::Opaque(OpaqueQuery {
            source: OpaqueSource::QueryExpand,
            payload: serde_json::json!({ "field": field_name, "sub_tree": payload }),
        }))
    }

    fn config_get(&self, key: &str) -> Option<String> {
        let name = key.strip_prefix("squery.")?;
        self.squeries.lock().expect("lock").get(name).cloned()
    }

    fn user_prefix_get(&self, name: &str) -> Option<String> {
        self.user_prefixes.lock().expect("lock").get(name).cloned()
    }
}
