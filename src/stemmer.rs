//! A concrete, ready-to-use `Backend::stem` implementation
//!
//! Feature-gated convenience wrapper around the Snowball stemmer for
//! backend authors who don't want to own their own morphological analysis.
//! Not wired into the translator directly — [`Backend::stem`] stays an
//! external collaboration point, this is just one reusable implementation
//! of it.

use rust_stemmers::{Algorithm, Stemmer};

/// Wraps a `rust_stemmers::Stemmer` behind the crate's `stem(word) -> String`
/// shape. English is the only algorithm exposed for now; add variants here
/// as concrete backends need other languages.
pub struct PorterStemmer {
    inner: Stemmer,
}

impl PorterStemmer {
    #[must_use]
    pub fn english() -> Self {
        Self { inner: Stemmer::create(Algorithm::English) }
    }

    #[must_use]
    pub fn stem(&self, word: &str) -> String {
        self.inner.stem(word).into_owned()
    }
}

impl Default for PorterStemmer {
    fn default() -> Self {
        Self::english()
    }
}
