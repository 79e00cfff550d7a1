//! The shared keyed translation store.
//!
//! Rows are `(locale, key) -> value` with at most one row per
//! `(locale, key)` pair. Keys come from [`crate::key::KeyCodec`]; stores only
//! interpret them through [`KeyPattern`].

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::i18n::Locale;
use crate::key::KeyPattern;
use serde::{Deserialize, Serialize};

/// One persisted translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRow {
    pub locale: Locale,
    pub key: String,
    pub value: String,
}

impl TranslationRow {
    pub fn new(locale: Locale, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            locale,
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Operations the translation engine needs from a store.
///
/// All calls are blocking round trips. Iteration order of `find_where` is the
/// store's insertion order; lookups rely on it to pick the first match.
pub trait TranslationStore: Send + Sync {
    /// Insert or update the row for `(locale, key)`.
    fn upsert(&self, locale: &Locale, key: &str, value: &str) -> Result<()>;

    /// Delete every row whose key matches `pattern`, returning the count.
    fn delete_where(&self, pattern: &KeyPattern) -> Result<usize>;

    /// Get the value stored for `(locale, key)`.
    fn find_one(&self, locale: &Locale, key: &str) -> Result<Option<String>>;

    /// Get rows under `locale` whose value equals `value` and whose key
    /// matches `pattern`.
    fn find_where(
        &self,
        locale: &Locale,
        value: &str,
        pattern: &KeyPattern,
    ) -> Result<Vec<TranslationRow>>;

    /// Upsert every row, or none of them if any write fails.
    fn insert_all(&self, rows: &[TranslationRow]) -> Result<usize>;

    /// Total number of rows.
    fn count(&self) -> Result<usize>;

    /// Delete every row, returning the count.
    fn clear(&self) -> Result<usize>;
}
