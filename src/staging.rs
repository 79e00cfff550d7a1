//! Staging cache: per-entity edits that have not been persisted yet.
//!
//! One cache belongs to exactly one in-memory entity. It is emptied only
//! after the caller confirms the staged values were written, through
//! [`StagedDrain::commit`].

use crate::i18n::{Locale, LocaleContext};
use std::collections::BTreeMap;

/// Pending `locale -> attribute -> value` edits of one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagingCache {
    entries: BTreeMap<Locale, BTreeMap<String, String>>,
}

/// One staged edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagedEntry<'a> {
    pub locale: &'a Locale,
    pub attribute: &'a str,
    pub value: &'a str,
}

impl StagingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `value` for `(locale, attribute)`, replacing any pending value.
    ///
    /// Returns the staged value.
    pub fn set(&mut self, locale: &Locale, attribute: &str, value: impl Into<String>) -> &str {
        let slot = self
            .entries
            .entry(locale.clone())
            .or_default()
            .entry(attribute.to_string())
            .or_default();
        *slot = value.into();
        slot
    }

    /// Get the pending value for `(locale, attribute)`.
    pub fn get(&self, locale: &Locale, attribute: &str) -> Option<&str> {
        self.entries
            .get(locale)
            .and_then(|attrs| attrs.get(attribute))
            .map(String::as_str)
    }

    /// True iff a non-blank value is staged for `attribute` under the
    /// context's active locale. Edits under other locales are ignored.
    pub fn is_changed(&self, ctx: &LocaleContext, attribute: &str) -> bool {
        self.get(ctx.active(), attribute)
            .is_some_and(|value| !value.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of staged `(locale, attribute)` pairs.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    /// Locales with at least one staged edit, in order.
    pub fn locales(&self) -> impl Iterator<Item = &Locale> {
        self.entries.keys()
    }

    /// Every staged edit, ordered by locale then attribute.
    pub fn entries(&self) -> impl Iterator<Item = StagedEntry<'_>> {
        self.entries.iter().flat_map(|(locale, attrs)| {
            attrs.iter().map(move |(attribute, value)| StagedEntry {
                locale,
                attribute,
                value,
            })
        })
    }

    /// Begin draining the cache.
    ///
    /// Entries are removed only when [`StagedDrain::commit`] is called;
    /// dropping the drain keeps every entry.
    pub fn drain(&mut self) -> StagedDrain<'_> {
        StagedDrain { cache: self }
    }
}

/// Pending drain of a [`StagingCache`].
#[derive(Debug)]
pub struct StagedDrain<'a> {
    cache: &'a mut StagingCache,
}

impl StagedDrain<'_> {
    /// Entries to persist.
    pub fn entries(&self) -> impl Iterator<Item = StagedEntry<'_>> {
        self.cache.entries()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Confirm persistence and clear the cache.
    pub fn commit(self) {
        self.cache.entries.clear();
    }
}
