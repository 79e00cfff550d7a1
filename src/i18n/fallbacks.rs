//! Locale fallback chains.
//!
//! A chain is the ordered list of locales consulted when the active locale
//! has no value: the locale itself, then its explicitly mapped fallbacks,
//! then the default locale.

use crate::error::{Result, TranslateError};
use crate::i18n::Locale;
use std::collections::BTreeMap;

/// Fallback configuration: explicit mappings plus an optional default locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fallbacks {
    default_locale: Option<Locale>,
    mappings: BTreeMap<Locale, Vec<Locale>>,
}

impl Fallbacks {
    /// Create fallbacks with no mappings and no default locale.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create fallbacks that end every chain with `default_locale`.
    pub fn with_default(default_locale: Locale) -> Self {
        Self {
            default_locale: Some(default_locale),
            mappings: BTreeMap::new(),
        }
    }

    /// Map `from` to an ordered list of fallback locales, replacing any
    /// previous mapping for `from`.
    pub fn map(&mut self, from: Locale, to: impl IntoIterator<Item = Locale>) -> &mut Self {
        self.mappings.insert(from, to.into_iter().collect());
        self
    }

    /// Get the default locale, if any.
    pub fn default_locale(&self) -> Option<&Locale> {
        self.default_locale.as_ref()
    }

    /// Compute the fallback chain for `locale`.
    ///
    /// The chain always starts with `locale` itself and contains no duplicates.
    pub fn chain(&self, locale: &Locale) -> Vec<Locale> {
        let mut chain = vec![locale.clone()];
        let mapped = self.mappings.get(locale).into_iter().flatten();

        for candidate in mapped.chain(self.default_locale.iter()) {
            if !chain.contains(candidate) {
                chain.push(candidate.clone());
            }
        }

        chain
    }

    /// Parse mappings in the `from=to1,to2;from2=to3` format.
    ///
    /// Empty input yields no mappings. Whitespace around codes is ignored.
    pub fn parse_mappings(&mut self, mappings: &str) -> Result<&mut Self> {
        for entry in mappings.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (from, targets) = entry
                .split_once('=')
                .ok_or_else(|| TranslateError::InvalidFallbacks(format!("missing '=' in '{}'", entry)))?;

            let from = Locale::new(from.trim())?;
            let targets = targets
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(Locale::new)
                .collect::<Result<Vec<_>>>()?;

            if targets.is_empty() {
                return Err(TranslateError::InvalidFallbacks(format!(
                    "no fallback locales for '{}'",
                    from
                )));
            }

            self.map(from, targets);
        }

        Ok(self)
    }
}
