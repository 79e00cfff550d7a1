//! Locale type: validated locale identifier.
//!
//! Translated values are stored and resolved per `Locale`. Unlike a fixed
//! enum of supported languages, any well-formed identifier is accepted so
//! applications can introduce locales without touching this crate.

use crate::error::{Result, TranslateError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest accepted identifier (a full BCP 47 tag with extensions fits).
const MAX_LOCALE_LEN: usize = 35;

/// A validated locale identifier (e.g., "en", "pt-BR", "zh_Hant").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    /// Create a locale from an identifier.
    ///
    /// # Returns
    /// * `Ok(Locale)` if the identifier is 1-35 ASCII alphanumerics, `-` or `_`
    /// * `Err(TranslateError::InvalidLocale)` otherwise
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        let well_formed = !code.is_empty()
            && code.len() <= MAX_LOCALE_LEN
            && code
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if well_formed {
            Ok(Self(code))
        } else {
            Err(TranslateError::InvalidLocale(code))
        }
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Locale {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Locale {
    type Error = TranslateError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.0
    }
}

impl AsRef<str> for Locale {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
