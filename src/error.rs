//! Error types for translated-attribute operations.

use crate::i18n::Locale;
use thiserror::Error;

/// Result type for translation operations.
pub type Result<T> = std::result::Result<T, TranslateError>;

/// Errors that can occur while declaring, resolving, persisting or looking up
/// translated attributes.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// Translated attributes were declared twice for the same entity type.
    #[error("translated attributes can only be declared once for `{entity_type}`")]
    DuplicateDeclaration { entity_type: String },

    /// The attribute was never declared as translated for this entity type.
    #[error("`{attribute}` is not a translated attribute of `{entity_type}`")]
    UndeclaredAttribute {
        entity_type: String,
        attribute: String,
    },

    /// An entity type or attribute name that cannot be encoded into a key.
    #[error("invalid name `{name}`: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// A locale identifier that failed validation.
    #[error("invalid locale: '{0}'")]
    InvalidLocale(String),

    /// A malformed fallback mapping.
    #[error("invalid fallback mapping: {0}")]
    InvalidFallbacks(String),

    /// A strict lookup found nothing.
    #[error("no `{entity_type}` record found with {attribute} = {value:?}")]
    RecordNotFound {
        entity_type: String,
        attribute: String,
        value: String,
    },

    /// Required translations are blank for one or more locales.
    #[error("{attribute} has to be present for locales {}", join_locales(.locales))]
    MissingRequiredTranslation {
        attribute: String,
        locales: Vec<Locale>,
    },

    /// A flush was requested for an entity without a durable identity.
    #[error("`{entity_type}` entity has not been persisted yet")]
    NotPersisted { entity_type: String },

    /// Persisting staged translations stopped part way through.
    ///
    /// Rows already written stay written; the store offers no rollback here.
    #[error("flush wrote {written} of {staged} staged translations before failing: {source}")]
    PartialFlush {
        written: usize,
        staged: usize,
        #[source]
        source: Box<TranslateError>,
    },

    /// Legacy import input could not be interpreted.
    #[error("legacy import error: {0}")]
    Legacy(String),

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A store mutex was poisoned by a panicking holder.
    #[error("translation store lock poisoned")]
    LockPoisoned,
}

fn join_locales(locales: &[Locale]) -> String {
    let codes: Vec<&str> = locales.iter().map(Locale::as_str).collect();
    match codes.as_slice() {
        [] => String::new(),
        [only] => (*only).to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locales(codes: &[&str]) -> Vec<Locale> {
        codes.iter().map(|c| Locale::new(*c).unwrap()).collect()
    }

    #[test]
    fn test_missing_translation_message_lists_locales() {
        let err = TranslateError::MissingRequiredTranslation {
            attribute: "title".to_string(),
            locales: locales(&["en", "ca", "es"]),
        };
        assert_eq!(
            err.to_string(),
            "title has to be present for locales en, ca and es"
        );
    }

    #[test]
    fn test_missing_translation_message_single_locale() {
        let err = TranslateError::MissingRequiredTranslation {
            attribute: "title".to_string(),
            locales: locales(&["ca"]),
        };
        assert_eq!(err.to_string(), "title has to be present for locales ca");
    }

    #[test]
    fn test_record_not_found_message() {
        let err = TranslateError::RecordNotFound {
            entity_type: "posts".to_string(),
            attribute: "title".to_string(),
            value: "Hola".to_string(),
        };
        assert!(err.to_string().contains("posts"));
        assert!(err.to_string().contains("\"Hola\""));
    }

    #[test]
    fn test_partial_flush_exposes_source() {
        let err = TranslateError::PartialFlush {
            written: 1,
            staged: 3,
            source: Box::new(TranslateError::LockPoisoned),
        };
        assert!(err.to_string().starts_with("flush wrote 1 of 3"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
