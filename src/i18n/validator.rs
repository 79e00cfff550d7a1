//! Required-translation validation.
//!
//! Checks that an attribute has a non-blank value for every locale in a
//! required set before an entity is persisted. Every missing locale is
//! reported, not just the first one.

use crate::error::{Result, TranslateError};
use crate::i18n::Locale;
use crate::model::Translatable;
use crate::resolve::ResolutionEngine;

/// Validation report listing the locales that lack a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// The validated attribute
    pub attribute: String,

    /// Required locales with no non-blank value, in the order they were required
    pub missing: Vec<Locale>,
}

impl ValidationReport {
    /// Create a new empty validation report
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            missing: Vec::new(),
        }
    }

    /// Check if the report has any missing locales
    pub fn has_errors(&self) -> bool {
        !self.missing.is_empty()
    }

    /// Check if every required locale is present
    pub fn is_clean(&self) -> bool {
        !self.has_errors()
    }

    /// Convert the report into `Err(MissingRequiredTranslation)` when
    /// anything is missing.
    pub fn into_result(self) -> Result<()> {
        if self.is_clean() {
            Ok(())
        } else {
            Err(TranslateError::MissingRequiredTranslation {
                attribute: self.attribute,
                locales: self.missing,
            })
        }
    }
}

/// Presence rule for one translated attribute over a set of locales.
#[derive(Debug, Clone)]
pub struct PresenceValidator {
    attribute: String,
    locales: Vec<Locale>,
}

impl PresenceValidator {
    pub fn new(attribute: impl Into<String>, locales: impl IntoIterator<Item = Locale>) -> Self {
        Self {
            attribute: attribute.into(),
            locales: locales.into_iter().collect(),
        }
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn locales(&self) -> &[Locale] {
        &self.locales
    }

    /// Validate `entity` against this rule.
    ///
    /// A locale counts as present when a non-blank value is staged for it or
    /// stored under exactly that locale. Fallback locales and the raw column
    /// do not satisfy the rule.
    pub fn validate<E: Translatable + ?Sized>(
        &self,
        engine: &ResolutionEngine,
        entity: &E,
    ) -> Result<ValidationReport> {
        let mut report = ValidationReport::new(&self.attribute);

        for locale in &self.locales {
            let value = engine.resolve_exact(entity, &self.attribute, locale)?;
            let present = value.is_some_and(|v| !v.trim().is_empty());
            if !present && !report.missing.contains(locale) {
                report.missing.push(locale.clone());
            }
        }

        Ok(report)
    }
}
