use crate::i18n::{Fallbacks, Locale, LocaleContext};
use crate::key::{KeyCodec, DEFAULT_NAMESPACE};
use crate::legacy::LegacyTable;
use anyhow::{anyhow, Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Storage
    pub database_path: String,

    // Localization
    pub default_locale: Locale,
    pub fallbacks: Fallbacks,
    pub fallbacks_enabled: bool,

    // Keys
    pub key_namespace: String,

    // Legacy import
    pub legacy_overrides: Vec<LegacyTable>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let default_locale = std::env::var("POLYGLOT_DEFAULT_LOCALE")
            .unwrap_or_else(|_| "en".to_string());
        let default_locale = Locale::new(default_locale.trim())
            .context("POLYGLOT_DEFAULT_LOCALE is not a valid locale")?;

        let mut fallbacks = Fallbacks::with_default(default_locale.clone());
        if let Ok(mappings) = std::env::var("POLYGLOT_FALLBACKS") {
            fallbacks
                .parse_mappings(&mappings)
                .context("POLYGLOT_FALLBACKS is malformed")?;
        }

        let key_namespace = std::env::var("POLYGLOT_KEY_NAMESPACE")
            .unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string());
        KeyCodec::new(key_namespace.as_str()).context("POLYGLOT_KEY_NAMESPACE is invalid")?;

        let fallbacks_enabled = match std::env::var("POLYGLOT_FALLBACKS_ENABLED") {
            Ok(value) => parse_flag(&value)
                .context("POLYGLOT_FALLBACKS_ENABLED must be true or false")?,
            Err(_) => true,
        };

        let legacy_overrides = match std::env::var("POLYGLOT_LEGACY_TABLES") {
            Ok(overrides) => LegacyTable::parse_overrides(&overrides)
                .context("POLYGLOT_LEGACY_TABLES is malformed")?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            database_path: std::env::var("POLYGLOT_DATABASE_PATH")
                .context("POLYGLOT_DATABASE_PATH not set")?,

            default_locale,
            fallbacks,
            fallbacks_enabled,

            key_namespace,

            legacy_overrides,
        })
    }

    /// Locale context starting at the default locale.
    pub fn locale_context(&self) -> LocaleContext {
        if self.fallbacks_enabled {
            LocaleContext::with_fallbacks(self.default_locale.clone(), self.fallbacks.clone())
        } else {
            LocaleContext::without_fallbacks(self.default_locale.clone())
        }
    }

    pub fn key_codec(&self) -> Result<KeyCodec> {
        KeyCodec::new(self.key_namespace.as_str()).context("POLYGLOT_KEY_NAMESPACE is invalid")
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(anyhow!("unrecognised flag value '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 6] = [
        "POLYGLOT_DATABASE_PATH",
        "POLYGLOT_DEFAULT_LOCALE",
        "POLYGLOT_FALLBACKS",
        "POLYGLOT_FALLBACKS_ENABLED",
        "POLYGLOT_KEY_NAMESPACE",
        "POLYGLOT_LEGACY_TABLES",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    fn loc(code: &str) -> Locale {
        Locale::new(code).unwrap()
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        std::env::set_var("POLYGLOT_DATABASE_PATH", "translations.db");

        let config = Config::from_env().expect("Should load");
        assert_eq!(config.database_path, "translations.db");
        assert_eq!(config.default_locale, loc("en"));
        assert!(config.fallbacks_enabled);
        assert_eq!(config.key_codec().unwrap().namespace(), "polyglot");

        let ctx = config.locale_context();
        assert_eq!(ctx.active(), &loc("en"));
        assert_eq!(ctx.fallback_chain(), Some(vec![loc("en")]));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_database_path() {
        clear_env();
        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("POLYGLOT_DATABASE_PATH"));
    }

    #[test]
    #[serial]
    fn test_fallback_mappings() {
        clear_env();
        std::env::set_var("POLYGLOT_DATABASE_PATH", "t.db");
        std::env::set_var("POLYGLOT_DEFAULT_LOCALE", "es");
        std::env::set_var("POLYGLOT_FALLBACKS", "ca=es;pt=es,en");

        let config = Config::from_env().unwrap();
        let mut ctx = config.locale_context();
        ctx.set_active(loc("pt"));
        assert_eq!(ctx.fallback_chain(), Some(vec![loc("pt"), loc("es"), loc("en")]));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_fallbacks_disabled() {
        clear_env();
        std::env::set_var("POLYGLOT_DATABASE_PATH", "t.db");
        std::env::set_var("POLYGLOT_FALLBACKS_ENABLED", "false");

        let config = Config::from_env().unwrap();
        assert!(!config.fallbacks_enabled);
        assert_eq!(config.locale_context().fallback_chain(), None);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_misspelled_flag_rejected() {
        clear_env();
        std::env::set_var("POLYGLOT_DATABASE_PATH", "t.db");
        std::env::set_var("POLYGLOT_FALLBACKS_ENABLED", "flase");

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("POLYGLOT_FALLBACKS_ENABLED"));

        std::env::set_var("POLYGLOT_FALLBACKS_ENABLED", " ON ");
        assert!(Config::from_env().unwrap().fallbacks_enabled);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_legacy_overrides() {
        clear_env();
        std::env::set_var("POLYGLOT_DATABASE_PATH", "t.db");
        assert!(Config::from_env().unwrap().legacy_overrides.is_empty());

        std::env::set_var("POLYGLOT_LEGACY_TABLES", "person=people");
        let config = Config::from_env().unwrap();
        assert_eq!(
            config.legacy_overrides,
            vec![LegacyTable::for_model("person").with_entity_type("people")]
        );

        std::env::set_var("POLYGLOT_LEGACY_TABLES", "person");
        assert!(Config::from_env().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_rejected() {
        clear_env();
        std::env::set_var("POLYGLOT_DATABASE_PATH", "t.db");
        std::env::set_var("POLYGLOT_FALLBACKS", "ca");
        assert!(Config::from_env().is_err());

        std::env::remove_var("POLYGLOT_FALLBACKS");
        std::env::set_var("POLYGLOT_KEY_NAMESPACE", "a.b");
        assert!(Config::from_env().is_err());

        std::env::remove_var("POLYGLOT_KEY_NAMESPACE");
        std::env::set_var("POLYGLOT_DEFAULT_LOCALE", "not a locale");
        assert!(Config::from_env().is_err());
        clear_env();
    }
}
