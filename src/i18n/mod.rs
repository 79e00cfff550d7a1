//! Localization collaborator surface.
//!
//! Everything the translated-attribute engine needs from a localization
//! library, expressed as plain values instead of ambient global state.
//!
//! # Architecture
//!
//! - `locale`: validated locale identifiers
//! - `fallbacks`: ordered fallback chains per locale
//! - `context`: the active locale plus the scoped-switch guard
//! - `validator`: required-translation checks
//! - `metrics`: resolution observability
//!
//! # Example
//!
//! ```rust
//! use polyglot_store::i18n::{Fallbacks, Locale, LocaleContext};
//!
//! let mut fallbacks = Fallbacks::with_default(Locale::new("en")?);
//! fallbacks.map(Locale::new("es")?, [Locale::new("ca")?]);
//!
//! let mut ctx = LocaleContext::with_fallbacks(Locale::new("es")?, fallbacks);
//! ctx.with_locale(Locale::new("de")?, |inner| {
//!     assert_eq!(inner.active().as_str(), "de");
//! });
//! assert_eq!(ctx.active().as_str(), "es");
//! # Ok::<(), polyglot_store::TranslateError>(())
//! ```

mod context;
mod fallbacks;
mod locale;
mod metrics;
mod validator;

pub use context::{LocaleContext, LocaleGuard};
pub use fallbacks::Fallbacks;
pub use locale::Locale;
pub use metrics::{MetricsReport, ResolutionMetrics, ResolutionSource};
pub use validator::{PresenceValidator, ValidationReport};
