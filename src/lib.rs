//! Per-locale translated attributes for entities.
//!
//! Values written to a translated attribute are staged on the entity,
//! flushed into a shared keyed [`TranslationStore`] when the entity is
//! saved, and purged when it is destroyed. Reads resolve through the staged
//! edits, the fallback chain, the store and finally the raw column.
//!
//! ```rust
//! use polyglot_store::{Locale, LocaleContext, MemoryStore, Record, RecordTable, Translator};
//! use std::sync::Arc;
//!
//! let mut translator = Translator::new(Arc::new(MemoryStore::new()));
//! translator.declare("posts", ["title"])?;
//!
//! let ctx = LocaleContext::new(Locale::new("ca")?);
//! let mut table = RecordTable::new("posts");
//! let mut post = Record::new("posts").with_column("title", "Untranslated");
//!
//! translator.write(&mut post, "title", "Títol", &ctx)?;
//! let id = table.persist(&mut post, &translator)?;
//!
//! let loaded = table.get(id).expect("just saved");
//! assert_eq!(translator.read(&loaded, "title", &ctx)?.as_deref(), Some("Títol"));
//! # Ok::<(), polyglot_store::TranslateError>(())
//! ```

pub mod config;
pub mod error;
pub mod i18n;
pub mod key;
pub mod legacy;
pub mod lookup;
pub mod model;
pub mod registry;
pub mod resolve;
pub mod staging;
pub mod store;
pub mod sync;
pub mod translator;

pub use error::{Result, TranslateError};
pub use i18n::{Fallbacks, Locale, LocaleContext};
pub use key::{EntityId, KeyCodec, KeyPattern};
pub use legacy::{ImportReport, LegacyImporter, LegacyTable};
pub use lookup::ScopedLookup;
pub use model::{EntitySource, Record, RecordTable, Scope, Translatable};
pub use registry::{AttributeDescriptor, AttributeRegistry, AttributeSpec};
pub use resolve::ResolutionEngine;
pub use staging::StagingCache;
pub use store::{MemoryStore, SqliteStore, TranslationRow, TranslationStore};
pub use sync::{FlushReport, PersistenceSynchronizer};
pub use translator::Translator;
