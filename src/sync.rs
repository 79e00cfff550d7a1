//! Write-back of staged translations and cleanup on destroy.

use crate::error::{Result, TranslateError};
use crate::i18n::{Locale, ResolutionMetrics};
use crate::key::{EntityId, KeyCodec};
use crate::model::Translatable;
use crate::store::TranslationStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of one flush, passed to post-flush hooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    pub entity_type: String,
    pub id: EntityId,
    pub rows_written: usize,
    /// Locales that had staged edits, in order
    pub locales: Vec<Locale>,
}

pub type FlushHook = Box<dyn Fn(&FlushReport) + Send + Sync>;

/// Keeps the translation store in step with entity lifecycles.
pub struct PersistenceSynchronizer {
    store: Arc<dyn TranslationStore>,
    codec: KeyCodec,
    metrics: Arc<ResolutionMetrics>,
    hooks: Vec<FlushHook>,
}

impl PersistenceSynchronizer {
    pub fn new(store: Arc<dyn TranslationStore>, codec: KeyCodec, metrics: Arc<ResolutionMetrics>) -> Self {
        Self {
            store,
            codec,
            metrics,
            hooks: Vec::new(),
        }
    }

    /// Register a hook run after every flush that wrote rows.
    pub fn on_flush(&mut self, hook: impl Fn(&FlushReport) + Send + Sync + 'static) {
        self.hooks.push(Box::new(hook));
    }

    /// Flush the staged edits of a saved entity.
    ///
    /// Each staged edit is one upsert. If an upsert fails the error is
    /// returned as [`TranslateError::PartialFlush`]; rows already written
    /// stay written and the staging cache keeps every entry, so calling
    /// again re-applies the whole set.
    pub fn after_save<E: Translatable + ?Sized>(&self, entity: &mut E) -> Result<FlushReport> {
        let id = entity.id().ok_or_else(|| TranslateError::NotPersisted {
            entity_type: entity.entity_type().to_string(),
        })?;
        let entity_type = entity.entity_type().to_string();

        let mut report = FlushReport {
            entity_type,
            id,
            rows_written: 0,
            locales: entity.staging().locales().cloned().collect(),
        };

        if entity.staging().is_empty() {
            debug!("Nothing staged for {} #{}", report.entity_type, id);
            return Ok(report);
        }

        let drain = entity.staging_mut().drain();
        let staged = drain.len();

        for entry in drain.entries() {
            let key = self.codec.encode(&report.entity_type, entry.attribute, id);
            if let Err(e) = self.store.upsert(entry.locale, &key, entry.value) {
                warn!(
                    "Flush of {} #{} failed after {}/{} rows: {}",
                    report.entity_type, id, report.rows_written, staged, e
                );
                return Err(TranslateError::PartialFlush {
                    written: report.rows_written,
                    staged,
                    source: Box::new(e),
                });
            }
            report.rows_written += 1;
        }

        drain.commit();
        self.metrics.record_flushed(report.rows_written);

        for hook in &self.hooks {
            hook(&report);
        }

        info!(
            "Flushed {} translations for {} #{}",
            report.rows_written, report.entity_type, id
        );
        Ok(report)
    }

    /// Delete every stored translation owned by `entity`.
    ///
    /// Rows of other entities of the same type are untouched, whatever
    /// their ids. Unpersisted entities own nothing and return 0.
    pub fn after_destroy<E: Translatable + ?Sized>(&self, entity: &E) -> Result<usize> {
        let Some(id) = entity.id() else {
            return Ok(0);
        };

        let pattern = self.codec.pattern_for_entity(entity.entity_type(), id);
        let removed = self.store.delete_where(&pattern)?;
        self.metrics.record_purged(removed);

        info!(
            "Purged {} translations for {} #{}",
            removed,
            entity.entity_type(),
            id
        );
        Ok(removed)
    }
}
