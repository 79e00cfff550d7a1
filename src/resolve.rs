//! Read-time resolution of translated attributes.
//!
//! Order of precedence for `(entity, attribute)` under the active locale:
//!
//! 1. a value staged for the active locale
//! 2. a value staged for a later locale of the fallback chain, if anything is staged
//! 3. a stored value, walking the fallback chain, if the entity is persisted
//! 4. the raw column
//!
//! Steps 2 and 3 only run when the context carries a fallback mechanism.
//! Resolution never fails for a missing translation; only store errors surface.

use crate::error::Result;
use crate::i18n::{Locale, LocaleContext, ResolutionMetrics, ResolutionSource};
use crate::key::KeyCodec;
use crate::model::Translatable;
use crate::store::TranslationStore;
use std::sync::Arc;
use tracing::debug;

/// Computes the visible value of translated attributes.
#[derive(Clone)]
pub struct ResolutionEngine {
    store: Arc<dyn TranslationStore>,
    codec: KeyCodec,
    metrics: Arc<ResolutionMetrics>,
}

impl ResolutionEngine {
    pub fn new(
        store: Arc<dyn TranslationStore>,
        codec: KeyCodec,
        metrics: Arc<ResolutionMetrics>,
    ) -> Self {
        Self {
            store,
            codec,
            metrics,
        }
    }

    pub fn codec(&self) -> &KeyCodec {
        &self.codec
    }

    /// Resolve `attribute` of `entity` under `ctx`.
    pub fn resolve<E: Translatable + ?Sized>(
        &self,
        entity: &E,
        attribute: &str,
        ctx: &LocaleContext,
    ) -> Result<Option<String>> {
        let active = ctx.active();
        let staging = entity.staging();

        if let Some(value) = staging.get(active, attribute) {
            return Ok(Some(self.hit(ResolutionSource::Staged, attribute, active, value)));
        }

        let chain = ctx.fallback_chain();

        if let Some(chain) = chain.as_deref() {
            if !staging.is_empty() {
                for locale in chain.iter().filter(|l| *l != active) {
                    if let Some(value) = staging.get(locale, attribute) {
                        return Ok(Some(self.hit(
                            ResolutionSource::StagedFallback,
                            attribute,
                            locale,
                            value,
                        )));
                    }
                }
            }
        }

        if let (Some(id), Some(chain)) = (entity.id(), chain.as_deref()) {
            let key = self.codec.encode(entity.entity_type(), attribute, id);
            for locale in chain {
                if let Some(value) = self.store.find_one(locale, &key)? {
                    return Ok(Some(self.hit(ResolutionSource::Store, attribute, locale, &value)));
                }
            }
        }

        debug!(
            "No translation of {}.{} for {}, using raw column",
            entity.entity_type(),
            attribute,
            active
        );
        self.metrics.record_resolution(ResolutionSource::Raw);
        Ok(entity.raw_value(attribute).map(str::to_string))
    }

    /// Value staged for, or stored under, exactly `locale`.
    ///
    /// No fallback chain and no raw column. Used by presence validation.
    pub fn resolve_exact<E: Translatable + ?Sized>(
        &self,
        entity: &E,
        attribute: &str,
        locale: &Locale,
    ) -> Result<Option<String>> {
        if let Some(value) = entity.staging().get(locale, attribute) {
            return Ok(Some(value.to_string()));
        }

        match entity.id() {
            Some(id) => {
                let key = self.codec.encode(entity.entity_type(), attribute, id);
                self.store.find_one(locale, &key)
            }
            None => Ok(None),
        }
    }

    fn hit(&self, source: ResolutionSource, attribute: &str, locale: &Locale, value: &str) -> String {
        debug!("Resolved {} from {:?} under {}", attribute, source, locale);
        self.metrics.record_resolution(source);
        value.to_string()
    }
}
