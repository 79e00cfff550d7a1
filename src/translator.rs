//! The `Translator` facade.
//!
//! Wires one store, codec and metrics instance into the registry, the
//! resolution engine, the synchronizer and scoped lookups, and checks
//! declarations before delegating. Presence rules registered with
//! [`Translator::require_presence`] are kept per entity type and checked by
//! hosts before they save.

use crate::error::Result;
use crate::i18n::{Locale, LocaleContext, PresenceValidator, ResolutionMetrics, ValidationReport};
use crate::key::KeyCodec;
use crate::lookup::ScopedLookup;
use crate::model::{EntitySource, Translatable};
use crate::registry::{AttributeDescriptor, AttributeRegistry, AttributeSpec};
use crate::resolve::ResolutionEngine;
use crate::store::TranslationStore;
use crate::sync::{FlushReport, PersistenceSynchronizer};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

pub struct Translator {
    store: Arc<dyn TranslationStore>,
    codec: KeyCodec,
    metrics: Arc<ResolutionMetrics>,
    registry: AttributeRegistry,
    engine: ResolutionEngine,
    sync: PersistenceSynchronizer,
    lookup: ScopedLookup,
    presence: BTreeMap<String, Vec<PresenceValidator>>,
}

impl Translator {
    /// Create a translator over `store` with the default key namespace.
    pub fn new(store: Arc<dyn TranslationStore>) -> Self {
        Self::with_codec(store, KeyCodec::default())
    }

    pub fn with_codec(store: Arc<dyn TranslationStore>, codec: KeyCodec) -> Self {
        let metrics = Arc::new(ResolutionMetrics::new());
        Self {
            engine: ResolutionEngine::new(store.clone(), codec.clone(), metrics.clone()),
            sync: PersistenceSynchronizer::new(store.clone(), codec.clone(), metrics.clone()),
            lookup: ScopedLookup::new(store.clone(), codec.clone()),
            registry: AttributeRegistry::new(),
            presence: BTreeMap::new(),
            store,
            codec,
            metrics,
        }
    }

    /// Declare the translated attributes of `entity_type`. See
    /// [`AttributeRegistry::declare`].
    pub fn declare<I>(&mut self, entity_type: &str, attributes: I) -> Result<&[AttributeDescriptor]>
    where
        I: IntoIterator,
        I::Item: Into<AttributeSpec>,
    {
        self.registry.declare(entity_type, attributes)
    }

    pub fn declared_attributes(&self, entity_type: &str) -> Vec<&str> {
        self.registry.attribute_names(entity_type)
    }

    pub fn registry(&self) -> &AttributeRegistry {
        &self.registry
    }

    /// Run `hook` after every flush that wrote rows.
    pub fn on_flush(&mut self, hook: impl Fn(&FlushReport) + Send + Sync + 'static) {
        self.sync.on_flush(hook);
    }

    /// Stage `value` for `attribute` under the active locale.
    ///
    /// Returns the staged value, after any write decorator.
    pub fn write<E: Translatable + ?Sized>(
        &self,
        entity: &mut E,
        attribute: &str,
        value: impl Into<String>,
        ctx: &LocaleContext,
    ) -> Result<String> {
        let descriptor = self.registry.descriptor(entity.entity_type(), attribute)?;
        Ok(descriptor.set(entity, value, ctx))
    }

    /// Visible value of `attribute` under the active locale.
    pub fn read<E: Translatable + ?Sized>(
        &self,
        entity: &E,
        attribute: &str,
        ctx: &LocaleContext,
    ) -> Result<Option<String>> {
        let descriptor = self.registry.descriptor(entity.entity_type(), attribute)?;
        descriptor.get(&self.engine, entity, ctx)
    }

    pub fn is_changed<E: Translatable + ?Sized>(
        &self,
        entity: &E,
        attribute: &str,
        ctx: &LocaleContext,
    ) -> Result<bool> {
        let descriptor = self.registry.descriptor(entity.entity_type(), attribute)?;
        Ok(descriptor.is_changed(entity, ctx))
    }

    /// [`Translator::read`] under `locale`, leaving `ctx` unchanged afterwards.
    pub fn read_in<E: Translatable + ?Sized>(
        &self,
        entity: &E,
        attribute: &str,
        locale: Locale,
        ctx: &mut LocaleContext,
    ) -> Result<Option<String>> {
        ctx.with_locale(locale, |ctx| self.read(entity, attribute, ctx))
    }

    /// [`Translator::write`] under `locale`, leaving `ctx` unchanged afterwards.
    pub fn write_in<E: Translatable + ?Sized>(
        &self,
        entity: &mut E,
        attribute: &str,
        value: impl Into<String>,
        locale: Locale,
        ctx: &mut LocaleContext,
    ) -> Result<String> {
        ctx.with_locale(locale, |ctx| self.write(entity, attribute, value, ctx))
    }

    /// Flush staged edits after the host saved `entity`.
    pub fn after_save<E: Translatable + ?Sized>(&self, entity: &mut E) -> Result<FlushReport> {
        self.sync.after_save(entity)
    }

    /// Purge stored translations after the host destroyed `entity`.
    pub fn after_destroy<E: Translatable + ?Sized>(&self, entity: &E) -> Result<usize> {
        self.sync.after_destroy(entity)
    }

    /// See [`ScopedLookup::find_by_value`].
    pub fn find_by_value<S: EntitySource>(
        &self,
        source: &S,
        attribute: &str,
        target: &str,
        scope: &S::Scope,
        ctx: &LocaleContext,
    ) -> Result<Option<S::Entity>> {
        self.registry.descriptor(source.entity_type(), attribute)?;
        self.lookup.find_by_value(source, attribute, target, scope, ctx)
    }

    /// See [`ScopedLookup::find_by_value_or_fail`].
    pub fn find_by_value_or_fail<S: EntitySource>(
        &self,
        source: &S,
        attribute: &str,
        target: &str,
        scope: &S::Scope,
        ctx: &LocaleContext,
    ) -> Result<S::Entity> {
        self.registry.descriptor(source.entity_type(), attribute)?;
        self.lookup
            .find_by_value_or_fail(source, attribute, target, scope, ctx)
    }

    /// Check that `attribute` has a value for every locale in `locales`.
    pub fn validate_presence<E: Translatable + ?Sized>(
        &self,
        entity: &E,
        attribute: &str,
        locales: impl IntoIterator<Item = Locale>,
    ) -> Result<ValidationReport> {
        self.registry.descriptor(entity.entity_type(), attribute)?;
        PresenceValidator::new(attribute, locales).validate(&self.engine, entity)
    }

    /// Require `attribute` of `entity_type` to have a value for every locale
    /// in `locales` whenever an entity of that type is persisted.
    pub fn require_presence(
        &mut self,
        entity_type: &str,
        attribute: &str,
        locales: impl IntoIterator<Item = Locale>,
    ) -> Result<()> {
        self.registry.descriptor(entity_type, attribute)?;
        let rule = PresenceValidator::new(attribute, locales);
        info!(
            "{}.{} required for {} locale(s)",
            entity_type,
            attribute,
            rule.locales().len()
        );
        self.presence
            .entry(entity_type.to_string())
            .or_default()
            .push(rule);
        Ok(())
    }

    /// Run every presence rule of the entity's type, in registration order.
    ///
    /// The first rule with missing locales fails with
    /// [`TranslateError::MissingRequiredTranslation`](crate::TranslateError::MissingRequiredTranslation).
    pub fn check_presence<E: Translatable + ?Sized>(&self, entity: &E) -> Result<()> {
        let Some(rules) = self.presence.get(entity.entity_type()) else {
            return Ok(());
        };

        for rule in rules {
            let report = rule.validate(&self.engine, entity)?;
            if report.has_errors() {
                warn!(
                    "{} is missing {} for {:?}",
                    entity.entity_type(),
                    report.attribute,
                    report.missing
                );
                return report.into_result();
            }
        }
        Ok(())
    }

    pub fn engine(&self) -> &ResolutionEngine {
        &self.engine
    }

    pub fn metrics(&self) -> &ResolutionMetrics {
        &self.metrics
    }

    pub fn store(&self) -> &Arc<dyn TranslationStore> {
        &self.store
    }

    pub fn codec(&self) -> &KeyCodec {
        &self.codec
    }
}
