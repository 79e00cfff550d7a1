//! Reverse lookup: find an entity by the translated value of an attribute.

use crate::error::{Result, TranslateError};
use crate::i18n::LocaleContext;
use crate::key::KeyCodec;
use crate::model::EntitySource;
use crate::store::TranslationStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Finds entities by translated value within a caller-supplied scope.
#[derive(Clone)]
pub struct ScopedLookup {
    store: Arc<dyn TranslationStore>,
    codec: KeyCodec,
}

impl ScopedLookup {
    pub fn new(store: Arc<dyn TranslationStore>, codec: KeyCodec) -> Self {
        Self { store, codec }
    }

    /// First entity of `source` inside `scope` whose `attribute` reads
    /// `target` under the active locale.
    ///
    /// When no stored translation has that value, the raw column is
    /// searched instead. Candidates outside `scope` are skipped; when
    /// several match, the first in store order wins.
    pub fn find_by_value<S: EntitySource>(
        &self,
        source: &S,
        attribute: &str,
        target: &str,
        scope: &S::Scope,
        ctx: &LocaleContext,
    ) -> Result<Option<S::Entity>> {
        let entity_type = source.entity_type();
        let pattern = self.codec.prefix_for_attribute(entity_type, attribute);
        let rows = self.store.find_where(ctx.active(), target, &pattern)?;

        if rows.is_empty() {
            debug!(
                "No {} translation of {}.{} equals {:?}, searching raw column",
                ctx.active(),
                entity_type,
                attribute,
                target
            );
            return source.find_by_raw_in_scope(attribute, target, scope);
        }

        for row in &rows {
            let id = match self.codec.decode(&row.key) {
                Some(decoded) if decoded.entity_type == entity_type && decoded.attribute == attribute => {
                    decoded.id
                }
                _ => {
                    warn!("Skipping translation key {} not owned by {}.{}", row.key, entity_type, attribute);
                    continue;
                }
            };
            if let Some(entity) = source.find_in_scope(id, scope)? {
                return Ok(Some(entity));
            }
        }

        debug!(
            "{} candidate(s) for {}.{} = {:?}, none in scope",
            rows.len(),
            entity_type,
            attribute,
            target
        );
        Ok(None)
    }

    /// Like [`ScopedLookup::find_by_value`], but a miss is
    /// [`TranslateError::RecordNotFound`].
    pub fn find_by_value_or_fail<S: EntitySource>(
        &self,
        source: &S,
        attribute: &str,
        target: &str,
        scope: &S::Scope,
        ctx: &LocaleContext,
    ) -> Result<S::Entity> {
        self.find_by_value(source, attribute, target, scope, ctx)?
            .ok_or_else(|| TranslateError::RecordNotFound {
                entity_type: source.entity_type().to_string(),
                attribute: attribute.to_string(),
                value: target.to_string(),
            })
    }
}
