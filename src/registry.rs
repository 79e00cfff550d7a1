//! Per-entity-type declarations of translated attributes.
//!
//! Each entity type declares its translated attributes exactly once. The
//! registry hands out one [`AttributeDescriptor`] per attribute; a
//! descriptor carries the attribute's setter, getter and changed-predicate,
//! optionally wrapped by caller-supplied decorators.

use crate::error::{Result, TranslateError};
use crate::i18n::LocaleContext;
use crate::key::validate_segment;
use crate::model::Translatable;
use crate::resolve::ResolutionEngine;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Transforms a value before it is staged.
pub type WriteDecorator = Arc<dyn Fn(String) -> String + Send + Sync>;

/// Transforms the resolved value before it is returned.
pub type ReadDecorator = Arc<dyn Fn(Option<String>) -> Option<String> + Send + Sync>;

/// One attribute in a declaration.
#[derive(Clone)]
pub struct AttributeSpec {
    name: String,
    on_write: Option<WriteDecorator>,
    on_read: Option<ReadDecorator>,
}

impl AttributeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on_write: None,
            on_read: None,
        }
    }

    /// Decorate every written value.
    pub fn on_write(mut self, f: impl Fn(String) -> String + Send + Sync + 'static) -> Self {
        self.on_write = Some(Arc::new(f));
        self
    }

    /// Decorate every resolved value.
    pub fn on_read(mut self, f: impl Fn(Option<String>) -> Option<String> + Send + Sync + 'static) -> Self {
        self.on_read = Some(Arc::new(f));
        self
    }
}

impl From<&str> for AttributeSpec {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for AttributeSpec {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Accessors for one declared attribute.
#[derive(Clone)]
pub struct AttributeDescriptor {
    entity_type: String,
    name: String,
    on_write: Option<WriteDecorator>,
    on_read: Option<ReadDecorator>,
}

impl fmt::Debug for AttributeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeDescriptor")
            .field("entity_type", &self.entity_type)
            .field("name", &self.name)
            .field("on_write", &self.on_write.is_some())
            .field("on_read", &self.on_read.is_some())
            .finish()
    }
}

impl AttributeDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Stage `value` under the active locale and return what was staged.
    pub fn set<E: Translatable + ?Sized>(&self, entity: &mut E, value: impl Into<String>, ctx: &LocaleContext) -> String {
        let value = match &self.on_write {
            Some(decorate) => decorate(value.into()),
            None => value.into(),
        };
        entity
            .staging_mut()
            .set(ctx.active(), &self.name, value)
            .to_string()
    }

    /// Resolve the attribute under `ctx`.
    pub fn get<E: Translatable + ?Sized>(
        &self,
        engine: &ResolutionEngine,
        entity: &E,
        ctx: &LocaleContext,
    ) -> Result<Option<String>> {
        let value = engine.resolve(entity, &self.name, ctx)?;
        Ok(match &self.on_read {
            Some(decorate) => decorate(value),
            None => value,
        })
    }

    /// Whether a non-blank edit is staged under the active locale.
    pub fn is_changed<E: Translatable + ?Sized>(&self, entity: &E, ctx: &LocaleContext) -> bool {
        entity.staging().is_changed(ctx, &self.name)
    }
}

/// Declared translated attributes, by entity type.
#[derive(Debug, Default)]
pub struct AttributeRegistry {
    declarations: BTreeMap<String, Vec<AttributeDescriptor>>,
}

impl AttributeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the translated attributes of `entity_type`.
    ///
    /// Fails with [`TranslateError::DuplicateDeclaration`] if the type was
    /// already declared. Repeated names keep their first occurrence.
    pub fn declare<I>(&mut self, entity_type: &str, attributes: I) -> Result<&[AttributeDescriptor]>
    where
        I: IntoIterator,
        I::Item: Into<AttributeSpec>,
    {
        if self.declarations.contains_key(entity_type) {
            return Err(TranslateError::DuplicateDeclaration {
                entity_type: entity_type.to_string(),
            });
        }
        validate_segment(entity_type)?;

        let mut descriptors: Vec<AttributeDescriptor> = Vec::new();
        for spec in attributes.into_iter().map(Into::<AttributeSpec>::into) {
            validate_segment(&spec.name)?;
            if descriptors.iter().any(|d| d.name == spec.name) {
                continue;
            }
            descriptors.push(AttributeDescriptor {
                entity_type: entity_type.to_string(),
                name: spec.name,
                on_write: spec.on_write,
                on_read: spec.on_read,
            });
        }

        info!(
            "Declared {} translated attribute(s) for {}",
            descriptors.len(),
            entity_type
        );
        let slot = self
            .declarations
            .entry(entity_type.to_string())
            .or_insert(descriptors);
        Ok(slot.as_slice())
    }

    /// Descriptors of `entity_type` in declaration order.
    pub fn attributes(&self, entity_type: &str) -> &[AttributeDescriptor] {
        self.declarations
            .get(entity_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Attribute names of `entity_type` in declaration order.
    pub fn attribute_names(&self, entity_type: &str) -> Vec<&str> {
        self.attributes(entity_type)
            .iter()
            .map(AttributeDescriptor::name)
            .collect()
    }

    pub fn descriptor(&self, entity_type: &str, attribute: &str) -> Result<&AttributeDescriptor> {
        self.attributes(entity_type)
            .iter()
            .find(|d| d.name == attribute)
            .ok_or_else(|| TranslateError::UndeclaredAttribute {
                entity_type: entity_type.to_string(),
                attribute: attribute.to_string(),
            })
    }

    pub fn is_declared(&self, entity_type: &str) -> bool {
        self.declarations.contains_key(entity_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Locale;
    use crate::key::KeyCodec;
    use crate::model::Record;
    use crate::store::MemoryStore;

    fn loc(code: &str) -> Locale {
        Locale::new(code).unwrap()
    }

    fn engine() -> ResolutionEngine {
        ResolutionEngine::new(Arc::new(MemoryStore::new()), KeyCodec::default(), Default::default())
    }

    // ==================== declare Tests ====================

    #[test]
    fn test_declare_preserves_order() {
        let mut registry = AttributeRegistry::new();
        let declared = registry.declare("posts", ["title", "text"]).unwrap();
        assert_eq!(declared.len(), 2);
        assert_eq!(registry.attribute_names("posts"), vec!["title", "text"]);
        assert!(registry.is_declared("posts"));
    }

    #[test]
    fn test_duplicate_declaration_fails() {
        let mut registry = AttributeRegistry::new();
        registry.declare("posts", ["title", "text"]).unwrap();

        let err = registry.declare("posts", ["title", "text"]).unwrap_err();
        assert!(matches!(err, TranslateError::DuplicateDeclaration { ref entity_type } if entity_type == "posts"));
        assert_eq!(registry.attribute_names("posts"), vec!["title", "text"]);
    }

    #[test]
    fn test_repeated_names_collapse() {
        let mut registry = AttributeRegistry::new();
        registry.declare("posts", ["title", "text", "title"]).unwrap();
        assert_eq!(registry.attribute_names("posts"), vec!["title", "text"]);
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut registry = AttributeRegistry::new();
        assert!(registry.declare("posts", ["sub.title"]).is_err());
        assert!(registry.declare("bad type", ["title"]).is_err());
        assert!(!registry.is_declared("bad type"));
        // A failed declaration does not count as one.
        assert!(registry.declare("posts", ["title"]).is_ok());
    }

    #[test]
    fn test_undeclared_lookups() {
        let mut registry = AttributeRegistry::new();
        registry.declare("posts", ["title"]).unwrap();

        assert!(registry.attributes("comments").is_empty());
        assert!(matches!(
            registry.descriptor("posts", "text"),
            Err(TranslateError::UndeclaredAttribute { .. })
        ));
    }

    // ==================== Descriptor Tests ====================

    #[test]
    fn test_descriptor_set_get_changed() {
        let mut registry = AttributeRegistry::new();
        registry.declare("posts", ["title"]).unwrap();
        let title = registry.descriptor("posts", "title").unwrap();
        let ctx = LocaleContext::new(loc("en"));
        let mut post = Record::new("posts");

        assert!(!title.is_changed(&post, &ctx));
        assert_eq!(title.set(&mut post, "Foo bar title", &ctx), "Foo bar title");
        assert!(title.is_changed(&post, &ctx));
        assert_eq!(
            title.get(&engine(), &post, &ctx).unwrap().as_deref(),
            Some("Foo bar title")
        );
    }

    #[test]
    fn test_decorators_wrap_base_accessors() {
        let mut registry = AttributeRegistry::new();
        registry
            .declare(
                "products",
                [
                    AttributeSpec::new("name").on_read(|v| v.map(|s| format!("{} customized", s))),
                    AttributeSpec::new("description").on_write(|v| format!("{}_override", v)),
                ],
            )
            .unwrap();
        let ctx = LocaleContext::new(loc("en"));
        let mut product = Record::new("products");

        let name = registry.descriptor("products", "name").unwrap();
        name.set(&mut product, "Foo", &ctx);
        assert_eq!(name.get(&engine(), &product, &ctx).unwrap().as_deref(), Some("Foo customized"));

        let description = registry.descriptor("products", "description").unwrap();
        assert_eq!(description.set(&mut product, "Bar", &ctx), "Bar_override");
        assert_eq!(product.staging().get(&loc("en"), "description"), Some("Bar_override"));
    }
}
