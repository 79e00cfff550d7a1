//! Translation keys: the composite address of one
//! `(entity type, attribute, entity identity)` triple in the shared store.
//!
//! Layout: `{namespace}.{entity_type}.{attribute}.{attribute}_{id}`.
//!
//! `.` closes every segment, so the prefix for `post` can never match keys
//! of `posting`. The identity is the whole segment after the last `_`, and
//! identities are integers, so the id `12` can never match keys of `112`.

use crate::error::{Result, TranslateError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default first key segment.
pub const DEFAULT_NAMESPACE: &str = "polyglot";

const SEGMENT_SEPARATOR: char = '.';
const IDENTITY_SEPARATOR: char = '_';

/// Durable identity of a persisted entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(i64);

impl EntityId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Check that `name` can be used as a key segment.
pub fn validate_segment(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "must not be empty"
    } else if name.contains(SEGMENT_SEPARATOR) {
        "must not contain '.'"
    } else if name.chars().any(|c| c.is_whitespace() || c == '%') {
        "must not contain whitespace or '%'"
    } else {
        return Ok(());
    };

    Err(TranslateError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

/// A decoded translation key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedKey {
    pub entity_type: String,
    pub attribute: String,
    pub id: EntityId,
}

/// Builds and parses translation keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCodec {
    namespace: String,
}

impl Default for KeyCodec {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl KeyCodec {
    /// Create a codec with a custom namespace segment.
    pub fn new(namespace: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        validate_segment(&namespace)?;
        Ok(Self { namespace })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Encode the key for one attribute of one entity.
    pub fn encode(&self, entity_type: &str, attribute: &str, id: EntityId) -> String {
        format!(
            "{ns}.{ty}.{attr}.{attr}{sep}{id}",
            ns = self.namespace,
            ty = entity_type,
            attr = attribute,
            sep = IDENTITY_SEPARATOR,
            id = id
        )
    }

    /// Decode every component of a key produced by [`KeyCodec::encode`].
    pub fn decode(&self, key: &str) -> Option<DecodedKey> {
        let rest = key
            .strip_prefix(self.namespace.as_str())?
            .strip_prefix(SEGMENT_SEPARATOR)?;

        let mut segments = rest.split(SEGMENT_SEPARATOR);
        let entity_type = segments.next()?;
        let attribute = segments.next()?;
        let leaf = segments.next()?;
        if segments.next().is_some() || entity_type.is_empty() || attribute.is_empty() {
            return None;
        }

        let id_part = leaf
            .strip_prefix(attribute)?
            .strip_prefix(IDENTITY_SEPARATOR)?;
        let id: EntityId = id_part.parse().ok()?;
        // Reject non-canonical forms like "+12" or "012".
        if id.to_string() != id_part {
            return None;
        }

        Some(DecodedKey {
            entity_type: entity_type.to_string(),
            attribute: attribute.to_string(),
            id,
        })
    }

    /// Pattern matching every key of an entity type.
    pub fn prefix_for_type(&self, entity_type: &str) -> KeyPattern {
        KeyPattern {
            prefix: format!("{}{sep}{}{sep}", self.namespace, entity_type, sep = SEGMENT_SEPARATOR),
            identity: None,
        }
    }

    /// Pattern matching every key of one attribute of an entity type.
    pub fn prefix_for_attribute(&self, entity_type: &str, attribute: &str) -> KeyPattern {
        KeyPattern {
            prefix: format!(
                "{}{sep}{}{sep}{}{sep}",
                self.namespace,
                entity_type,
                attribute,
                sep = SEGMENT_SEPARATOR
            ),
            identity: None,
        }
    }

    /// Pattern matching every key owned by exactly one entity.
    pub fn pattern_for_entity(&self, entity_type: &str, id: EntityId) -> KeyPattern {
        self.prefix_for_type(entity_type).with_identity(id)
    }
}

/// A key filter: a literal prefix plus an optional exact identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPattern {
    prefix: String,
    identity: Option<EntityId>,
}

impl KeyPattern {
    /// Restrict the pattern to keys whose identity segment is exactly `id`.
    pub fn with_identity(mut self, id: EntityId) -> Self {
        self.identity = Some(id);
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn identity(&self) -> Option<EntityId> {
        self.identity
    }

    /// Check whether `key` matches this pattern.
    pub fn matches(&self, key: &str) -> bool {
        if !key.starts_with(&self.prefix) {
            return false;
        }

        match self.identity {
            None => true,
            Some(id) => key
                .rsplit_once(IDENTITY_SEPARATOR)
                .is_some_and(|(_, tail)| tail == id.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ==================== encode / decode Tests ====================

    #[test]
    fn test_encode_layout() {
        let codec = KeyCodec::default();
        assert_eq!(
            codec.encode("posts", "title", EntityId::new(12)),
            "polyglot.posts.title.title_12"
        );
    }

    #[test]
    fn test_custom_namespace() {
        let codec = KeyCodec::new("catalog").expect("Should accept namespace");
        assert_eq!(
            codec.encode("posts", "text", EntityId::new(3)),
            "catalog.posts.text.text_3"
        );
    }

    #[test]
    fn test_invalid_namespace() {
        assert!(KeyCodec::new("a.b").is_err());
        assert!(KeyCodec::new("").is_err());
    }

    #[test]
    fn test_decode_identity() {
        let codec = KeyCodec::default();
        let key = codec.encode("posts", "sub_title", EntityId::new(42));
        assert_eq!(codec.decode(&key).map(|d| d.id), Some(EntityId::new(42)));
    }

    #[test]
    fn test_decode_identity_negative() {
        let codec = KeyCodec::default();
        let key = codec.encode("posts", "title", EntityId::new(-7));
        assert_eq!(codec.decode(&key).map(|d| d.id), Some(EntityId::new(-7)));
    }

    #[test]
    fn test_decode_rejects_bad_identity() {
        let codec = KeyCodec::default();
        assert!(codec.decode("polyglot.posts.title.title").is_none());
        assert!(codec.decode("polyglot.posts.title.title_x").is_none());
        assert!(codec.decode("polyglot.posts.title.title_012").is_none());
        assert!(codec.decode("polyglot.posts.title.title_+1").is_none());
    }

    #[test]
    fn test_decode_full_key() {
        let codec = KeyCodec::default();
        let decoded = codec
            .decode("polyglot.blog_posts.sub_title.sub_title_9")
            .expect("Should decode");
        assert_eq!(decoded.entity_type, "blog_posts");
        assert_eq!(decoded.attribute, "sub_title");
        assert_eq!(decoded.id, EntityId::new(9));
    }

    #[test]
    fn test_decode_rejects_foreign_namespace() {
        let codec = KeyCodec::default();
        assert!(codec.decode("other.posts.title.title_1").is_none());
        assert!(codec.decode("polyglotx.posts.title.title_1").is_none());
    }

    #[test]
    fn test_decode_rejects_mismatched_leaf() {
        let codec = KeyCodec::default();
        assert!(codec.decode("polyglot.posts.title.text_1").is_none());
        assert!(codec.decode("polyglot.posts.title.title_1.extra").is_none());
    }

    // ==================== Pattern Tests ====================

    #[test]
    fn test_type_prefix_does_not_overmatch() {
        let codec = KeyCodec::default();
        let post = codec.prefix_for_type("post");
        assert!(post.matches("polyglot.post.title.title_1"));
        assert!(!post.matches("polyglot.posting.title.title_1"));
    }

    #[test]
    fn test_attribute_prefix() {
        let codec = KeyCodec::default();
        let pattern = codec.prefix_for_attribute("posts", "title");
        assert_eq!(pattern.prefix(), "polyglot.posts.title.");
        assert!(pattern.matches("polyglot.posts.title.title_1"));
        assert!(!pattern.matches("polyglot.posts.text.text_1"));
        assert!(!pattern.matches("polyglot.posts.title_long.title_long_1"));
    }

    #[test]
    fn test_entity_pattern_isolates_suffix_ids() {
        let codec = KeyCodec::default();
        let pattern = codec.pattern_for_entity("posts", EntityId::new(12));
        assert!(pattern.matches("polyglot.posts.title.title_12"));
        assert!(pattern.matches("polyglot.posts.text.text_12"));
        assert!(!pattern.matches("polyglot.posts.title.title_112"));
        assert!(!pattern.matches("polyglot.posts.title.title_1"));
        assert!(!pattern.matches("polyglot.comments.msg.msg_12"));
    }

    #[test]
    fn test_validate_segment() {
        assert!(validate_segment("blog_posts").is_ok());
        assert!(validate_segment("").is_err());
        assert!(validate_segment("a.b").is_err());
        assert!(validate_segment("a b").is_err());
        assert!(validate_segment("a%").is_err());
    }

    // ==================== Property Tests ====================

    proptest! {
        #[test]
        fn prop_identity_recoverable(
            ty in "[a-z][a-z_]{0,12}",
            attr in "[a-z][a-z_]{0,12}",
            id in any::<i64>(),
        ) {
            let codec = KeyCodec::default();
            let key = codec.encode(&ty, &attr, EntityId::new(id));
            let decoded = codec.decode(&key).expect("encoded keys decode");
            prop_assert_eq!(decoded.id, EntityId::new(id));
            prop_assert_eq!(decoded.entity_type, ty);
            prop_assert_eq!(decoded.attribute, attr);
        }

        #[test]
        fn prop_entity_pattern_matches_only_owner(
            attr in "[a-z][a-z_]{0,12}",
            owner in 0i64..10_000,
            other in 0i64..10_000,
        ) {
            let codec = KeyCodec::default();
            let pattern = codec.pattern_for_entity("posts", EntityId::new(owner));
            let other_key = codec.encode("posts", &attr, EntityId::new(other));
            prop_assert_eq!(pattern.matches(&other_key), owner == other);
        }
    }
}
