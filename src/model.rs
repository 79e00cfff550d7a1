//! Entity model seams.
//!
//! [`Translatable`] is what a host entity exposes to the engine and
//! [`EntitySource`] is what a host query layer exposes to scoped lookups.
//! [`Record`] and [`RecordTable`] implement both over an in-memory column
//! map, enough to host translated attributes without a full ORM.

use crate::error::Result;
use crate::key::EntityId;
use crate::staging::StagingCache;
use crate::translator::Translator;
use std::collections::BTreeMap;
use tracing::debug;

/// An entity whose attributes can carry per-locale values.
pub trait Translatable {
    /// Entity type name used in translation keys (e.g., "posts").
    fn entity_type(&self) -> &str;

    /// Durable identity, or `None` for a never-persisted entity.
    fn id(&self) -> Option<EntityId>;

    /// The untranslated column value of `attribute`.
    fn raw_value(&self, attribute: &str) -> Option<&str>;

    fn staging(&self) -> &StagingCache;

    fn staging_mut(&mut self) -> &mut StagingCache;

    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }
}

/// The primary entity collection, as seen by scoped lookups.
pub trait EntitySource {
    type Entity: Translatable;

    /// Caller-supplied filter the lookup must respect.
    type Scope;

    fn entity_type(&self) -> &str;

    /// Load the entity with `id` if it exists and satisfies `scope`.
    fn find_in_scope(&self, id: EntityId, scope: &Self::Scope) -> Result<Option<Self::Entity>>;

    /// First entity satisfying `scope` whose raw `attribute` column equals `value`.
    fn find_by_raw_in_scope(
        &self,
        attribute: &str,
        value: &str,
        scope: &Self::Scope,
    ) -> Result<Option<Self::Entity>>;
}

/// A generic entity: typed columns plus its staging cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    entity_type: String,
    id: Option<EntityId>,
    columns: BTreeMap<String, Option<String>>,
    staging: StagingCache,
}

impl Record {
    /// Create a new, unpersisted record.
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: None,
            columns: BTreeMap::new(),
            staging: StagingCache::new(),
        }
    }

    /// Builder form of [`Record::set_raw`].
    pub fn with_column(mut self, column: &str, value: impl Into<String>) -> Self {
        self.set_raw(column, Some(value.into()));
        self
    }

    /// Write the untranslated column directly, bypassing translation.
    pub fn set_raw(&mut self, column: &str, value: Option<String>) {
        self.columns.insert(column.to_string(), value);
    }

    pub fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    /// Copy of the persisted state: same columns and id, nothing staged.
    fn reloaded(&self) -> Self {
        Self {
            staging: StagingCache::new(),
            ..self.clone()
        }
    }
}

impl Translatable for Record {
    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn raw_value(&self, attribute: &str) -> Option<&str> {
        self.columns.get(attribute).and_then(|v| v.as_deref())
    }

    fn staging(&self) -> &StagingCache {
        &self.staging
    }

    fn staging_mut(&mut self) -> &mut StagingCache {
        &mut self.staging
    }
}

/// One column condition of a [`Scope`].
///
/// Conditions follow SQL semantics: a NULL column satisfies neither
/// `Eq` nor `Ne`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Eq(String, String),
    Ne(String, String),
    IsNull(String),
}

impl Condition {
    fn matches(&self, record: &Record) -> bool {
        match self {
            Condition::Eq(column, value) => record.raw_value(column) == Some(value.as_str()),
            Condition::Ne(column, value) => record
                .raw_value(column)
                .is_some_and(|actual| actual != value.as_str()),
            Condition::IsNull(column) => record.raw_value(column).is_none(),
        }
    }
}

/// A conjunction of column conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    conditions: Vec<Condition>,
}

impl Scope {
    /// Scope matching every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, column: &str, value: impl Into<String>) -> Self {
        self.conditions
            .push(Condition::Eq(column.to_string(), value.into()));
        self
    }

    pub fn where_ne(mut self, column: &str, value: impl Into<String>) -> Self {
        self.conditions
            .push(Condition::Ne(column.to_string(), value.into()));
        self
    }

    pub fn where_null(mut self, column: &str) -> Self {
        self.conditions.push(Condition::IsNull(column.to_string()));
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }
}

/// In-memory collection of records of one entity type.
#[derive(Debug, Clone)]
pub struct RecordTable {
    entity_type: String,
    rows: Vec<Record>,
    next_id: i64,
}

impl RecordTable {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            rows: Vec::new(),
            next_id: 1,
        }
    }

    /// Store `record`'s columns, assigning an id on first save.
    ///
    /// Staged translations are left untouched; see [`RecordTable::persist`].
    pub fn save(&mut self, record: &mut Record) -> EntityId {
        let id = match record.id {
            Some(id) => id,
            None => {
                let id = EntityId::new(self.next_id);
                self.next_id += 1;
                record.set_id(id);
                id
            }
        };

        let stored = record.reloaded();
        match self.rows.iter_mut().find(|row| row.id == Some(id)) {
            Some(row) => *row = stored,
            None => self.rows.push(stored),
        }
        id
    }

    /// Save `record` and flush its staged translations.
    ///
    /// The translator's presence rules run first; a failing rule leaves both
    /// the table and the store untouched.
    pub fn persist(&mut self, record: &mut Record, translator: &Translator) -> Result<EntityId> {
        translator.check_presence(record)?;
        let id = self.save(record);
        let report = translator.after_save(record)?;
        debug!(
            "Persisted {} #{} ({} translations)",
            self.entity_type, id, report.rows_written
        );
        Ok(id)
    }

    /// Remove `record` and purge its translations.
    pub fn destroy(&mut self, record: &Record, translator: &Translator) -> Result<usize> {
        if let Some(id) = record.id {
            self.rows.retain(|row| row.id != Some(id));
        }
        translator.after_destroy(record)
    }

    /// Load a fresh copy of the record with `id`.
    pub fn get(&self, id: EntityId) -> Option<Record> {
        self.rows.iter().find(|row| row.id == Some(id)).cloned()
    }

    /// Load the first record.
    pub fn first(&self) -> Option<Record> {
        self.rows.first().cloned()
    }

    /// Load the last record.
    pub fn last(&self) -> Option<Record> {
        self.rows.last().cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl EntitySource for RecordTable {
    type Entity = Record;
    type Scope = Scope;

    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn find_in_scope(&self, id: EntityId, scope: &Scope) -> Result<Option<Record>> {
        Ok(self
            .rows
            .iter()
            .find(|row| row.id == Some(id) && scope.matches(row))
            .cloned())
    }

    fn find_by_raw_in_scope(&self, attribute: &str, value: &str, scope: &Scope) -> Result<Option<Record>> {
        let scope = scope.clone().where_eq(attribute, value);
        Ok(self.rows.iter().find(|row| scope.matches(row)).cloned())
    }
}
