//! One-shot importer from per-locale side tables.
//!
//! The legacy layout keeps one table per model, `<model>_translations`, with
//! a row per `(<model>_id, locale)` and one column per translated attribute.
//! Every non-empty cell becomes one [`TranslationRow`] keyed through the
//! [`KeyCodec`], and the whole set is written with a single
//! [`TranslationStore::insert_all`].

use crate::error::{Result, TranslateError};
use crate::i18n::Locale;
use crate::key::{validate_segment, EntityId, KeyCodec};
use crate::store::{TranslationRow, TranslationStore};
use inflector::Inflector;
use regex::Regex;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, warn};

const TABLE_PATTERN: &str = r"^(\w+)_translations$";

/// Bookkeeping columns that never hold translations.
const RESERVED_COLUMNS: [&str; 4] = ["id", "locale", "created_at", "updated_at"];

/// One legacy side table and how it maps onto translation keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTable {
    pub table: String,
    pub owner_column: String,
    pub entity_type: String,
}

impl LegacyTable {
    pub fn new(
        table: impl Into<String>,
        owner_column: impl Into<String>,
        entity_type: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            owner_column: owner_column.into(),
            entity_type: entity_type.into(),
        }
    }

    /// Conventional mapping for `model`: table `<model>_translations`,
    /// owner column `<model>_id`, entity type the plural of `model`.
    pub fn for_model(model: &str) -> Self {
        Self::new(
            format!("{}_translations", model),
            format!("{}_id", model),
            model.to_plural(),
        )
    }

    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = entity_type.into();
        self
    }

    /// Parse entity type overrides in the `model=entity_type;...` format.
    pub fn parse_overrides(overrides: &str) -> Result<Vec<LegacyTable>> {
        overrides
            .split(';')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(|entry| -> Result<LegacyTable> {
                let (model, entity_type) = entry
                    .split_once('=')
                    .map(|(m, t)| (m.trim(), t.trim()))
                    .filter(|(m, t)| !m.is_empty() && !t.is_empty())
                    .ok_or_else(|| {
                        TranslateError::Legacy(format!("expected model=entity_type, got '{}'", entry))
                    })?;
                validate_segment(entity_type)?;
                Ok(LegacyTable::for_model(model).with_entity_type(entity_type))
            })
            .collect()
    }
}

/// Summary of one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub tables: usize,
    pub rows: usize,
    pub skipped_cells: usize,
}

pub struct LegacyImporter {
    codec: KeyCodec,
    overrides: Vec<LegacyTable>,
}

impl LegacyImporter {
    pub fn new(codec: KeyCodec) -> Self {
        Self {
            codec,
            overrides: Vec::new(),
        }
    }

    /// Use these mappings instead of the conventional ones for discovered
    /// tables with the same name.
    pub fn with_overrides(mut self, overrides: impl IntoIterator<Item = LegacyTable>) -> Self {
        self.overrides.extend(overrides);
        self
    }

    /// Find every `<model>_translations` table in `conn`.
    pub fn discover(&self, conn: &Connection) -> Result<Vec<LegacyTable>> {
        let pattern = Regex::new(TABLE_PATTERN).map_err(|e| TranslateError::Legacy(e.to_string()))?;

        let mut stmt =
            conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(names
            .iter()
            .filter_map(|name| pattern.captures(name))
            .filter_map(|caps| caps.get(1))
            .map(|model| {
                let conventional = LegacyTable::for_model(model.as_str());
                self.overrides
                    .iter()
                    .find(|o| o.table == conventional.table)
                    .cloned()
                    .unwrap_or(conventional)
            })
            .collect())
    }

    /// Read every translation cell of `tables`.
    pub fn collect(&self, conn: &Connection, tables: &[LegacyTable]) -> Result<(Vec<TranslationRow>, ImportReport)> {
        let mut rows = Vec::new();
        let mut report = ImportReport::default();

        for table in tables {
            let skipped = self.collect_table(conn, table, &mut rows)?;
            report.tables += 1;
            report.skipped_cells += skipped;
        }

        report.rows = rows.len();
        Ok((rows, report))
    }

    /// Discover legacy tables in `conn` and write their cells into `store`.
    pub fn import(&self, conn: &Connection, store: &dyn TranslationStore) -> Result<ImportReport> {
        let tables = self.discover(conn)?;
        self.import_tables(conn, &tables, store)
    }

    /// Write the cells of `tables` into `store` as one batch.
    pub fn import_tables(
        &self,
        conn: &Connection,
        tables: &[LegacyTable],
        store: &dyn TranslationStore,
    ) -> Result<ImportReport> {
        let (rows, report) = self.collect(conn, tables)?;
        store.insert_all(&rows)?;

        info!(
            "Imported {} translations from {} legacy table(s)",
            report.rows, report.tables
        );
        Ok(report)
    }

    fn collect_table(&self, conn: &Connection, table: &LegacyTable, out: &mut Vec<TranslationRow>) -> Result<usize> {
        for name in [&table.table, &table.owner_column, &table.entity_type] {
            validate_segment(name)?;
            if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(TranslateError::Legacy(format!("unsupported identifier `{}`", name)));
            }
        }

        let mut stmt = conn.prepare(&format!("SELECT * FROM {} ORDER BY rowid", table.table))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();

        let position = |column: &str| {
            columns.iter().position(|c| c == column).ok_or_else(|| {
                TranslateError::Legacy(format!("table `{}` has no `{}` column", table.table, column))
            })
        };
        let owner_idx = position(table.owner_column.as_str())?;
        let locale_idx = position("locale")?;

        let attributes: Vec<(usize, &str)> = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !RESERVED_COLUMNS.contains(&c.as_str()) && **c != table.owner_column)
            .map(|(i, c)| (i, c.as_str()))
            .collect();
        for (_, attribute) in &attributes {
            validate_segment(attribute)?;
        }

        let mut skipped = 0;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let id = EntityId::new(row.get::<_, i64>(owner_idx)?);
            let locale = Locale::new(row.get::<_, String>(locale_idx)?)?;

            for &(idx, attribute) in &attributes {
                let value = match row.get_ref(idx)? {
                    ValueRef::Null => continue,
                    ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned(),
                    ValueRef::Integer(n) => n.to_string(),
                    ValueRef::Real(f) => f.to_string(),
                    ValueRef::Blob(_) => {
                        warn!(
                            "Skipping blob cell {}.{} for {} #{}",
                            table.table, attribute, locale, id
                        );
                        skipped += 1;
                        continue;
                    }
                };
                if value.is_empty() {
                    continue;
                }

                let key = self.codec.encode(&table.entity_type, attribute, id);
                out.push(TranslationRow::new(locale.clone(), key, value));
            }
        }

        Ok(skipped)
    }
}
