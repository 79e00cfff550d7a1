use crate::error::{Result, TranslateError};
use crate::i18n::Locale;
use crate::key::KeyPattern;
use crate::store::{TranslationRow, TranslationStore};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

const CREATE_TRANSLATIONS: &str = "CREATE TABLE IF NOT EXISTS translations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    locale TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (locale, key)
)";

const CREATE_KEY_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_translations_key ON translations (key)";

// Prefix searches are the range [prefix, upper bound) so they can use the
// key index.
const SELECT_BY_PREFIX: &str = "SELECT id, key FROM translations
     WHERE key >= ?1 AND key < ?2
     ORDER BY id";

const SELECT_BY_VALUE_AND_PREFIX: &str = "SELECT key FROM translations
     WHERE locale = ?1 AND value = ?2 AND key >= ?3 AND key < ?4
     ORDER BY id";

const UPSERT: &str = "INSERT INTO translations (locale, key, value, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?4)
     ON CONFLICT (locale, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at";

/// SQLite-backed translation store.
///
/// Clones share one connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the store at `path` and make sure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Create a store backed by a private in-memory database.
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wrap an existing connection, creating or upgrading the schema.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        if Self::needs_migration(&conn)? {
            Self::run_migration(&conn)?;
        } else {
            conn.execute(CREATE_TRANSLATIONS, [])?;
        }
        conn.execute(CREATE_KEY_INDEX, [])?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Check whether a `translations` table from a plain i18n backend
    /// (no timestamps, no uniqueness) has to be upgraded.
    fn needs_migration(conn: &Connection) -> Result<bool> {
        let table_exists: bool = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='translations'",
            [],
            |row| row.get::<_, i64>(0).map(|count| count > 0),
        )?;

        if !table_exists {
            return Ok(false);
        }

        let column_exists: bool = conn.query_row(
            "SELECT COUNT(*) FROM pragma_table_info('translations') WHERE name='updated_at'",
            [],
            |row| row.get::<_, i64>(0).map(|count| count > 0),
        )?;

        Ok(!column_exists)
    }

    fn run_migration(conn: &Connection) -> Result<()> {
        conn.execute("BEGIN TRANSACTION", [])?;

        match Self::run_migration_inner(conn) {
            Ok(copied) => {
                conn.execute("COMMIT", [])?;
                info!("Upgraded translations table ({} rows kept)", copied);
                Ok(())
            }
            Err(e) => {
                conn.execute("ROLLBACK", [])?;
                Err(e)
            }
        }
    }

    fn run_migration_inner(conn: &Connection) -> Result<usize> {
        conn.execute(
            &CREATE_TRANSLATIONS.replace("IF NOT EXISTS translations", "translations_new"),
            [],
        )?;

        // Rows without a value carry nothing to resolve. The newest row wins
        // when the old table holds duplicates for one (locale, key).
        let now = Utc::now().to_rfc3339();
        let copied = conn.execute(
            "INSERT INTO translations_new (locale, key, value, created_at, updated_at)
             SELECT locale, key, value, ?1, ?1
             FROM translations
             WHERE id IN (
                 SELECT MAX(id) FROM translations
                 WHERE locale IS NOT NULL AND key IS NOT NULL AND value IS NOT NULL
                 GROUP BY locale, key
             )
             ORDER BY id",
            params![now],
        )?;

        conn.execute("DROP TABLE translations", [])?;
        conn.execute("ALTER TABLE translations_new RENAME TO translations", [])?;

        Ok(copied)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| TranslateError::LockPoisoned)
    }

    /// Every row in id order.
    pub fn rows(&self) -> Result<Vec<TranslationRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT locale, key, value FROM translations ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<std::result::Result<Vec<(String, String, String)>, _>>()?;

        rows.into_iter()
            .map(|(locale, key, value)| Ok(TranslationRow::new(Locale::new(locale)?, key, value)))
            .collect()
    }

    /// Keys under `pattern`'s prefix that match the full pattern, with row ids.
    fn matching_ids(conn: &Connection, pattern: &KeyPattern) -> Result<Vec<i64>> {
        let mut stmt = conn.prepare(SELECT_BY_PREFIX)?;
        let candidates = stmt
            .query_map(params![pattern.prefix(), prefix_upper_bound(pattern.prefix())], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(candidates
            .into_iter()
            .filter(|(_, key)| pattern.matches(key))
            .map(|(id, _)| id)
            .collect())
    }
}

/// Smallest string greater than every string starting with `prefix`.
///
/// SQLite compares TEXT bytewise and UTF-8 preserves code point order, so
/// bumping the last character that can be bumped is enough.
fn prefix_upper_bound(prefix: &str) -> String {
    let mut chars: Vec<char> = prefix.chars().collect();
    while let Some(last) = chars.pop() {
        if let Some(next) = (last as u32 + 1..=char::MAX as u32).find_map(char::from_u32) {
            chars.push(next);
            return chars.into_iter().collect();
        }
    }
    // Only reachable for prefixes made entirely of char::MAX.
    format!("{}{}", prefix, char::MAX)
}

impl TranslationStore for SqliteStore {
    fn upsert(&self, locale: &Locale, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(UPSERT, params![locale.as_str(), key, value, now])?;
        Ok(())
    }

    fn delete_where(&self, pattern: &KeyPattern) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let ids = Self::matching_ids(&tx, pattern)?;
        let mut removed = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM translations WHERE id = ?1")?;
            for id in &ids {
                removed += stmt.execute(params![id])?;
            }
        }

        tx.commit()?;
        Ok(removed)
    }

    fn find_one(&self, locale: &Locale, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT value FROM translations WHERE locale = ?1 AND key = ?2")?;
        let value = stmt
            .query_row(params![locale.as_str(), key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn find_where(
        &self,
        locale: &Locale,
        value: &str,
        pattern: &KeyPattern,
    ) -> Result<Vec<TranslationRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(SELECT_BY_VALUE_AND_PREFIX)?;
        let upper = prefix_upper_bound(pattern.prefix());
        let keys = stmt
            .query_map(params![locale.as_str(), value, pattern.prefix(), upper], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(keys
            .into_iter()
            .filter(|key| pattern.matches(key))
            .map(|key| TranslationRow::new(locale.clone(), key, value))
            .collect())
    }

    fn insert_all(&self, rows: &[TranslationRow]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        {
            let mut stmt = tx.prepare(UPSERT)?;
            for row in rows {
                stmt.execute(params![row.locale.as_str(), row.key, row.value, now])?;
            }
        }

        // Dropping `tx` on an early return above rolls the batch back.
        tx.commit()?;
        Ok(rows.len())
    }

    fn count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM translations", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn clear(&self) -> Result<usize> {
        let conn = self.conn()?;
        Ok(conn.execute("DELETE FROM translations", [])?)
    }
}
