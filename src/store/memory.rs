use crate::error::{Result, TranslateError};
use crate::i18n::Locale;
use crate::key::KeyPattern;
use crate::store::{TranslationRow, TranslationStore};
use std::sync::{Mutex, MutexGuard};

/// In-process translation store.
///
/// Rows keep their insertion order; updating a row leaves it in place.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<TranslationRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every row in insertion order.
    pub fn rows(&self) -> Result<Vec<TranslationRow>> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<TranslationRow>>> {
        self.rows.lock().map_err(|_| TranslateError::LockPoisoned)
    }

    fn upsert_locked(rows: &mut Vec<TranslationRow>, locale: &Locale, key: &str, value: &str) {
        match rows
            .iter_mut()
            .find(|row| &row.locale == locale && row.key == key)
        {
            Some(row) => row.value = value.to_string(),
            None => rows.push(TranslationRow::new(locale.clone(), key, value)),
        }
    }
}

impl TranslationStore for MemoryStore {
    fn upsert(&self, locale: &Locale, key: &str, value: &str) -> Result<()> {
        let mut rows = self.lock()?;
        Self::upsert_locked(&mut rows, locale, key, value);
        Ok(())
    }

    fn delete_where(&self, pattern: &KeyPattern) -> Result<usize> {
        let mut rows = self.lock()?;
        let before = rows.len();
        rows.retain(|row| !pattern.matches(&row.key));
        Ok(before - rows.len())
    }

    fn find_one(&self, locale: &Locale, key: &str) -> Result<Option<String>> {
        let rows = self.lock()?;
        Ok(rows
            .iter()
            .find(|row| &row.locale == locale && row.key == key)
            .map(|row| row.value.clone()))
    }

    fn find_where(
        &self,
        locale: &Locale,
        value: &str,
        pattern: &KeyPattern,
    ) -> Result<Vec<TranslationRow>> {
        let rows = self.lock()?;
        Ok(rows
            .iter()
            .filter(|row| &row.locale == locale && row.value == value && pattern.matches(&row.key))
            .cloned()
            .collect())
    }

    fn insert_all(&self, batch: &[TranslationRow]) -> Result<usize> {
        // A single lock covers the whole batch, so readers see all or nothing.
        let mut rows = self.lock()?;
        for row in batch {
            Self::upsert_locked(&mut rows, &row.locale, &row.key, &row.value);
        }
        Ok(batch.len())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    fn clear(&self) -> Result<usize> {
        let mut rows = self.lock()?;
        let removed = rows.len();
        rows.clear();
        Ok(removed)
    }
}
