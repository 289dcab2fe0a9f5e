use chrono::{DateTime, Utc};

use crate::entry::{DEFAULT_TITLE, HistoryEntry};
use crate::store::KeyValueStore;
use crate::{HistoryError, HistoryResult};

/// Storage key of the serialized entry list.
pub const HISTORY_KEY: &str = "rich_text_editor_history";

pub struct History<S> {
    store: S,
}

impl<S: KeyValueStore> History<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Saved entries, most recent first.
    pub fn list(&self) -> HistoryResult<Vec<HistoryEntry>> {
        match self.store.get(HISTORY_KEY)? {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }

    pub fn get(&self, id: &str) -> HistoryResult<HistoryEntry> {
        self.list()?
            .into_iter()
            .find(|entry| entry.id == id)
            .ok_or_else(|| HistoryError::NotFound(id.to_string()))
    }

    pub fn save(&mut self, title: &str, content: &str) -> HistoryResult<HistoryEntry> {
        self.save_at(title, content, Utc::now())
    }

    /// Like [`History::save`] with an explicit clock reading. The id is the
    /// millisecond timestamp, moved forward until it is unused.
    pub fn save_at(
        &mut self,
        title: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> HistoryResult<HistoryEntry> {
        if content.trim().is_empty() {
            return Err(HistoryError::EmptyContent);
        }

        let mut entries = self.list()?;
        let mut millis = now.timestamp_millis();
        while entries.iter().any(|entry| entry.id == millis.to_string()) {
            millis += 1;
        }

        let title = title.trim();
        let entry = HistoryEntry {
            id: millis.to_string(),
            title: if title.is_empty() {
                DEFAULT_TITLE.to_string()
            } else {
                title.to_string()
            },
            content: content.to_string(),
            date: DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now),
        };

        entries.insert(0, entry.clone());
        self.write(&entries)?;
        log::debug!("saved history entry {} ({})", entry.id, entry.title);
        Ok(entry)
    }

    /// Removes the entry with `id`. Returns whether one was removed.
    pub fn delete(&mut self, id: &str) -> HistoryResult<bool> {
        let mut entries = self.list()?;
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        self.write(&entries)?;
        Ok(true)
    }

    fn write(&mut self, entries: &[HistoryEntry]) -> HistoryResult<()> {
        let raw = serde_json::to_string(entries)?;
        self.store.set(HISTORY_KEY, &raw)
    }
}
