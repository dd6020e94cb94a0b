use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tracing::info;

use crate::store::{KeyValueStore, TRANSLATION_HISTORY};

const MAX_RETENTION_DAYS: u64 = 100 * 365;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub original_text: String,
    pub translated_text: String,
    pub source_language: String,
    pub target_language: String,
    /// RFC 3339, UTC.
    pub timestamp: String,
}

impl HistoryEntry {
    pub fn new(
        original_text: impl Into<String>,
        translated_text: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        at: OffsetDateTime,
    ) -> Self {
        Self {
            original_text: original_text.into(),
            translated_text: translated_text.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            timestamp: format_timestamp(at),
        }
    }

    pub fn recorded_at(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(&self.timestamp, &Rfc3339).ok()
    }
}

/// Bounded, newest-first log of past translations under `translationHistory`.
///
/// Writes are read-modify-write on the store; two processes appending at the same moment
/// can lose one entry.
#[derive(Clone)]
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    limit: usize,
    retention: Duration,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>, limit: usize, retention_days: u64) -> Self {
        Self {
            store,
            limit,
            retention: Duration::days(retention_days.min(MAX_RETENTION_DAYS) as i64),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn list(&self) -> Result<Vec<HistoryEntry>> {
        let Some(value) = self.store.get(TRANSLATION_HISTORY)? else {
            return Ok(Vec::new());
        };
        serde_json::from_value(value).with_context(|| "failed to parse translation history")
    }

    pub fn append(&self, entry: HistoryEntry) -> Result<()> {
        let mut entries = self.list()?;
        entries.insert(0, entry);
        if self.limit > 0 && entries.len() > self.limit {
            entries.truncate(self.limit);
        }
        self.prune(&mut entries, OffsetDateTime::now_utc());
        self.save(&entries)
    }

    /// Drops entries older than the retention window. Returns how many were removed.
    pub fn purge_expired(&self, now: OffsetDateTime) -> Result<usize> {
        let mut entries = self.list()?;
        let removed = self.prune(&mut entries, now);
        if removed > 0 {
            self.save(&entries)?;
        }
        Ok(removed)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(TRANSLATION_HISTORY)
    }

    fn prune(&self, entries: &mut Vec<HistoryEntry>, now: OffsetDateTime) -> usize {
        let Some(cutoff) = now.checked_sub(self.retention) else {
            return 0;
        };
        let before = entries.len();
        // Entries with unreadable timestamps are kept.
        entries.retain(|entry| entry.recorded_at().is_none_or(|at| at >= cutoff));
        let removed = before - entries.len();
        if removed > 0 {
            info!("purged {} expired history entries", removed);
        }
        removed
    }

    fn save(&self, entries: &[HistoryEntry]) -> Result<()> {
        let value = serde_json::to_value(entries)?;
        self.store.set(TRANSLATION_HISTORY, value)
    }
}

pub fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(&Rfc3339)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn history(limit: usize) -> HistoryStore {
        HistoryStore::new(Arc::new(MemoryStore::new()), limit, 30)
    }

    fn entry(n: usize, at: OffsetDateTime) -> HistoryEntry {
        HistoryEntry::new(format!("text {}", n), format!("نص {}", n), "en", "ar", at)
    }

    #[test]
    fn keeps_the_newest_fifty() {
        let history = history(50);
        let now = OffsetDateTime::now_utc();
        for n in 0..51 {
            history.append(entry(n, now)).unwrap();
        }
        let entries = history.list().unwrap();
        assert_eq!(entries.len(), 50);
        assert_eq!(entries[0].original_text, "text 50");
        assert_eq!(entries[49].original_text, "text 1");
    }

    #[test]
    fn purges_entries_past_retention() {
        let history = history(50);
        let now = OffsetDateTime::now_utc();
        history.append(entry(1, now)).unwrap();
        let mut stale = entry(2, now);
        stale.timestamp = format_timestamp(now - Duration::days(31));
        let mut broken = entry(3, now);
        broken.timestamp = "yesterday".to_string();
        let mut entries = history.list().unwrap();
        entries.push(stale);
        entries.push(broken);
        history.save(&entries).unwrap();

        assert_eq!(history.purge_expired(now).unwrap(), 1);
        let texts: Vec<_> = history
            .list()
            .unwrap()
            .into_iter()
            .map(|entry| entry.original_text)
            .collect();
        assert_eq!(texts, vec!["text 1", "text 3"]);
    }

    #[test]
    fn serializes_camel_case_and_clears() {
        let history = history(50);
        let at = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let value = serde_json::to_value(entry(7, at)).unwrap();
        assert_eq!(value["originalText"], "text 7");
        assert_eq!(value["targetLanguage"], "ar");
        assert_eq!(value["timestamp"], "2023-11-14T22:13:20Z");

        history.append(entry(1, OffsetDateTime::now_utc())).unwrap();
        history.clear().unwrap();
        assert!(history.list().unwrap().is_empty());
    }
}
