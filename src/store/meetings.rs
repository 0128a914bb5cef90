use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::keys;
use super::kv::KeyValueStore;

/// Date format used for `MeetingRecord::date` ("October 17, 2026")
const DATE_FORMAT: &str = "%B %-d, %Y";
const DATE_PARSE_FORMAT: &str = "%B %d, %Y";

/// Section headers stripped from dashboard previews
const PREVIEW_HEADERS: [&str; 3] = [
    "### Key Points",
    "### Decisions Made",
    "### Action Items",
];

/// Opaque identity of a saved meeting
///
/// Generated ids are RFC 3339 UTC timestamps with millisecond precision, so
/// lexical order matches creation order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeetingId(String);

impl MeetingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.0)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }
}

impl fmt::Display for MeetingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MeetingId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A saved meeting as shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingRecord {
    pub id: MeetingId,
    pub title: String,
    /// Human-readable date of the last save ("October 17, 2026")
    pub date: String,
    pub notes: String,
    /// Markdown minutes
    pub summary: String,
}

impl MeetingRecord {
    /// Calendar day of the record, `None` if `date` is not in the expected format
    pub fn day(&self) -> Option<NaiveDate> {
        parse_meeting_date(&self.date)
    }

    /// Short card text: the summary without section headers and bullet markers,
    /// or the raw notes when there is no summary
    pub fn preview(&self, max_chars: usize) -> String {
        let source = if self.summary.is_empty() {
            self.notes.clone()
        } else {
            let mut text = self.summary.clone();
            for header in PREVIEW_HEADERS {
                text = text.replace(header, "");
            }
            text.replace("- ", "").trim().to_string()
        };

        if source.chars().count() <= max_chars {
            return source;
        }

        let mut truncated: String = source.chars().take(max_chars).collect();
        truncated.push_str("...");
        truncated
    }

    fn matches(&self, query_lower: &str) -> bool {
        self.title.to_lowercase().contains(query_lower)
            || self.notes.to_lowercase().contains(query_lower)
            || self.summary.to_lowercase().contains(query_lower)
    }
}

/// How an upsert resolved the session's identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertKind {
    /// Linked record existed and was updated in place
    Updated,
    /// Linked record had been deleted; a new one was created
    Recreated,
    /// Session was not linked; a new record was created
    Created,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub id: MeetingId,
    pub kind: UpsertKind,
}

/// Durable collection of meeting records stored under `keys::MEETINGS`
pub struct MeetingRepository {
    store: Arc<dyn KeyValueStore>,
    /// Last id handed out by this process, keeps ids strictly increasing
    last_issued: Mutex<Option<DateTime<Utc>>>,
    /// Held across every load-modify-save of the list
    write_lock: Mutex<()>,
}

impl MeetingRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            last_issued: Mutex::new(None),
            write_lock: Mutex::new(()),
        }
    }

    /// All records in stored order (most recently upserted first)
    pub async fn load_raw(&self) -> Result<Vec<MeetingRecord>> {
        match self.store.get(keys::MEETINGS).await? {
            Some(json) if !json.trim().is_empty() => {
                serde_json::from_str(&json).context("Stored meeting list is not valid JSON")
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn save_raw(&self, records: &[MeetingRecord]) -> Result<()> {
        let json = serde_json::to_string(records)?;
        self.store
            .set(keys::MEETINGS, &json)
            .await
            .context("Failed to write meeting list")
    }

    /// All records, newest date first
    ///
    /// Records sharing a date keep their stored order; records with an
    /// unreadable date sort last.
    pub async fn list(&self) -> Result<Vec<MeetingRecord>> {
        let mut records = self.load_raw().await?;
        records.sort_by(|a, b| b.day().cmp(&a.day()));
        Ok(records)
    }

    /// Case-insensitive match on title, notes or summary; blank query lists all
    pub async fn search(&self, query: &str) -> Result<Vec<MeetingRecord>> {
        let records = self.list().await?;
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(records);
        }

        Ok(records.into_iter().filter(|m| m.matches(&query)).collect())
    }

    pub async fn find(&self, id: &MeetingId) -> Result<Option<MeetingRecord>> {
        Ok(self.load_raw().await?.into_iter().find(|m| &m.id == id))
    }

    /// Delete a record; returns whether it existed
    pub async fn delete(&self, id: &MeetingId) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load_raw().await?;
        let before = records.len();
        records.retain(|m| &m.id != id);

        if records.len() == before {
            debug!("Delete requested for unknown meeting {}", id);
            return Ok(false);
        }

        self.save_raw(&records).await?;
        info!("Deleted meeting {}", id);
        Ok(true)
    }

    /// Records grouped by calendar day (days ascending, newest first within a day)
    pub async fn by_day(&self) -> Result<BTreeMap<NaiveDate, Vec<MeetingRecord>>> {
        let mut days: BTreeMap<NaiveDate, Vec<MeetingRecord>> = BTreeMap::new();
        for record in self.list().await? {
            if let Some(day) = record.day() {
                days.entry(day).or_default().push(record);
            }
        }
        Ok(days)
    }

    /// Write the session's fields to its linked record, or create a new one
    ///
    /// `linked = None` always creates a record; it never touches an existing one.
    pub async fn upsert(
        &self,
        linked: Option<&MeetingId>,
        title: &str,
        notes: &str,
        summary: &str,
        date: String,
    ) -> Result<UpsertOutcome> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load_raw().await?;

        let existing = linked.and_then(|id| records.iter_mut().find(|m| &m.id == id));
        if let Some(record) = existing {
            record.title = title.to_string();
            record.notes = notes.to_string();
            record.summary = summary.to_string();
            record.date = date;
            let id = record.id.clone();

            self.save_raw(&records).await?;
            debug!("Updated meeting {}", id);
            return Ok(UpsertOutcome {
                id,
                kind: UpsertKind::Updated,
            });
        }

        let id = self.next_id(&records).await;
        records.insert(
            0,
            MeetingRecord {
                id: id.clone(),
                title: title.to_string(),
                date,
                notes: notes.to_string(),
                summary: summary.to_string(),
            },
        );
        self.save_raw(&records).await?;

        let kind = match linked {
            Some(missing) => {
                info!("Linked meeting {} no longer exists, saved as {}", missing, id);
                UpsertKind::Recreated
            }
            None => {
                info!("Created meeting {}", id);
                UpsertKind::Created
            }
        };

        Ok(UpsertOutcome { id, kind })
    }

    async fn next_id(&self, existing: &[MeetingRecord]) -> MeetingId {
        let mut last_issued = self.last_issued.lock().await;

        let newest_existing = existing.iter().filter_map(|m| m.id.timestamp()).max();
        let floor = (*last_issued).max(newest_existing);

        let now = Utc::now();
        let mut candidate = DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now);
        if let Some(floor) = floor {
            if candidate <= floor {
                candidate = floor + chrono::Duration::milliseconds(1);
            }
        }

        *last_issued = Some(candidate);
        MeetingId(candidate.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

/// Format a day the way meeting records store it
pub fn format_meeting_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_meeting_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), DATE_PARSE_FORMAT).ok()
}

/// Today's date in record format, local time zone
pub fn today_label() -> String {
    format_meeting_date(Local::now().date_naive())
}
