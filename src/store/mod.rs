//! Local persistence
//!
//! Two layers live here:
//! - `KeyValueStore`: string-keyed storage holding the in-progress session
//!   fields and the serialized meeting collection
//! - `MeetingRepository`: the dashboard's view of saved meetings (upsert,
//!   list, search, delete, calendar grouping)

pub mod keys;
mod kv;
mod meetings;

pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use meetings::{
    format_meeting_date, parse_meeting_date, today_label, MeetingId, MeetingRecord,
    MeetingRepository, UpsertKind, UpsertOutcome,
};
