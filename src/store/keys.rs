//! Store keys shared by the session engine and the meeting repository.

pub const SESSION_TITLE: &str = "session_title";
pub const SESSION_NOTES: &str = "session_notes";
pub const SESSION_SUMMARY: &str = "session_summary";
pub const SESSION_MEETING_ID: &str = "session_meetingId";

/// Lifetime count of successful summary generations (decimal string)
pub const SUMMARIES_USED: &str = "summariesUsed_count";

/// Serialized list of meeting records
pub const MEETINGS: &str = "meetings";

/// Session slots erased by a full session reset.
pub const SESSION_SLOTS: [&str; 4] = [
    SESSION_TITLE,
    SESSION_NOTES,
    SESSION_SUMMARY,
    SESSION_MEETING_ID,
];
