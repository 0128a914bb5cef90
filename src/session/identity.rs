use serde::Serialize;

use crate::store::MeetingId;

/// Which saved meeting, if any, the live session represents
///
/// `Unbound` sessions always create a new record on their next save, so an
/// existing meeting can only be overwritten by a session bound to it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "id", rename_all = "snake_case")]
pub enum MeetingLink {
    #[default]
    Unbound,
    Bound(MeetingId),
}

impl MeetingLink {
    pub fn id(&self) -> Option<&MeetingId> {
        match self {
            MeetingLink::Unbound => None,
            MeetingLink::Bound(id) => Some(id),
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, MeetingLink::Bound(_))
    }

    /// Drop the binding; returns the id that was severed
    pub fn sever(&mut self) -> Option<MeetingId> {
        match std::mem::take(self) {
            MeetingLink::Unbound => None,
            MeetingLink::Bound(id) => Some(id),
        }
    }

    pub fn bind(&mut self, id: MeetingId) {
        *self = MeetingLink::Bound(id);
    }
}

impl From<Option<MeetingId>> for MeetingLink {
    fn from(id: Option<MeetingId>) -> Self {
        id.map_or(MeetingLink::Unbound, MeetingLink::Bound)
    }
}
