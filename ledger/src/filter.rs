//! Event log queries.

use ballot_types::{BlockNumber, SessionId};
use ballot_voting::EventKind;
use serde::{Deserialize, Serialize};

use crate::EventRecord;

/// Selects records by kind, session and inclusive block range.
/// Every unset field matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    pub kind: Option<EventKind>,
    pub session_id: Option<SessionId>,
    pub from_block: Option<BlockNumber>,
    pub to_block: Option<BlockNumber>,
}

impl EventFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: EventKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn blocks(mut self, from: Option<BlockNumber>, to: Option<BlockNumber>) -> Self {
        self.from_block = from;
        self.to_block = to;
        self
    }

    pub fn first_block(&self) -> BlockNumber {
        self.from_block.unwrap_or(BlockNumber::GENESIS)
    }

    pub fn last_block(&self) -> BlockNumber {
        self.to_block.unwrap_or(BlockNumber::new(u64::MAX))
    }

    pub fn matches(&self, record: &EventRecord) -> bool {
        self.kind.map_or(true, |k| record.event.kind() == k)
            && self
                .session_id
                .map_or(true, |s| record.event.session_id() == s)
            && record.block >= self.first_block()
            && record.block <= self.last_block()
    }
}
