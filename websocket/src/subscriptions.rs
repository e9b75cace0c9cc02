//! Subscription management for WebSocket clients.

use std::collections::HashSet;

use ballot_ledger::EventRecord;
use ballot_types::{BlockNumber, SessionId};
use ballot_voting::EventKind;
use serde::{Deserialize, Serialize};

/// A message sent by a client.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe {
        /// Event kinds, e.g. `"Voted"` or `"votes_tallied"`; all kinds when absent.
        #[serde(default)]
        kinds: Option<Vec<String>>,
        #[serde(default)]
        session_id: Option<SessionId>,
        /// Replay stored records from this block before going live.
        #[serde(default)]
        from_block: Option<BlockNumber>,
    },
    Unsubscribe,
    Ping,
}

/// A message sent to a client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Ack { action: String },
    Event { record: EventRecord },
    Error { message: String },
    Pong,
}

/// Filter of one client subscription.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Subscription {
    pub kinds: Option<HashSet<EventKind>>,
    pub session_id: Option<SessionId>,
}

impl Subscription {
    /// Build a subscription from the raw `kinds` list of a subscribe message.
    pub fn new(kinds: Option<Vec<String>>, session_id: Option<SessionId>) -> Result<Self, String> {
        let kinds = kinds
            .map(|names| {
                names
                    .iter()
                    .map(|n| n.parse::<EventKind>())
                    .collect::<Result<HashSet<_>, _>>()
            })
            .transpose()?;
        Ok(Self { kinds, session_id })
    }

    pub fn matches(&self, record: &EventRecord) -> bool {
        self.kinds
            .as_ref()
            .map_or(true, |k| k.contains(&record.event.kind()))
            && self
                .session_id
                .map_or(true, |s| record.event.session_id() == s)
    }
}
