//! Domain events committed by voting transactions.

use std::fmt;
use std::str::FromStr;

use ballot_types::{Address, ProposalId, SessionId, WorkflowStatus};
use serde::{Deserialize, Serialize};

use crate::tally::VoteResult;

/// A state change committed to the ledger. Folding the full sequence of
/// events from an empty [`crate::SessionBook`] reproduces the live state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VotingEvent {
    SessionCreated {
        session_id: SessionId,
        name: String,
        description: String,
    },
    VoterRegistered {
        session_id: SessionId,
        voter_address: Address,
    },
    WorkflowStatusChange {
        session_id: SessionId,
        previous_status: WorkflowStatus,
        new_status: WorkflowStatus,
    },
    ProposalRegistered {
        session_id: SessionId,
        proposal_id: ProposalId,
        description: String,
        proposer: Address,
    },
    Voted {
        session_id: SessionId,
        voter: Address,
        proposal_id: ProposalId,
    },
    VotesTallied {
        session_id: SessionId,
        result: VoteResult,
    },
}

impl VotingEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::SessionCreated { .. } => EventKind::SessionCreated,
            Self::VoterRegistered { .. } => EventKind::VoterRegistered,
            Self::WorkflowStatusChange { .. } => EventKind::WorkflowStatusChange,
            Self::ProposalRegistered { .. } => EventKind::ProposalRegistered,
            Self::Voted { .. } => EventKind::Voted,
            Self::VotesTallied { .. } => EventKind::VotesTallied,
        }
    }

    pub fn session_id(&self) -> SessionId {
        match self {
            Self::SessionCreated { session_id, .. }
            | Self::VoterRegistered { session_id, .. }
            | Self::WorkflowStatusChange { session_id, .. }
            | Self::ProposalRegistered { session_id, .. }
            | Self::Voted { session_id, .. }
            | Self::VotesTallied { session_id, .. } => *session_id,
        }
    }
}

/// The kinds of [`VotingEvent`], used to filter event queries and subscriptions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    SessionCreated,
    VoterRegistered,
    WorkflowStatusChange,
    ProposalRegistered,
    Voted,
    VotesTallied,
}

impl EventKind {
    pub const ALL: [Self; 6] = [
        Self::SessionCreated,
        Self::VoterRegistered,
        Self::WorkflowStatusChange,
        Self::ProposalRegistered,
        Self::Voted,
        Self::VotesTallied,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionCreated => "SessionCreated",
            Self::VoterRegistered => "VoterRegistered",
            Self::WorkflowStatusChange => "WorkflowStatusChange",
            Self::ProposalRegistered => "ProposalRegistered",
            Self::Voted => "Voted",
            Self::VotesTallied => "VotesTallied",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    /// Accepts `VotesTallied` as well as `votes_tallied`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s.chars().filter(|c| *c != '_').collect();
        Self::ALL
            .iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(&wanted))
            .copied()
            .ok_or_else(|| format!("unknown event kind: {s}"))
    }
}
