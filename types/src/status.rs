//! Workflow status of a voting session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BallotError;

/// The stages of a voting session, in strict linear order.
///
/// A session is created directly into [`WorkflowStatus::RegisteringVoters`]
/// and moves exactly one step forward per transition; there is no way back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WorkflowStatus {
    None,
    RegisteringVoters,
    ProposalsRegistrationStarted,
    ProposalsRegistrationEnded,
    VotingSessionStarted,
    VotingSessionEnded,
    VotesTallied,
}

impl WorkflowStatus {
    /// Every stage, indexed by its position in the workflow.
    pub const ALL: [Self; 7] = [
        Self::None,
        Self::RegisteringVoters,
        Self::ProposalsRegistrationStarted,
        Self::ProposalsRegistrationEnded,
        Self::VotingSessionStarted,
        Self::VotingSessionEnded,
        Self::VotesTallied,
    ];

    /// Position of this stage in [`WorkflowStatus::ALL`].
    pub fn index(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::RegisteringVoters => 1,
            Self::ProposalsRegistrationStarted => 2,
            Self::ProposalsRegistrationEnded => 3,
            Self::VotingSessionStarted => 4,
            Self::VotingSessionEnded => 5,
            Self::VotesTallied => 6,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// The stage following this one, or `None` for the terminal stage.
    pub fn next(&self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    /// Whether the session is permanently read-only.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::VotesTallied)
    }

    /// Whether voter records and votes may be read under the strict read policy.
    pub fn votes_visible(&self) -> bool {
        *self >= Self::VotingSessionStarted
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::RegisteringVoters => "RegisteringVoters",
            Self::ProposalsRegistrationStarted => "ProposalsRegistrationStarted",
            Self::ProposalsRegistrationEnded => "ProposalsRegistrationEnded",
            Self::VotingSessionStarted => "VotingSessionStarted",
            Self::VotingSessionEnded => "VotingSessionEnded",
            Self::VotesTallied => "VotesTallied",
        }
    }
}

impl Default for WorkflowStatus {
    fn default() -> Self {
        Self::None
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.index())
    }
}

impl FromStr for WorkflowStatus {
    type Err = BallotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|status| status.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| BallotError::InvalidStatus(s.to_string()))
    }
}
