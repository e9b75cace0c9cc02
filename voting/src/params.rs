//! Tunable limits and policies of the voting engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard ceiling on proposals per session, seeds included.
pub const PROPOSAL_ID_CAP: u32 = 256;

/// Abstention and Blank are seeded into every session.
pub const SEED_PROPOSALS: u32 = 2;

/// When voter records and individual votes may be read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteReadPolicy {
    /// Readable by the administrator or a registered voter once voting has started.
    #[default]
    AfterVotingStarted,
    /// Readable by the administrator or a registered voter at any stage.
    Always,
}

/// Limits applied to every session of an engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingParams {
    /// Proposals one voter may submit in one session.
    #[serde(default = "default_max_proposals_per_voter")]
    pub max_proposals_per_voter: u8,

    /// Proposals one session may hold, seeds included. Registration past the
    /// cap is rejected instead of wrapping the id counter.
    #[serde(default = "default_max_proposals_per_session")]
    pub max_proposals_per_session: u32,

    #[serde(default)]
    pub vote_read_policy: VoteReadPolicy,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParamsError {
    #[error("max_proposals_per_voter must be at least 1")]
    NoProposalsPerVoter,

    #[error("max_proposals_per_session must be between 2 and 256, got {0}")]
    SessionCapOutOfRange(u32),
}

impl VotingParams {
    /// Check the limits against the seeded proposals and the proposal id cap.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.max_proposals_per_voter == 0 {
            return Err(ParamsError::NoProposalsPerVoter);
        }
        if !(SEED_PROPOSALS..=PROPOSAL_ID_CAP).contains(&self.max_proposals_per_session) {
            return Err(ParamsError::SessionCapOutOfRange(
                self.max_proposals_per_session,
            ));
        }
        Ok(())
    }
}

fn default_max_proposals_per_voter() -> u8 {
    3
}

fn default_max_proposals_per_session() -> u32 {
    PROPOSAL_ID_CAP
}

impl Default for VotingParams {
    fn default() -> Self {
        Self {
            max_proposals_per_voter: default_max_proposals_per_voter(),
            max_proposals_per_session: default_max_proposals_per_session(),
            vote_read_policy: VoteReadPolicy::default(),
        }
    }
}
