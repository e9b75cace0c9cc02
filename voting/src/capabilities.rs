//! What a caller may do in a session right now.

use ballot_types::{Address, WorkflowStatus};
use serde::{Deserialize, Serialize};

use crate::params::{VoteReadPolicy, VotingParams};
use crate::session::{Session, Voter};

/// The caller's role relative to one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Administrator,
    Voter,
    Outsider,
}

impl Role {
    pub fn of(caller: &Address, administrator: &Address, session: Option<&Session>) -> Self {
        if caller == administrator {
            Self::Administrator
        } else if session.is_some_and(|s| s.is_voter(caller)) {
            Self::Voter
        } else {
            Self::Outsider
        }
    }
}

/// Derived view of the actions open to a caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    pub can_create_session: bool,
    pub can_change_status: bool,
    pub can_register_voter: bool,
    pub can_register_proposal: bool,
    pub can_vote: bool,
    pub can_read_votes: bool,
}

/// Compute the capabilities of `role` (holding `voter`, if registered) in `session`.
///
/// The administrator never proposes or votes; a voter may propose while below
/// the per-voter cap and vote exactly once.
pub fn derive_capabilities(
    session: &Session,
    voter: Option<&Voter>,
    role: Role,
    params: &VotingParams,
) -> CapabilitySet {
    let status = session.status;
    let is_admin = role == Role::Administrator;
    let voter = voter.filter(|_| role == Role::Voter);

    CapabilitySet {
        can_create_session: is_admin,
        can_change_status: is_admin && !status.is_terminal(),
        can_register_voter: is_admin && status == WorkflowStatus::RegisteringVoters,
        can_register_proposal: voter.is_some_and(|v| {
            status == WorkflowStatus::ProposalsRegistrationStarted
                && v.proposal_count < params.max_proposals_per_voter
        }),
        can_vote: voter
            .is_some_and(|v| status == WorkflowStatus::VotingSessionStarted && !v.has_voted),
        can_read_votes: role != Role::Outsider
            && match params.vote_read_policy {
                VoteReadPolicy::Always => true,
                VoteReadPolicy::AfterVotingStarted => status.votes_visible(),
            },
    }
}
