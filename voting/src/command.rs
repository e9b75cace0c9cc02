//! Write operations, one per ledger transaction.

use ballot_types::{Address, ProposalId, SessionId, WorkflowStatus};
use serde::{Deserialize, Serialize};

/// A state-mutating operation submitted by a caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    CreateSession {
        name: String,
        description: String,
    },
    RegisterVoter {
        session_id: SessionId,
        voter: Address,
    },
    /// Move the session one stage forward, whatever stage it is in.
    Advance {
        session_id: SessionId,
    },
    StartProposalsRegistration {
        session_id: SessionId,
    },
    StopProposalsRegistration {
        session_id: SessionId,
    },
    StartVotingSession {
        session_id: SessionId,
    },
    StopVotingSession {
        session_id: SessionId,
    },
    TallyVotes {
        session_id: SessionId,
    },
    RegisterProposal {
        session_id: SessionId,
        description: String,
    },
    Vote {
        session_id: SessionId,
        proposal_id: ProposalId,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateSession { .. } => "create_session",
            Self::RegisterVoter { .. } => "register_voter",
            Self::Advance { .. } => "advance",
            Self::StartProposalsRegistration { .. } => "start_proposals_registration",
            Self::StopProposalsRegistration { .. } => "stop_proposals_registration",
            Self::StartVotingSession { .. } => "start_voting_session",
            Self::StopVotingSession { .. } => "stop_voting_session",
            Self::TallyVotes { .. } => "tally_votes",
            Self::RegisterProposal { .. } => "register_proposal",
            Self::Vote { .. } => "vote",
        }
    }

    /// The session this command targets; `None` for session creation.
    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            Self::CreateSession { .. } => None,
            Self::RegisterVoter { session_id, .. }
            | Self::Advance { session_id }
            | Self::StartProposalsRegistration { session_id }
            | Self::StopProposalsRegistration { session_id }
            | Self::StartVotingSession { session_id }
            | Self::StopVotingSession { session_id }
            | Self::TallyVotes { session_id }
            | Self::RegisterProposal { session_id, .. }
            | Self::Vote { session_id, .. } => Some(*session_id),
        }
    }

    /// For the named workflow steps, the stage the session must be leaving.
    pub fn required_source_status(&self) -> Option<WorkflowStatus> {
        match self {
            Self::StartProposalsRegistration { .. } => Some(WorkflowStatus::RegisteringVoters),
            Self::StopProposalsRegistration { .. } => {
                Some(WorkflowStatus::ProposalsRegistrationStarted)
            }
            Self::StartVotingSession { .. } => Some(WorkflowStatus::ProposalsRegistrationEnded),
            Self::StopVotingSession { .. } => Some(WorkflowStatus::VotingSessionStarted),
            Self::TallyVotes { .. } => Some(WorkflowStatus::VotingSessionEnded),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_steps_chain_through_the_workflow() {
        let s = SessionId::FIRST;
        let steps = [
            Command::StartProposalsRegistration { session_id: s },
            Command::StopProposalsRegistration { session_id: s },
            Command::StartVotingSession { session_id: s },
            Command::StopVotingSession { session_id: s },
            Command::TallyVotes { session_id: s },
        ];
        let mut status = WorkflowStatus::RegisteringVoters;
        for step in &steps {
            assert_eq!(step.required_source_status(), Some(status));
            status = status.next().unwrap();
        }
        assert!(status.is_terminal());
        assert_eq!(Command::Advance { session_id: s }.required_source_status(), None);
    }
}
