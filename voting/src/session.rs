//! Sessions, their voters and their proposals.

use std::collections::BTreeMap;

use ballot_types::{Address, ProposalId, SessionId, WorkflowStatus};
use serde::{Deserialize, Serialize};

use crate::error::VotingError;
use crate::tally::VoteResult;

/// Description of the seeded proposal 0.
pub const ABSTENTION_DESCRIPTION: &str = "Abstention";
/// Description of the seeded proposal 1.
pub const BLANK_DESCRIPTION: &str = "Blank";

/// A candidate option within a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub proposal_id: ProposalId,
    pub description: String,
    /// The administrator for the two seeds, a voter otherwise.
    pub proposer: Address,
    pub vote_count: u64,
}

/// Registration record of one address in one session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    pub address: Address,
    pub has_voted: bool,
    /// Set once, on the first and only vote.
    pub voted_proposal_id: Option<ProposalId>,
    /// Proposals submitted by this voter in this session.
    pub proposal_count: u8,
}

impl Voter {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            has_voted: false,
            voted_proposal_id: None,
            proposal_count: 0,
        }
    }
}

/// One voting campaign.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub name: String,
    pub description: String,
    pub status: WorkflowStatus,
    pub proposals: Vec<Proposal>,
    pub voters: BTreeMap<Address, Voter>,
    /// Present once the session reached `VotesTallied`.
    pub result: Option<VoteResult>,
}

impl Session {
    pub fn new(id: SessionId, name: String, description: String) -> Self {
        Self {
            id,
            name,
            description,
            status: WorkflowStatus::RegisteringVoters,
            proposals: Vec::new(),
            voters: BTreeMap::new(),
            result: None,
        }
    }

    pub fn voter(&self, address: &Address) -> Option<&Voter> {
        self.voters.get(address)
    }

    pub fn is_voter(&self, address: &Address) -> bool {
        self.voters.contains_key(address)
    }

    pub fn proposal(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.get(id.index())
    }

    /// The id the next registered proposal will receive.
    pub fn next_proposal_id(&self) -> ProposalId {
        ProposalId::new(self.proposals.len() as u32)
    }

    /// Fail unless the session is exactly at `expected`.
    pub fn require_status(&self, expected: WorkflowStatus) -> Result<(), VotingError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(VotingError::BadStatus {
                session_id: self.id,
                expected,
                actual: self.status,
            })
        }
    }

    /// Number of voters that cast a vote.
    pub fn votes_cast(&self) -> u64 {
        self.voters.values().filter(|v| v.has_voted).count() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_starts_registering_voters() {
        let s = Session::new(SessionId::FIRST, "n".into(), "d".into());
        assert_eq!(s.status, WorkflowStatus::RegisteringVoters);
        assert!(s.proposals.is_empty());
        assert_eq!(s.next_proposal_id(), ProposalId::ABSTENTION);
        assert!(s.result.is_none());
    }

    #[test]
    fn require_status_reports_expected_and_actual() {
        let s = Session::new(SessionId::new(9), "n".into(), "d".into());
        assert!(s.require_status(WorkflowStatus::RegisteringVoters).is_ok());
        let err = s
            .require_status(WorkflowStatus::VotingSessionStarted)
            .unwrap_err();
        assert_eq!(
            err,
            VotingError::BadStatus {
                session_id: SessionId::new(9),
                expected: WorkflowStatus::VotingSessionStarted,
                actual: WorkflowStatus::RegisteringVoters,
            }
        );
    }
}
