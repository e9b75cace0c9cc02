use ballot_types::{Address, ProposalId, SessionId, WorkflowStatus};
use thiserror::Error;

/// Broad category of a rejected operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller lacks the required role.
    Authorization,
    /// Operation attempted in the wrong workflow status.
    State,
    /// Re-registration or double vote.
    Duplicate,
    /// A per-voter or per-session cap was reached.
    Limit,
    /// The referenced session, proposal or voter does not exist.
    Reference,
    /// An explicit business rule forbids the operation.
    Policy,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authorization => "authorization",
            Self::State => "state",
            Self::Duplicate => "duplicate",
            Self::Limit => "limit",
            Self::Reference => "reference",
            Self::Policy => "policy",
        }
    }
}

/// Why a voting operation was rejected. A rejected operation never leaves
/// partial state behind.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum VotingError {
    #[error("caller {0} is not the administrator")]
    NotAdministrator(Address),

    #[error("caller {caller} is not a voter of session {session_id}")]
    NotVoter {
        session_id: SessionId,
        caller: Address,
    },

    #[error("caller {caller} is not owner or voter of session {session_id}")]
    NotOwnerOrVoter {
        session_id: SessionId,
        caller: Address,
    },

    #[error("bad status for session {session_id}: expected {expected}, found {actual}")]
    BadStatus {
        session_id: SessionId,
        expected: WorkflowStatus,
        actual: WorkflowStatus,
    },

    #[error("session {0} is already tallied and can not advance")]
    AlreadyTallied(SessionId),

    #[error("voter {voter} already registered in session {session_id}")]
    AlreadyRegistered {
        session_id: SessionId,
        voter: Address,
    },

    #[error("voter {voter} already voted in session {session_id}")]
    AlreadyVoted {
        session_id: SessionId,
        voter: Address,
    },

    #[error("max proposals reached: voter {voter} already submitted {max}")]
    MaxProposalsReached { voter: Address, max: u8 },

    #[error("proposal ids exhausted for session {session_id}: at most {cap} proposals")]
    ProposalIdsExhausted { session_id: SessionId, cap: u32 },

    #[error("session ids exhausted")]
    SessionIdsExhausted,

    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    #[error("proposal {proposal_id} not found in session {session_id}")]
    ProposalNotFound {
        session_id: SessionId,
        proposal_id: ProposalId,
    },

    #[error("voter {voter} not found in session {session_id}")]
    VoterNotFound {
        session_id: SessionId,
        voter: Address,
    },

    #[error("abstention forbidden: proposal {0} can not be voted for directly")]
    AbstentionForbidden(ProposalId),

    #[error("administrator {0} can not be a voter")]
    AdministratorCannotVote(Address),
}

impl VotingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAdministrator(_) | Self::NotVoter { .. } | Self::NotOwnerOrVoter { .. } => {
                ErrorKind::Authorization
            }
            Self::BadStatus { .. } | Self::AlreadyTallied(_) => ErrorKind::State,
            Self::AlreadyRegistered { .. } | Self::AlreadyVoted { .. } => ErrorKind::Duplicate,
            Self::MaxProposalsReached { .. }
            | Self::ProposalIdsExhausted { .. }
            | Self::SessionIdsExhausted => ErrorKind::Limit,
            Self::SessionNotFound(_)
            | Self::ProposalNotFound { .. }
            | Self::VoterNotFound { .. } => ErrorKind::Reference,
            Self::AbstentionForbidden(_) | Self::AdministratorCannotVote(_) => ErrorKind::Policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_status_message_names_both_stages() {
        let err = VotingError::BadStatus {
            session_id: SessionId::new(3),
            expected: WorkflowStatus::RegisteringVoters,
            actual: WorkflowStatus::VotingSessionStarted,
        };
        let msg = err.to_string();
        assert!(msg.contains("bad status"));
        assert!(msg.contains("RegisteringVoters(1)"));
        assert!(msg.contains("VotingSessionStarted(4)"));
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[test]
    fn kinds_cover_the_taxonomy() {
        let a = Address::from_low_u64(1);
        let s = SessionId::FIRST;
        assert_eq!(VotingError::NotAdministrator(a).kind(), ErrorKind::Authorization);
        assert_eq!(
            VotingError::AlreadyVoted { session_id: s, voter: a }.kind(),
            ErrorKind::Duplicate
        );
        assert_eq!(
            VotingError::MaxProposalsReached { voter: a, max: 3 }.kind(),
            ErrorKind::Limit
        );
        assert_eq!(VotingError::SessionNotFound(s).kind(), ErrorKind::Reference);
        assert_eq!(
            VotingError::AbstentionForbidden(ProposalId::ABSTENTION).kind(),
            ErrorKind::Policy
        );
        assert_eq!(VotingError::AdministratorCannotVote(a).kind(), ErrorKind::Policy);
    }
}
