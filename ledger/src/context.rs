//! Caller-bound ledger handle.

use ballot_types::{Address, ProposalId, SessionId, WorkflowStatus};
use ballot_voting::{CapabilitySet, Command, Voter, VotingEvent};

use crate::{Ledger, LedgerError, Receipt};

/// The ledger as seen by one caller: every write is attributed to `caller`.
#[derive(Clone, Copy)]
pub struct CallContext<'a> {
    ledger: &'a Ledger,
    caller: Address,
}

impl<'a> CallContext<'a> {
    pub fn new(ledger: &'a Ledger, caller: Address) -> Self {
        Self { ledger, caller }
    }

    pub fn caller(&self) -> &Address {
        &self.caller
    }

    pub fn submit(&self, command: Command) -> Result<Receipt, LedgerError> {
        self.ledger.submit(&self.caller, command)
    }

    pub fn create_session(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<SessionId, LedgerError> {
        let receipt = self.submit(Command::CreateSession {
            name: name.into(),
            description: description.into(),
        })?;
        let found = receipt
            .events()
            .find_map(|e| match e {
                VotingEvent::SessionCreated { session_id, .. } => Some(*session_id),
                _ => None,
            })
            .ok_or_else(|| missing(&receipt, "SessionCreated"));
        found
    }

    pub fn register_voter(&self, session_id: SessionId, voter: Address) -> Result<(), LedgerError> {
        self.submit(Command::RegisterVoter { session_id, voter })
            .map(|_| ())
    }

    /// Move the session one stage forward and return the stage reached.
    pub fn advance(&self, session_id: SessionId) -> Result<WorkflowStatus, LedgerError> {
        self.step(Command::Advance { session_id })
    }

    pub fn start_proposals_registration(
        &self,
        session_id: SessionId,
    ) -> Result<WorkflowStatus, LedgerError> {
        self.step(Command::StartProposalsRegistration { session_id })
    }

    pub fn stop_proposals_registration(
        &self,
        session_id: SessionId,
    ) -> Result<WorkflowStatus, LedgerError> {
        self.step(Command::StopProposalsRegistration { session_id })
    }

    pub fn start_voting_session(
        &self,
        session_id: SessionId,
    ) -> Result<WorkflowStatus, LedgerError> {
        self.step(Command::StartVotingSession { session_id })
    }

    pub fn stop_voting_session(
        &self,
        session_id: SessionId,
    ) -> Result<WorkflowStatus, LedgerError> {
        self.step(Command::StopVotingSession { session_id })
    }

    pub fn tally_votes(&self, session_id: SessionId) -> Result<WorkflowStatus, LedgerError> {
        self.step(Command::TallyVotes { session_id })
    }

    pub fn register_proposal(
        &self,
        session_id: SessionId,
        description: impl Into<String>,
    ) -> Result<ProposalId, LedgerError> {
        let receipt = self.submit(Command::RegisterProposal {
            session_id,
            description: description.into(),
        })?;
        let found = receipt
            .events()
            .find_map(|e| match e {
                VotingEvent::ProposalRegistered { proposal_id, .. } => Some(*proposal_id),
                _ => None,
            })
            .ok_or_else(|| missing(&receipt, "ProposalRegistered"));
        found
    }

    pub fn vote(&self, session_id: SessionId, proposal_id: ProposalId) -> Result<(), LedgerError> {
        self.submit(Command::Vote {
            session_id,
            proposal_id,
        })
        .map(|_| ())
    }

    pub fn get_voter(&self, session_id: SessionId, voter: &Address) -> Result<Voter, LedgerError> {
        self.ledger.get_voter(&self.caller, session_id, voter)
    }

    pub fn get_vote(
        &self,
        session_id: SessionId,
        voter: &Address,
    ) -> Result<Option<ProposalId>, LedgerError> {
        self.ledger.get_vote(&self.caller, session_id, voter)
    }

    pub fn capabilities(&self, session_id: SessionId) -> Result<CapabilitySet, LedgerError> {
        self.ledger.capabilities(&self.caller, session_id)
    }

    fn step(&self, command: Command) -> Result<WorkflowStatus, LedgerError> {
        let receipt = self.submit(command)?;
        let found = receipt
            .events()
            .find_map(|e| match e {
                VotingEvent::WorkflowStatusChange { new_status, .. } => Some(*new_status),
                _ => None,
            })
            .ok_or_else(|| missing(&receipt, "WorkflowStatusChange"));
        found
    }
}

fn missing(receipt: &Receipt, kind: &str) -> LedgerError {
    LedgerError::Corrupted {
        block: receipt.block,
        reason: format!("committed without a {kind} event"),
    }
}
