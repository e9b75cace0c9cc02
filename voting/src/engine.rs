//! Core voting engine: validates transactions and folds their events.

use ballot_types::{Address, ProposalId, SessionId, WorkflowStatus};
use tracing::debug;

use crate::book::SessionBook;
use crate::capabilities::{derive_capabilities, CapabilitySet, Role};
use crate::command::Command;
use crate::error::VotingError;
use crate::event::VotingEvent;
use crate::params::{VoteReadPolicy, VotingParams};
use crate::session::{Proposal, Session, Voter, ABSTENTION_DESCRIPTION, BLANK_DESCRIPTION};
use crate::tally::{tally, VoteResult};

/// Owns every session of one ledger and enforces the workflow rules.
///
/// Writes are split in two: [`execute`](Self::execute) checks a command
/// against the current state and returns the events it would commit, without
/// touching anything; [`apply`](Self::apply) folds a committed event. A
/// rejected command therefore never leaves partial state behind.
#[derive(Clone, Debug)]
pub struct VotingSessionEngine {
    administrator: Address,
    params: VotingParams,
    book: SessionBook,
}

impl VotingSessionEngine {
    pub fn new(administrator: Address, params: VotingParams) -> Self {
        Self {
            administrator,
            params,
            book: SessionBook::new(),
        }
    }

    /// Rebuild an engine from a historical event sequence.
    pub fn replay<'a, I>(
        administrator: Address,
        params: VotingParams,
        events: I,
    ) -> Result<Self, VotingError>
    where
        I: IntoIterator<Item = &'a VotingEvent>,
    {
        Ok(Self {
            administrator,
            params,
            book: SessionBook::replay(events)?,
        })
    }

    pub fn administrator(&self) -> &Address {
        &self.administrator
    }

    pub fn params(&self) -> &VotingParams {
        &self.params
    }

    pub fn book(&self) -> &SessionBook {
        &self.book
    }

    // ── Writes ──────────────────────────────────────────────────────────

    /// Validate `command` from `caller` and return the events it commits.
    pub fn execute(
        &self,
        caller: &Address,
        command: &Command,
    ) -> Result<Vec<VotingEvent>, VotingError> {
        match command {
            Command::CreateSession { name, description } => {
                self.create_session_events(caller, name, description)
            }
            Command::RegisterVoter { session_id, voter } => {
                self.register_voter_events(caller, *session_id, voter)
            }
            Command::RegisterProposal {
                session_id,
                description,
            } => self.register_proposal_events(caller, *session_id, description),
            Command::Vote {
                session_id,
                proposal_id,
            } => self.vote_events(caller, *session_id, *proposal_id),
            Command::Advance { session_id }
            | Command::StartProposalsRegistration { session_id }
            | Command::StopProposalsRegistration { session_id }
            | Command::StartVotingSession { session_id }
            | Command::StopVotingSession { session_id }
            | Command::TallyVotes { session_id } => {
                self.advance_events(caller, *session_id, command.required_source_status())
            }
        }
    }

    /// Fold one committed event into the state.
    pub fn apply(&mut self, event: &VotingEvent) -> Result<(), VotingError> {
        if let VotingEvent::WorkflowStatusChange {
            session_id,
            previous_status,
            new_status,
        } = event
        {
            debug!(session = %session_id, from = %previous_status, to = %new_status, "workflow status change");
        }
        self.book.apply(event)
    }

    /// Execute and immediately apply `command`.
    pub fn submit(
        &mut self,
        caller: &Address,
        command: &Command,
    ) -> Result<Vec<VotingEvent>, VotingError> {
        let events = self.execute(caller, command)?;
        for event in &events {
            self.apply(event)?;
        }
        Ok(events)
    }

    pub fn create_session(
        &mut self,
        caller: &Address,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<SessionId, VotingError> {
        let command = Command::CreateSession {
            name: name.into(),
            description: description.into(),
        };
        let events = self.submit(caller, &command)?;
        Ok(events
            .first()
            .map(VotingEvent::session_id)
            .unwrap_or(SessionId::FIRST))
    }

    pub fn register_voter(
        &mut self,
        caller: &Address,
        session_id: SessionId,
        voter: Address,
    ) -> Result<(), VotingError> {
        self.submit(caller, &Command::RegisterVoter { session_id, voter })
            .map(|_| ())
    }

    /// Move the session one stage forward and return the new stage.
    pub fn advance(
        &mut self,
        caller: &Address,
        session_id: SessionId,
    ) -> Result<WorkflowStatus, VotingError> {
        self.submit(caller, &Command::Advance { session_id })?;
        Ok(self.session(session_id)?.status)
    }

    pub fn register_proposal(
        &mut self,
        caller: &Address,
        session_id: SessionId,
        description: impl Into<String>,
    ) -> Result<ProposalId, VotingError> {
        let command = Command::RegisterProposal {
            session_id,
            description: description.into(),
        };
        self.submit(caller, &command)?;
        let session = self.session(session_id)?;
        Ok(ProposalId::new(session.proposals.len() as u32 - 1))
    }

    pub fn vote(
        &mut self,
        caller: &Address,
        session_id: SessionId,
        proposal_id: ProposalId,
    ) -> Result<(), VotingError> {
        self.submit(
            caller,
            &Command::Vote {
                session_id,
                proposal_id,
            },
        )
        .map(|_| ())
    }

    // ── Reads ───────────────────────────────────────────────────────────

    pub fn session(&self, id: SessionId) -> Result<&Session, VotingError> {
        self.book.get(id).ok_or(VotingError::SessionNotFound(id))
    }

    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.book.iter()
    }

    pub fn proposals(&self, session_id: SessionId) -> Result<&[Proposal], VotingError> {
        Ok(&self.session(session_id)?.proposals)
    }

    pub fn proposal(
        &self,
        session_id: SessionId,
        proposal_id: ProposalId,
    ) -> Result<&Proposal, VotingError> {
        self.session(session_id)?
            .proposal(proposal_id)
            .ok_or(VotingError::ProposalNotFound {
                session_id,
                proposal_id,
            })
    }

    /// Read a voter record. Only the administrator and the session's own
    /// voters may read, and under the strict policy only once voting started.
    pub fn get_voter(
        &self,
        caller: &Address,
        session_id: SessionId,
        voter: &Address,
    ) -> Result<&Voter, VotingError> {
        let session = self.readable_session(caller, session_id)?;
        session.voter(voter).ok_or(VotingError::VoterNotFound {
            session_id,
            voter: *voter,
        })
    }

    /// The proposal `voter` voted for, `None` if they have not voted.
    pub fn get_vote(
        &self,
        caller: &Address,
        session_id: SessionId,
        voter: &Address,
    ) -> Result<Option<ProposalId>, VotingError> {
        Ok(self.get_voter(caller, session_id, voter)?.voted_proposal_id)
    }

    pub fn result(&self, session_id: SessionId) -> Result<&VoteResult, VotingError> {
        let session = self.session(session_id)?;
        session.result.as_ref().ok_or(VotingError::BadStatus {
            session_id,
            expected: WorkflowStatus::VotesTallied,
            actual: session.status,
        })
    }

    pub fn role_of(&self, caller: &Address, session_id: SessionId) -> Role {
        Role::of(caller, &self.administrator, self.book.get(session_id))
    }

    pub fn capabilities(
        &self,
        caller: &Address,
        session_id: SessionId,
    ) -> Result<CapabilitySet, VotingError> {
        let session = self.session(session_id)?;
        let role = self.role_of(caller, session_id);
        Ok(derive_capabilities(
            session,
            session.voter(caller),
            role,
            &self.params,
        ))
    }

    // ── Validation ──────────────────────────────────────────────────────

    fn require_administrator(&self, caller: &Address) -> Result<(), VotingError> {
        if *caller == self.administrator {
            Ok(())
        } else {
            Err(VotingError::NotAdministrator(*caller))
        }
    }

    fn require_voter<'a>(
        &self,
        session: &'a Session,
        caller: &Address,
    ) -> Result<&'a Voter, VotingError> {
        session.voter(caller).ok_or(VotingError::NotVoter {
            session_id: session.id,
            caller: *caller,
        })
    }

    fn readable_session(
        &self,
        caller: &Address,
        session_id: SessionId,
    ) -> Result<&Session, VotingError> {
        if self.role_of(caller, session_id) == Role::Outsider {
            return Err(VotingError::NotOwnerOrVoter {
                session_id,
                caller: *caller,
            });
        }
        let session = self.session(session_id)?;
        if self.params.vote_read_policy == VoteReadPolicy::AfterVotingStarted
            && !session.status.votes_visible()
        {
            return Err(VotingError::BadStatus {
                session_id,
                expected: WorkflowStatus::VotingSessionStarted,
                actual: session.status,
            });
        }
        Ok(session)
    }

    fn check_proposal_capacity(&self, session: &Session, adding: usize) -> Result<(), VotingError> {
        let cap = self.params.max_proposals_per_session;
        if session.proposals.len() + adding > cap as usize {
            return Err(VotingError::ProposalIdsExhausted {
                session_id: session.id,
                cap,
            });
        }
        Ok(())
    }

    fn create_session_events(
        &self,
        caller: &Address,
        name: &str,
        description: &str,
    ) -> Result<Vec<VotingEvent>, VotingError> {
        self.require_administrator(caller)?;
        let session_id = self
            .book
            .next_session_id()
            .ok_or(VotingError::SessionIdsExhausted)?;
        Ok(vec![VotingEvent::SessionCreated {
            session_id,
            name: name.to_string(),
            description: description.to_string(),
        }])
    }

    fn register_voter_events(
        &self,
        caller: &Address,
        session_id: SessionId,
        voter: &Address,
    ) -> Result<Vec<VotingEvent>, VotingError> {
        self.require_administrator(caller)?;
        let session = self.session(session_id)?;
        session.require_status(WorkflowStatus::RegisteringVoters)?;
        if session.is_voter(voter) {
            return Err(VotingError::AlreadyRegistered {
                session_id,
                voter: *voter,
            });
        }
        if *voter == self.administrator {
            return Err(VotingError::AdministratorCannotVote(*voter));
        }
        Ok(vec![VotingEvent::VoterRegistered {
            session_id,
            voter_address: *voter,
        }])
    }

    fn advance_events(
        &self,
        caller: &Address,
        session_id: SessionId,
        required: Option<WorkflowStatus>,
    ) -> Result<Vec<VotingEvent>, VotingError> {
        self.require_administrator(caller)?;
        let session = self.session(session_id)?;
        if let Some(expected) = required {
            session.require_status(expected)?;
        }
        let previous_status = session.status;
        let new_status = previous_status
            .next()
            .ok_or(VotingError::AlreadyTallied(session_id))?;

        let mut events = vec![VotingEvent::WorkflowStatusChange {
            session_id,
            previous_status,
            new_status,
        }];
        match new_status {
            WorkflowStatus::ProposalsRegistrationStarted => {
                self.check_proposal_capacity(session, 2)?;
                for (proposal_id, description) in [
                    (ProposalId::ABSTENTION, ABSTENTION_DESCRIPTION),
                    (ProposalId::BLANK, BLANK_DESCRIPTION),
                ] {
                    events.push(VotingEvent::ProposalRegistered {
                        session_id,
                        proposal_id,
                        description: description.to_string(),
                        proposer: self.administrator,
                    });
                }
            }
            WorkflowStatus::VotesTallied => {
                events.push(VotingEvent::VotesTallied {
                    session_id,
                    result: tally(session),
                });
            }
            _ => {}
        }
        Ok(events)
    }

    fn register_proposal_events(
        &self,
        caller: &Address,
        session_id: SessionId,
        description: &str,
    ) -> Result<Vec<VotingEvent>, VotingError> {
        let session = self.session(session_id)?;
        let voter = self.require_voter(session, caller)?;
        session.require_status(WorkflowStatus::ProposalsRegistrationStarted)?;
        if voter.proposal_count >= self.params.max_proposals_per_voter {
            return Err(VotingError::MaxProposalsReached {
                voter: *caller,
                max: self.params.max_proposals_per_voter,
            });
        }
        self.check_proposal_capacity(session, 1)?;
        Ok(vec![VotingEvent::ProposalRegistered {
            session_id,
            proposal_id: session.next_proposal_id(),
            description: description.to_string(),
            proposer: *caller,
        }])
    }

    fn vote_events(
        &self,
        caller: &Address,
        session_id: SessionId,
        proposal_id: ProposalId,
    ) -> Result<Vec<VotingEvent>, VotingError> {
        let session = self.session(session_id)?;
        let voter = self.require_voter(session, caller)?;
        session.require_status(WorkflowStatus::VotingSessionStarted)?;
        if voter.has_voted {
            return Err(VotingError::AlreadyVoted {
                session_id,
                voter: *caller,
            });
        }
        if proposal_id == ProposalId::ABSTENTION {
            return Err(VotingError::AbstentionForbidden(proposal_id));
        }
        if session.proposal(proposal_id).is_none() {
            return Err(VotingError::ProposalNotFound {
                session_id,
                proposal_id,
            });
        }
        Ok(vec![VotingEvent::Voted {
            session_id,
            voter: *caller,
            proposal_id,
        }])
    }
}
