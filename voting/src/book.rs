//! The session book: all sessions, rebuilt by folding voting events.

use std::collections::BTreeMap;

use ballot_types::SessionId;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::VotingError;
use crate::event::VotingEvent;
use crate::session::{Proposal, Session, Voter};

/// Every session known to an engine, keyed by id.
///
/// [`SessionBook::apply`] is the only way state changes. The engine applies
/// the events of each committed transaction; [`SessionBook::replay`] applies
/// a historical log. Both therefore end in identical books.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionBook {
    sessions: BTreeMap<SessionId, Session>,
}

impl SessionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `events` from an empty book.
    pub fn replay<'a, I>(events: I) -> Result<Self, VotingError>
    where
        I: IntoIterator<Item = &'a VotingEvent>,
    {
        let mut book = Self::new();
        for event in events {
            book.apply(event)?;
        }
        Ok(book)
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Id the next created session will receive, or `None` when exhausted.
    pub fn next_session_id(&self) -> Option<SessionId> {
        match self.sessions.keys().next_back() {
            Some(last) => last.checked_next(),
            None => Some(SessionId::FIRST),
        }
    }

    /// Apply one committed event.
    ///
    /// Fails only if the event references a session, voter or proposal that
    /// the book has never seen, which means the log is not one this engine wrote.
    pub fn apply(&mut self, event: &VotingEvent) -> Result<(), VotingError> {
        trace!(kind = %event.kind(), session = %event.session_id(), "applying event");
        match event {
            VotingEvent::SessionCreated {
                session_id,
                name,
                description,
            } => {
                self.sessions.insert(
                    *session_id,
                    Session::new(*session_id, name.clone(), description.clone()),
                );
            }
            VotingEvent::VoterRegistered {
                session_id,
                voter_address,
            } => {
                self.session_mut(*session_id)?
                    .voters
                    .insert(*voter_address, Voter::new(*voter_address));
            }
            VotingEvent::WorkflowStatusChange {
                session_id,
                new_status,
                ..
            } => {
                self.session_mut(*session_id)?.status = *new_status;
            }
            VotingEvent::ProposalRegistered {
                session_id,
                proposal_id,
                description,
                proposer,
            } => {
                let session = self.session_mut(*session_id)?;
                session.proposals.push(Proposal {
                    proposal_id: *proposal_id,
                    description: description.clone(),
                    proposer: *proposer,
                    vote_count: 0,
                });
                if let Some(voter) = session.voters.get_mut(proposer) {
                    voter.proposal_count = voter.proposal_count.saturating_add(1);
                }
            }
            VotingEvent::Voted {
                session_id,
                voter,
                proposal_id,
            } => {
                let session = self.session_mut(*session_id)?;
                let record = session
                    .voters
                    .get_mut(voter)
                    .ok_or(VotingError::VoterNotFound {
                        session_id: *session_id,
                        voter: *voter,
                    })?;
                let proposal = session
                    .proposals
                    .get_mut(proposal_id.index())
                    .ok_or(VotingError::ProposalNotFound {
                        session_id: *session_id,
                        proposal_id: *proposal_id,
                    })?;
                proposal.vote_count += 1;
                record.has_voted = true;
                record.voted_proposal_id = Some(*proposal_id);
            }
            VotingEvent::VotesTallied { session_id, result } => {
                self.session_mut(*session_id)?.result = Some(result.clone());
            }
        }
        Ok(())
    }

    fn session_mut(&mut self, id: SessionId) -> Result<&mut Session, VotingError> {
        self.sessions
            .get_mut(&id)
            .ok_or(VotingError::SessionNotFound(id))
    }
}
