//! Result computation, performed once when a session reaches `VotesTallied`.

use std::cmp::Ordering;

use ballot_types::ProposalId;
use serde::{Deserialize, Serialize};

use crate::session::{Proposal, Session};

/// Outcome of a tallied session.
///
/// Two different "abstention" figures exist and are kept apart:
/// `non_voter_count` counts registered voters who never voted, while
/// `abstention_proposal_votes` counts votes recorded on proposal 0.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteResult {
    pub voters_count: u64,
    /// Voters who cast a vote, blank votes included.
    pub total_votes: u64,
    /// Votes cast for proposal 1.
    pub blank_votes: u64,
    /// `voters_count - total_votes`.
    pub non_voter_count: u64,
    pub abstention_proposal_votes: u64,
    /// Every non-abstention proposal holding the maximum vote count, in id order.
    pub winning_proposals: Vec<Proposal>,
}

impl VoteResult {
    pub fn winning_ids(&self) -> Vec<ProposalId> {
        self.winning_proposals.iter().map(|p| p.proposal_id).collect()
    }
}

/// Compute the result of `session` from its current voters and proposals.
///
/// Ties are not broken: all proposals matching the maximum are winners.
pub fn tally(session: &Session) -> VoteResult {
    let voters_count = session.voters.len() as u64;
    let total_votes = session.votes_cast();
    let count_of = |id: ProposalId| session.proposal(id).map_or(0, |p| p.vote_count);

    let mut max_votes = 0u64;
    let mut winning_proposals: Vec<Proposal> = Vec::new();
    for proposal in session
        .proposals
        .iter()
        .filter(|p| p.proposal_id != ProposalId::ABSTENTION)
    {
        match proposal.vote_count.cmp(&max_votes) {
            Ordering::Greater => {
                max_votes = proposal.vote_count;
                winning_proposals.clear();
                winning_proposals.push(proposal.clone());
            }
            Ordering::Equal => winning_proposals.push(proposal.clone()),
            Ordering::Less => {}
        }
    }

    VoteResult {
        voters_count,
        total_votes,
        blank_votes: count_of(ProposalId::BLANK),
        non_voter_count: voters_count.saturating_sub(total_votes),
        abstention_proposal_votes: count_of(ProposalId::ABSTENTION),
        winning_proposals,
    }
}
