//! Voting sessions for the ballot ledger.
//!
//! Each session walks a strict linear workflow:
//! RegisteringVoters → ProposalsRegistrationStarted → ProposalsRegistrationEnded
//! → VotingSessionStarted → VotingSessionEnded → VotesTallied.
//!
//! Key principles:
//! - One administrator creates sessions, registers voters and advances the workflow.
//! - Registered voters submit proposals (bounded per voter) and vote once.
//! - Every transaction is validated first and then committed as domain events;
//!   state is the fold of those events, so replaying the log rebuilds it exactly.

pub mod book;
pub mod capabilities;
pub mod command;
pub mod engine;
pub mod error;
pub mod event;
pub mod params;
pub mod session;
pub mod tally;

pub use book::SessionBook;
pub use capabilities::{derive_capabilities, CapabilitySet, Role};
pub use command::Command;
pub use engine::VotingSessionEngine;
pub use error::{ErrorKind, VotingError};
pub use event::{EventKind, VotingEvent};
pub use params::{ParamsError, VoteReadPolicy, VotingParams, PROPOSAL_ID_CAP};
pub use session::{Proposal, Session, Voter, ABSTENTION_DESCRIPTION, BLANK_DESCRIPTION};
pub use tally::VoteResult;
