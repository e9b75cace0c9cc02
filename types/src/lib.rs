//! Fundamental types for the ballot voting-session ledger.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! account addresses, session/proposal identifiers, block numbers, and the
//! workflow status of a voting session.

pub mod address;
pub mod error;
pub mod ids;
pub mod status;

pub use address::Address;
pub use error::BallotError;
pub use ids::{BlockNumber, ProposalId, SessionId};
pub use status::WorkflowStatus;
