//! HTTP/JSON API for the ballot ledger.
//!
//! Provides endpoints for:
//! - Session creation, voter registration and workflow transitions
//! - Proposal registration and voting
//! - Session, proposal, voter, vote, result and capability queries
//! - Historical event queries with cursor pagination
//! - Node info and Prometheus metrics
//!
//! The caller of every request is named by the `x-caller-address` header.

pub mod caller;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod pagination;
pub mod server;

pub use caller::{Caller, CALLER_HEADER};
pub use error::RpcError;
pub use metrics::RpcMetrics;
pub use server::{router, RpcServer, RpcState};
