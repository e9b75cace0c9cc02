//! RPC error types and their HTTP rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ballot_ledger::LedgerError;
use ballot_voting::{ErrorKind, VotingError};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Rejected(VotingError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("missing caller: set the x-caller-address header")]
    MissingCaller,

    #[error("server error: {0}")]
    Server(String),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
}

impl RpcError {
    pub fn status(&self) -> StatusCode {
        match self {
            RpcError::Rejected(e) => match e.kind() {
                ErrorKind::Authorization => StatusCode::FORBIDDEN,
                ErrorKind::Reference => StatusCode::NOT_FOUND,
                ErrorKind::State | ErrorKind::Duplicate => StatusCode::CONFLICT,
                ErrorKind::Limit | ErrorKind::Policy => StatusCode::UNPROCESSABLE_ENTITY,
            },
            RpcError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RpcError::MissingCaller => StatusCode::UNAUTHORIZED,
            RpcError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RpcError::Rejected(e) => e.kind().as_str(),
            RpcError::InvalidRequest(_) => "invalid_request",
            RpcError::MissingCaller => "missing_caller",
            RpcError::Server(_) => "server",
        }
    }
}

impl From<VotingError> for RpcError {
    fn from(e: VotingError) -> Self {
        RpcError::Rejected(e)
    }
}

impl From<LedgerError> for RpcError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Rejected(v) => RpcError::Rejected(v),
            other => RpcError::Server(other.to_string()),
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: self.to_string(),
            kind: self.kind(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_types::{Address, ProposalId, SessionId};

    #[test]
    fn kinds_map_to_statuses() {
        let s = SessionId::FIRST;
        let cases = [
            (VotingError::NotAdministrator(Address::ZERO), StatusCode::FORBIDDEN),
            (VotingError::SessionNotFound(s), StatusCode::NOT_FOUND),
            (VotingError::AlreadyTallied(s), StatusCode::CONFLICT),
            (
                VotingError::AlreadyVoted {
                    session_id: s,
                    voter: Address::ZERO,
                },
                StatusCode::CONFLICT,
            ),
            (
                VotingError::MaxProposalsReached {
                    voter: Address::ZERO,
                    max: 3,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                VotingError::AbstentionForbidden(ProposalId::ABSTENTION),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(RpcError::from(err).status(), status);
        }
    }

    #[test]
    fn missing_caller_is_unauthorized() {
        assert_eq!(RpcError::MissingCaller.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(RpcError::MissingCaller.kind(), "missing_caller");
    }
}
