//! Caller identity extraction.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use ballot_types::Address;

use crate::RpcError;

/// Header naming the address a request acts as.
pub const CALLER_HEADER: &str = "x-caller-address";

/// The address a request is attributed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Caller(pub Address);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = RpcError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(CALLER_HEADER)
            .ok_or(RpcError::MissingCaller)?;
        let text = value
            .to_str()
            .map_err(|_| RpcError::InvalidRequest(format!("{CALLER_HEADER} is not ASCII")))?;
        let address = text
            .trim()
            .parse::<Address>()
            .map_err(|e| RpcError::InvalidRequest(e.to_string()))?;
        Ok(Caller(address))
    }
}
