//! RPC request handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use ballot_ledger::{EventFilter, EventRecord, LedgerSummary, Receipt};
use ballot_types::{Address, BlockNumber, ProposalId, SessionId, WorkflowStatus};
use ballot_voting::{
    CapabilitySet, Command, EventKind, Proposal, Session, VoteResult, Voter, VotingEvent,
    VotingParams,
};
use serde::{Deserialize, Serialize};

use crate::caller::Caller;
use crate::pagination::{Page, PaginationParams};
use crate::server::RpcState;
use crate::RpcError;

type ApiState = State<Arc<RpcState>>;

// ── Requests ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
pub struct RegisterVoterRequest {
    pub voter: String,
}

#[derive(Deserialize)]
pub struct AdvanceQuery {
    /// A named step such as `start_voting_session`; a plain advance without one.
    pub step: Option<String>,
}

#[derive(Deserialize)]
pub struct RegisterProposalRequest {
    pub description: String,
}

#[derive(Deserialize)]
pub struct VoteRequest {
    pub proposal_id: u32,
}

#[derive(Deserialize)]
pub struct EventsQuery {
    pub kind: Option<String>,
    pub session_id: Option<u64>,
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
    pub cursor: Option<String>,
    pub count: Option<u32>,
}

// ── Responses ───────────────────────────────────────────────────────────

/// Outcome of a committed write.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub block: BlockNumber,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposal_id: Option<ProposalId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkflowStatus>,
    pub events: Vec<EventRecord>,
}

impl From<Receipt> for SubmitResponse {
    fn from(receipt: Receipt) -> Self {
        let mut response = SubmitResponse {
            block: receipt.block,
            session_id: None,
            proposal_id: None,
            status: None,
            events: Vec::new(),
        };
        for event in receipt.events() {
            match event {
                VotingEvent::SessionCreated { session_id, .. } => {
                    response.session_id = Some(*session_id)
                }
                VotingEvent::WorkflowStatusChange { new_status, .. } => {
                    response.status = Some(*new_status)
                }
                // Seeds share the block with the status change; report voter proposals only.
                VotingEvent::ProposalRegistered { proposal_id, .. } if !proposal_id.is_seed() => {
                    response.proposal_id = Some(*proposal_id)
                }
                _ => {}
            }
        }
        response.events = receipt.records;
        response
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub name: String,
    pub description: String,
    pub status: WorkflowStatus,
    pub status_index: u8,
    pub voters_count: u64,
    pub proposals_count: u64,
    pub votes_cast: u64,
}

impl From<&Session> for SessionSummary {
    fn from(s: &Session) -> Self {
        SessionSummary {
            id: s.id,
            name: s.name.clone(),
            description: s.description.clone(),
            status: s.status,
            status_index: s.status.index(),
            voters_count: s.voters.len() as u64,
            proposals_count: s.proposals.len() as u64,
            votes_cast: s.votes_cast(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteResponse {
    pub voter: Address,
    pub has_voted: bool,
    pub proposal_id: Option<ProposalId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InfoResponse {
    pub version: String,
    #[serde(flatten)]
    pub summary: LedgerSummary,
    pub params: VotingParams,
    pub uptime_secs: u64,
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn parse_address(text: &str) -> Result<Address, RpcError> {
    text.trim()
        .parse()
        .map_err(|e: ballot_types::BallotError| RpcError::InvalidRequest(e.to_string()))
}

fn named_step(session_id: SessionId, step: &str) -> Result<Command, RpcError> {
    Ok(match step {
        "advance" => Command::Advance { session_id },
        "start_proposals_registration" => Command::StartProposalsRegistration { session_id },
        "stop_proposals_registration" => Command::StopProposalsRegistration { session_id },
        "start_voting_session" => Command::StartVotingSession { session_id },
        "stop_voting_session" => Command::StopVotingSession { session_id },
        "tally_votes" => Command::TallyVotes { session_id },
        other => return Err(RpcError::InvalidRequest(format!("unknown step: {other}"))),
    })
}

/// Submit on the blocking pool; ledger writes hit the store synchronously.
async fn commit(
    state: &Arc<RpcState>,
    caller: Address,
    command: Command,
) -> Result<SubmitResponse, RpcError> {
    let ledger = Arc::clone(&state.ledger);
    let outcome = tokio::task::spawn_blocking(move || ledger.submit(&caller, command))
        .await
        .map_err(|e| RpcError::Server(e.to_string()))?;
    match outcome {
        Ok(receipt) => {
            state.metrics.record_commit(&state.ledger.summary());
            Ok(receipt.into())
        }
        Err(err) => {
            if let Some(rejection) = err.rejection() {
                state.metrics.record_rejection(rejection.kind());
            }
            Err(err.into())
        }
    }
}

// ── Writes ──────────────────────────────────────────────────────────────

pub async fn create_session(
    State(state): ApiState,
    Caller(caller): Caller,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), RpcError> {
    let command = Command::CreateSession {
        name: req.name,
        description: req.description,
    };
    let response = commit(&state, caller, command).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn register_voter(
    State(state): ApiState,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    Json(req): Json<RegisterVoterRequest>,
) -> Result<Json<SubmitResponse>, RpcError> {
    let command = Command::RegisterVoter {
        session_id: SessionId::new(id),
        voter: parse_address(&req.voter)?,
    };
    Ok(Json(commit(&state, caller, command).await?))
}

pub async fn advance(
    State(state): ApiState,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    Query(query): Query<AdvanceQuery>,
) -> Result<Json<SubmitResponse>, RpcError> {
    let command = named_step(SessionId::new(id), query.step.as_deref().unwrap_or("advance"))?;
    Ok(Json(commit(&state, caller, command).await?))
}

pub async fn register_proposal(
    State(state): ApiState,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    Json(req): Json<RegisterProposalRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), RpcError> {
    let command = Command::RegisterProposal {
        session_id: SessionId::new(id),
        description: req.description,
    };
    let response = commit(&state, caller, command).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn vote(
    State(state): ApiState,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<SubmitResponse>, RpcError> {
    let command = Command::Vote {
        session_id: SessionId::new(id),
        proposal_id: ProposalId::new(req.proposal_id),
    };
    Ok(Json(commit(&state, caller, command).await?))
}

// ── Reads ───────────────────────────────────────────────────────────────

pub async fn list_sessions(
    State(state): ApiState,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<Page<SessionSummary>>, RpcError> {
    let summaries: Vec<SessionSummary> = state
        .ledger
        .read(|e| e.sessions().map(SessionSummary::from).collect());
    Ok(Json(pagination.page(summaries)?))
}

pub async fn get_session(
    State(state): ApiState,
    Path(id): Path<u64>,
) -> Result<Json<SessionSummary>, RpcError> {
    let session = state.ledger.session(SessionId::new(id))?;
    Ok(Json(SessionSummary::from(&session)))
}

pub async fn list_proposals(
    State(state): ApiState,
    Path(id): Path<u64>,
) -> Result<Json<Vec<Proposal>>, RpcError> {
    Ok(Json(state.ledger.proposals(SessionId::new(id))?))
}

pub async fn get_proposal(
    State(state): ApiState,
    Path((id, pid)): Path<(u64, u32)>,
) -> Result<Json<Proposal>, RpcError> {
    Ok(Json(
        state
            .ledger
            .proposal(SessionId::new(id), ProposalId::new(pid))?,
    ))
}

pub async fn get_voter(
    State(state): ApiState,
    Caller(caller): Caller,
    Path((id, address)): Path<(u64, String)>,
) -> Result<Json<Voter>, RpcError> {
    let voter = parse_address(&address)?;
    Ok(Json(
        state
            .ledger
            .get_voter(&caller, SessionId::new(id), &voter)?,
    ))
}

pub async fn get_vote(
    State(state): ApiState,
    Caller(caller): Caller,
    Path((id, address)): Path<(u64, String)>,
) -> Result<Json<VoteResponse>, RpcError> {
    let voter = parse_address(&address)?;
    let proposal_id = state.ledger.get_vote(&caller, SessionId::new(id), &voter)?;
    Ok(Json(VoteResponse {
        voter,
        has_voted: proposal_id.is_some(),
        proposal_id,
    }))
}

pub async fn get_result(
    State(state): ApiState,
    Path(id): Path<u64>,
) -> Result<Json<VoteResult>, RpcError> {
    Ok(Json(state.ledger.result(SessionId::new(id))?))
}

pub async fn get_capabilities(
    State(state): ApiState,
    Caller(caller): Caller,
    Path(id): Path<u64>,
) -> Result<Json<CapabilitySet>, RpcError> {
    Ok(Json(state.ledger.capabilities(&caller, SessionId::new(id))?))
}

pub async fn list_events(
    State(state): ApiState,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Page<EventRecord>>, RpcError> {
    let kind = query
        .kind
        .as_deref()
        .map(str::parse::<EventKind>)
        .transpose()
        .map_err(RpcError::InvalidRequest)?;
    let filter = EventFilter {
        kind,
        session_id: query.session_id.map(SessionId::new),
        from_block: query.from_block.map(BlockNumber::new),
        to_block: query.to_block.map(BlockNumber::new),
    };
    let pagination = PaginationParams {
        cursor: query.cursor,
        count: query.count,
    };
    let ledger = Arc::clone(&state.ledger);
    let records = tokio::task::spawn_blocking(move || ledger.events(&filter))
        .await
        .map_err(|e| RpcError::Server(e.to_string()))??;
    Ok(Json(pagination.page(records)?))
}

pub async fn info(State(state): ApiState) -> Json<InfoResponse> {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        summary: state.ledger.summary(),
        params: state.ledger.params(),
        uptime_secs: state.started.elapsed().as_secs(),
    })
}

pub async fn metrics(State(state): ApiState) -> Result<impl IntoResponse, RpcError> {
    state.metrics.observe(&state.ledger.summary());
    let text = state
        .metrics
        .encode()
        .map_err(|e| RpcError::Server(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        text,
    ))
}
