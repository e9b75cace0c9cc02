//! The ledger handle: one writer, many readers.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ballot_store::BlockStore;
use ballot_types::{Address, BlockNumber, ProposalId, SessionId};
use ballot_voting::{
    CapabilitySet, Command, Proposal, Session, Voter, VoteResult, VotingEvent, VotingParams,
    VotingSessionEngine,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Block, CallContext, EventBus, EventFilter, EventRecord, LedgerError};

/// Outcome of a committed transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub block: BlockNumber,
    pub records: Vec<EventRecord>,
}

impl Receipt {
    pub fn events(&self) -> impl Iterator<Item = &VotingEvent> {
        self.records.iter().map(|r| &r.event)
    }
}

/// Summary statistics for the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub administrator: Address,
    pub sessions: u64,
    pub blocks: u64,
    /// Number the next committed block will receive.
    pub next_block: BlockNumber,
}

struct LedgerState {
    engine: VotingSessionEngine,
    next_block: BlockNumber,
}

/// Serializes every write, persists it as a block and publishes its events.
///
/// The write lock is held from validation until subscribers have been
/// notified, so each transaction observes the effects of all earlier ones
/// and block numbers are contiguous.
pub struct Ledger {
    store: Arc<dyn BlockStore>,
    state: RwLock<LedgerState>,
    bus: RwLock<EventBus>,
}

impl Ledger {
    /// Open the ledger over `store`, replaying every stored block.
    ///
    /// Only the administrator can commit to an empty ledger, so the caller
    /// of block 0 is the administrator the store was created for; opening it
    /// as anyone else fails with [`LedgerError::AdministratorMismatch`].
    pub fn open(
        store: Arc<dyn BlockStore>,
        administrator: Address,
        params: VotingParams,
    ) -> Result<Self, LedgerError> {
        params.validate()?;
        let mut engine = VotingSessionEngine::new(administrator, params);
        let mut next_block = BlockNumber::GENESIS;
        let mut replayed = 0u64;
        for (number, bytes) in store.all_blocks()? {
            if number != next_block {
                return Err(LedgerError::Corrupted {
                    block: number,
                    reason: format!("expected block {next_block}"),
                });
            }
            let block = Block::decode(number, &bytes)?;
            if number == BlockNumber::GENESIS && block.caller != administrator {
                return Err(LedgerError::AdministratorMismatch {
                    stored: block.caller,
                    configured: administrator,
                });
            }
            for event in &block.events {
                engine
                    .apply(event)
                    .map_err(|source| LedgerError::Replay {
                        block: number,
                        source,
                    })?;
            }
            next_block = number.next();
            replayed += 1;
        }
        info!(
            %administrator,
            blocks = replayed,
            sessions = engine.book().len(),
            "ledger opened"
        );
        Ok(Self {
            store,
            state: RwLock::new(LedgerState { engine, next_block }),
            bus: RwLock::new(EventBus::new()),
        })
    }

    /// A handle acting as `caller`.
    pub fn as_caller(&self, caller: Address) -> CallContext<'_> {
        CallContext::new(self, caller)
    }

    /// Validate, persist, apply and publish one transaction.
    pub fn submit(&self, caller: &Address, command: Command) -> Result<Receipt, LedgerError> {
        let mut state = self.write_state();
        let events = match state.engine.execute(caller, &command) {
            Ok(events) => events,
            Err(err) => {
                debug!(%caller, command = command.name(), error = %err, "transaction rejected");
                return Err(err.into());
            }
        };

        let number = state.next_block;
        let block = Block {
            number,
            caller: *caller,
            command,
            events,
        };
        self.store.put_block(number, &block.encode()?)?;
        for event in &block.events {
            state
                .engine
                .apply(event)
                .map_err(|source| LedgerError::Replay {
                    block: number,
                    source,
                })?;
        }
        state.next_block = number.next();

        let records = block.records();
        info!(
            block = %number,
            %caller,
            command = block.command.name(),
            events = records.len(),
            "transaction committed"
        );
        let bus = self.bus.read().unwrap_or_else(PoisonError::into_inner);
        for record in &records {
            bus.emit(record);
        }
        Ok(Receipt {
            block: number,
            records,
        })
    }

    /// Register a listener for every record committed from now on.
    ///
    /// Listeners run under the writer lock and must not call back into the ledger.
    pub fn subscribe(&self, listener: Box<dyn Fn(&EventRecord) + Send + Sync>) {
        self.bus
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribe(listener);
    }

    /// Stored records matching `filter`, in log order.
    pub fn events(&self, filter: &EventFilter) -> Result<Vec<EventRecord>, LedgerError> {
        let mut records = Vec::new();
        for (number, bytes) in self
            .store
            .blocks_in_range(filter.first_block(), filter.last_block())?
        {
            let block = Block::decode(number, &bytes)?;
            records.extend(block.records().into_iter().filter(|r| filter.matches(r)));
        }
        Ok(records)
    }

    pub fn block(&self, number: BlockNumber) -> Result<Block, LedgerError> {
        let bytes = self.store.get_block(number)?;
        Block::decode(number, &bytes)
    }

    /// Run `f` against a consistent snapshot of the engine.
    pub fn read<R>(&self, f: impl FnOnce(&VotingSessionEngine) -> R) -> R {
        f(&self.read_state().engine)
    }

    pub fn summary(&self) -> LedgerSummary {
        let state = self.read_state();
        LedgerSummary {
            administrator: *state.engine.administrator(),
            sessions: state.engine.book().len() as u64,
            blocks: state.next_block.as_u64(),
            next_block: state.next_block,
        }
    }

    pub fn administrator(&self) -> Address {
        self.read(|e| *e.administrator())
    }

    pub fn params(&self) -> VotingParams {
        self.read(|e| e.params().clone())
    }

    // ── Reads (cloned out of the lock) ─────────────────────────────────

    pub fn session(&self, id: SessionId) -> Result<Session, LedgerError> {
        Ok(self.read(|e| e.session(id).cloned())?)
    }

    pub fn sessions(&self) -> Vec<Session> {
        self.read(|e| e.sessions().cloned().collect())
    }

    pub fn proposals(&self, session_id: SessionId) -> Result<Vec<Proposal>, LedgerError> {
        Ok(self.read(|e| e.proposals(session_id).map(<[Proposal]>::to_vec))?)
    }

    pub fn proposal(
        &self,
        session_id: SessionId,
        proposal_id: ProposalId,
    ) -> Result<Proposal, LedgerError> {
        Ok(self.read(|e| e.proposal(session_id, proposal_id).cloned())?)
    }

    pub fn result(&self, session_id: SessionId) -> Result<VoteResult, LedgerError> {
        Ok(self.read(|e| e.result(session_id).cloned())?)
    }

    pub fn get_voter(
        &self,
        caller: &Address,
        session_id: SessionId,
        voter: &Address,
    ) -> Result<Voter, LedgerError> {
        Ok(self.read(|e| e.get_voter(caller, session_id, voter).cloned())?)
    }

    pub fn get_vote(
        &self,
        caller: &Address,
        session_id: SessionId,
        voter: &Address,
    ) -> Result<Option<ProposalId>, LedgerError> {
        Ok(self.read(|e| e.get_vote(caller, session_id, voter))?)
    }

    pub fn capabilities(
        &self,
        caller: &Address,
        session_id: SessionId,
    ) -> Result<CapabilitySet, LedgerError> {
        Ok(self.read(|e| e.capabilities(caller, session_id))?)
    }

    fn read_state(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
