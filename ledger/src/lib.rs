//! The ballot ledger.
//!
//! Every accepted write is one transaction: the voting engine validates the
//! command, the resulting domain events are persisted as one numbered block,
//! folded into the in-memory state and finally pushed to subscribers.
//! Transactions are totally ordered by block number; a rejected command
//! persists nothing and consumes no number.
//!
//! On startup the stored blocks are replayed through the same fold, so the
//! rebuilt state is identical to the state before shutdown.

pub mod block;
pub mod context;
pub mod error;
pub mod event_bus;
pub mod filter;
pub mod ledger;
pub mod replay;

pub use block::{Block, EventRecord};
pub use context::CallContext;
pub use error::LedgerError;
pub use event_bus::EventBus;
pub use filter::EventFilter;
pub use ledger::{Ledger, LedgerSummary, Receipt};
pub use replay::replay;
