//! Abstract storage for the ballot ledger.
//!
//! The ledger is an append-only sequence of numbered blocks. Every backend
//! (LMDB, in-memory for testing) implements [`BlockStore`]; the rest of the
//! codebase depends only on the trait and treats block bytes as opaque.

pub mod block;
pub mod error;
pub mod memory;

pub use block::BlockStore;
pub use error::StoreError;
pub use memory::MemoryBlockStore;
