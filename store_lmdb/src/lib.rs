//! LMDB storage backend for the ballot ledger.
//!
//! Implements [`ballot_store::BlockStore`] using the `heed` LMDB bindings.
//! A single environment holds one `blocks` database.

pub mod block;
pub mod environment;
pub mod error;

pub use block::LmdbBlockStore;
pub use environment::LmdbEnvironment;
pub use error::LmdbError;
