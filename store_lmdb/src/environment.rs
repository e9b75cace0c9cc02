//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use tracing::info;

use crate::{LmdbBlockStore, LmdbError};

/// Default map size: 1 GiB of address space, grown lazily by the OS.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

const MAX_DBS: u32 = 4;
const BLOCKS_DB: &str = "blocks";

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    blocks_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment in the directory `path`.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;
        // SAFETY: the environment is opened once per process and the
        // directory is not modified by anything else while it is open.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };
        let mut wtxn = env.write_txn()?;
        let blocks_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some(BLOCKS_DB))?;
        wtxn.commit()?;
        info!(path = %path.display(), map_size, "opened LMDB environment");
        Ok(Self {
            env: Arc::new(env),
            blocks_db,
        })
    }

    pub fn block_store(&self) -> LmdbBlockStore {
        LmdbBlockStore {
            env: Arc::clone(&self.env),
            blocks_db: self.blocks_db,
        }
    }
}
