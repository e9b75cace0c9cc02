//! LMDB implementation of BlockStore.
//!
//! Keys are the big-endian block number, so LMDB's lexicographic key order
//! is block order and range scans come back ascending.

use std::ops::Bound;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use ballot_store::{BlockStore, StoreError};
use ballot_types::BlockNumber;

use crate::LmdbError;

pub struct LmdbBlockStore {
    pub(crate) env: Arc<Env>,
    pub(crate) blocks_db: Database<Bytes, Bytes>,
}

fn decode_key(key: &[u8]) -> Result<BlockNumber, LmdbError> {
    let bytes: [u8; 8] = key
        .try_into()
        .map_err(|_| LmdbError::Corruption(format!("block key of {} bytes", key.len())))?;
    Ok(BlockNumber::from_be_bytes(bytes))
}

impl BlockStore for LmdbBlockStore {
    fn put_block(&self, number: BlockNumber, block_bytes: &[u8]) -> Result<(), StoreError> {
        let key = number.to_be_bytes();
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .blocks_db
            .get(&wtxn, &key[..])
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::DuplicateBlock(number));
        }
        self.blocks_db
            .put(&mut wtxn, &key[..], block_bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_block(&self, number: BlockNumber) -> Result<Vec<u8>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let key = number.to_be_bytes();
        let val = self
            .blocks_db
            .get(&rtxn, &key[..])
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::BlockNotFound(number))?;
        Ok(val.to_vec())
    }

    fn blocks_in_range(
        &self,
        from: BlockNumber,
        to: BlockNumber,
    ) -> Result<Vec<(BlockNumber, Vec<u8>)>, StoreError> {
        if from > to {
            return Ok(Vec::new());
        }
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let lower = from.to_be_bytes();
        let upper = to.to_be_bytes();
        let bounds = (
            Bound::Included(&lower[..]),
            Bound::Included(&upper[..]),
        );
        let iter = self
            .blocks_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for entry in iter {
            let (key, val) = entry.map_err(LmdbError::from)?;
            results.push((decode_key(key)?, val.to_vec()));
        }
        Ok(results)
    }

    fn latest_block(&self) -> Result<Option<BlockNumber>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self.blocks_db.last(&rtxn).map_err(LmdbError::from)? {
            Some((key, _)) => Ok(Some(decode_key(key)?)),
            None => Ok(None),
        }
    }

    fn block_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.blocks_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}
