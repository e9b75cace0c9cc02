//! Identifier newtypes: sessions, proposals, ledger blocks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BallotError;

/// Sequential identifier of a voting session, assigned at creation.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    pub const FIRST: Self = Self(0);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The identifier assigned after this one, or `None` once the id space is exhausted.
    pub fn checked_next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

/// Position of a proposal within its session, starting at 0.
///
/// Ids 0 and 1 are always the seeded "Abstention" and "Blank" proposals.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ProposalId(u32);

impl ProposalId {
    /// The seeded abstention proposal.
    pub const ABSTENTION: Self = Self(0);
    /// The seeded blank-vote proposal.
    pub const BLANK: Self = Self(1);

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Index into the session's proposal list.
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn is_seed(&self) -> bool {
        *self == Self::ABSTENTION || *self == Self::BLANK
    }
}

/// Height of a committed transaction in the ledger, starting at 1.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BlockNumber(u64);

impl BlockNumber {
    /// Sentinel for "nothing committed yet"; the first block is `GENESIS.next()`.
    pub const GENESIS: Self = Self(0);

    pub fn new(n: u64) -> Self {
        Self(n)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Big-endian bytes, so byte-wise key order equals numeric order.
    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    pub fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }
}

macro_rules! impl_display_from_str {
    ($ty:ident, $inner:ty, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $ty {
            type Err = BallotError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<$inner>()
                    .map(Self)
                    .map_err(|e| BallotError::InvalidId(format!("{} {s:?}: {e}", $what)))
            }
        }
    };
}

impl_display_from_str!(SessionId, u64, "session id");
impl_display_from_str!(ProposalId, u32, "proposal id");
impl_display_from_str!(BlockNumber, u64, "block number");
