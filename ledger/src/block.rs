//! Ledger blocks: one committed transaction each.

use ballot_types::{Address, BlockNumber};
use ballot_voting::{Command, VotingEvent};
use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// A committed transaction and every event it emitted, in emission order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub number: BlockNumber,
    pub caller: Address,
    pub command: Command,
    pub events: Vec<VotingEvent>,
}

/// One event as observed in the log: where it was committed and in which order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub block: BlockNumber,
    pub log_index: u32,
    pub event: VotingEvent,
}

impl Block {
    pub fn encode(&self) -> Result<Vec<u8>, LedgerError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode the bytes stored under `number`, checking they belong there.
    pub fn decode(number: BlockNumber, bytes: &[u8]) -> Result<Self, LedgerError> {
        let block: Block = bincode::deserialize(bytes).map_err(|e| LedgerError::Corrupted {
            block: number,
            reason: e.to_string(),
        })?;
        if block.number != number {
            return Err(LedgerError::Corrupted {
                block: number,
                reason: format!("stored under {number} but numbered {}", block.number),
            });
        }
        Ok(block)
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.events
            .iter()
            .enumerate()
            .map(|(i, event)| EventRecord {
                block: self.number,
                log_index: i as u32,
                event: event.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_types::{SessionId, WorkflowStatus};

    fn sample() -> Block {
        let session_id = SessionId::new(2);
        Block {
            number: BlockNumber::new(11),
            caller: Address::from_low_u64(1),
            command: Command::Advance { session_id },
            events: vec![VotingEvent::WorkflowStatusChange {
                session_id,
                previous_status: WorkflowStatus::ProposalsRegistrationEnded,
                new_status: WorkflowStatus::VotingSessionStarted,
            }],
        }
    }

    #[test]
    fn decode_checks_the_number() {
        let block = sample();
        let bytes = block.encode().unwrap();
        assert_eq!(Block::decode(BlockNumber::new(11), &bytes).unwrap(), block);
        assert!(matches!(
            Block::decode(BlockNumber::new(12), &bytes),
            Err(LedgerError::Corrupted { .. })
        ));
    }

    #[test]
    fn garbage_is_corruption() {
        let err = Block::decode(BlockNumber::new(0), &[0xff, 0x01]).unwrap_err();
        assert!(matches!(err, LedgerError::Corrupted { .. }));
    }

    #[test]
    fn records_are_indexed_within_the_block() {
        let mut block = sample();
        block.events.push(block.events[0].clone());
        let records = block.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].log_index, 1);
        assert!(records.iter().all(|r| r.block == BlockNumber::new(11)));
    }
}
