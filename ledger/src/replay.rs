//! Rebuild session state from an event log.

use ballot_voting::{SessionBook, VotingError};

use crate::EventRecord;

/// Fold `records` from an empty book. Records must be in log order.
pub fn replay<'a, I>(records: I) -> Result<SessionBook, VotingError>
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    SessionBook::replay(records.into_iter().map(|r| &r.event))
}
