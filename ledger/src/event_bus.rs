//! Synchronous fan-out of committed event records.

use crate::EventRecord;

type Listener = Box<dyn Fn(&EventRecord) + Send + Sync>;

/// Delivers every committed [`EventRecord`] to all listeners.
///
/// Listeners are invoked inline, after the block is persisted and applied and
/// while the writer lock is still held, so they observe records in commit
/// order. Keep handlers fast; forwarding to a channel is the usual pattern.
pub struct EventBus {
    listeners: Vec<Listener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, record: &EventRecord) {
        for listener in &self.listeners {
            listener(record);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_types::{BlockNumber, SessionId};
    use ballot_voting::VotingEvent;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    fn record() -> EventRecord {
        EventRecord {
            block: BlockNumber::GENESIS,
            log_index: 0,
            event: VotingEvent::SessionCreated {
                session_id: SessionId::FIRST,
                name: "n".into(),
                description: "d".into(),
            },
        }
    }

    #[test]
    fn emit_calls_all_listeners() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut bus = EventBus::new();

        let c1 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        }));
        let c2 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_| {
            c2.fetch_add(10, Ordering::SeqCst);
        }));

        bus.emit(&record());
        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn emit_with_no_listeners_is_noop() {
        let bus = EventBus::default();
        assert_eq!(bus.listener_count(), 0);
        bus.emit(&record());
    }
}
