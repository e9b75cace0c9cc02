use std::sync::{Arc, Mutex};
use std::thread;

use ballot_ledger::{replay, EventFilter, EventRecord, Ledger, LedgerError};
use ballot_store::{BlockStore, MemoryBlockStore};
use ballot_store_lmdb::LmdbEnvironment;
use ballot_types::{Address, BlockNumber, ProposalId, SessionId, WorkflowStatus};
use ballot_voting::{Command, ErrorKind, EventKind, VotingParams};

fn admin() -> Address {
    Address::from_low_u64(0xad)
}

fn voter(n: u64) -> Address {
    Address::from_low_u64(n)
}

fn open_memory() -> (Arc<MemoryBlockStore>, Ledger) {
    let store = Arc::new(MemoryBlockStore::new());
    let ledger = Ledger::open(store.clone(), admin(), VotingParams::default()).unwrap();
    (store, ledger)
}

/// Session 0 with voters 1..=3, one proposal from voter 1, voting open.
fn voting_session(ledger: &Ledger) -> SessionId {
    let owner = ledger.as_caller(admin());
    let s = owner.create_session("Budget", "where the money goes").unwrap();
    for n in 1..=3 {
        owner.register_voter(s, voter(n)).unwrap();
    }
    owner.start_proposals_registration(s).unwrap();
    ledger
        .as_caller(voter(1))
        .register_proposal(s, "Parks")
        .unwrap();
    owner.stop_proposals_registration(s).unwrap();
    owner.start_voting_session(s).unwrap();
    s
}

#[test]
fn blocks_are_numbered_contiguously_from_genesis() {
    let (store, ledger) = open_memory();
    voting_session(&ledger);
    // create + 3 voters + 3 transitions + 1 proposal
    assert_eq!(store.block_count().unwrap(), 8);
    assert_eq!(store.latest_block().unwrap(), Some(BlockNumber::new(7)));
    assert_eq!(ledger.summary().next_block, BlockNumber::new(8));

    let first = ledger.block(BlockNumber::GENESIS).unwrap();
    assert_eq!(first.caller, admin());
    assert!(matches!(first.command, Command::CreateSession { .. }));
}

#[test]
fn rejected_transactions_persist_nothing() {
    let (store, ledger) = open_memory();
    let s = voting_session(&ledger);
    let before = store.block_count().unwrap();

    let err = ledger
        .as_caller(voter(1))
        .vote(s, ProposalId::ABSTENTION)
        .unwrap_err();
    assert_eq!(err.rejection().unwrap().kind(), ErrorKind::Policy);
    let err = ledger.as_caller(voter(9)).vote(s, ProposalId::BLANK).unwrap_err();
    assert_eq!(err.rejection().unwrap().kind(), ErrorKind::Authorization);

    assert_eq!(store.block_count().unwrap(), before);
    // The next accepted transaction takes the very next number.
    let receipt = ledger
        .submit(
            &voter(2),
            Command::Vote {
                session_id: s,
                proposal_id: ProposalId::BLANK,
            },
        )
        .unwrap();
    assert_eq!(receipt.block, BlockNumber::new(before));
}

#[test]
fn opening_proposals_commits_three_events_in_one_block() {
    let (_store, ledger) = open_memory();
    let owner = ledger.as_caller(admin());
    let s = owner.create_session("n", "d").unwrap();
    let receipt = owner.submit(Command::Advance { session_id: s }).unwrap();
    let kinds: Vec<EventKind> = receipt.events().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::WorkflowStatusChange,
            EventKind::ProposalRegistered,
            EventKind::ProposalRegistered
        ]
    );
    let indices: Vec<u32> = receipt.records.iter().map(|r| r.log_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn reopening_replays_to_identical_state() {
    let (store, ledger) = open_memory();
    let s = voting_session(&ledger);
    ledger.as_caller(voter(1)).vote(s, ProposalId::new(2)).unwrap();
    ledger.as_caller(voter(2)).vote(s, ProposalId::BLANK).unwrap();
    let owner = ledger.as_caller(admin());
    owner.stop_voting_session(s).unwrap();
    assert_eq!(owner.tally_votes(s).unwrap(), WorkflowStatus::VotesTallied);
    let live = ledger.sessions();
    let summary = ledger.summary();
    drop(ledger);

    let reopened = Ledger::open(store, admin(), VotingParams::default()).unwrap();
    assert_eq!(reopened.sessions(), live);
    assert_eq!(reopened.summary(), summary);
    let result = reopened.result(s).unwrap();
    assert_eq!(result.total_votes, 2);
    assert_eq!(result.non_voter_count, 1);
    assert_eq!(
        result.winning_proposals.iter().map(|p| p.proposal_id).collect::<Vec<_>>(),
        vec![ProposalId::BLANK, ProposalId::new(2)]
    );
}

#[test]
fn reopening_an_lmdb_ledger_replays_it() {
    let dir = tempfile::tempdir().unwrap();
    let live = {
        let env = LmdbEnvironment::open(dir.path(), 10 << 20).unwrap();
        let ledger =
            Ledger::open(Arc::new(env.block_store()), admin(), VotingParams::default()).unwrap();
        let s = voting_session(&ledger);
        ledger.as_caller(voter(3)).vote(s, ProposalId::new(2)).unwrap();
        ledger.sessions()
    };
    let env = LmdbEnvironment::open(dir.path(), 10 << 20).unwrap();
    let ledger =
        Ledger::open(Arc::new(env.block_store()), admin(), VotingParams::default()).unwrap();
    assert_eq!(ledger.sessions(), live);
    let vote = ledger
        .as_caller(voter(1))
        .get_vote(SessionId::FIRST, &voter(3))
        .unwrap();
    assert_eq!(vote, Some(ProposalId::new(2)));
}

#[test]
fn reopening_under_another_administrator_is_refused() {
    let (store, ledger) = open_memory();
    let owner = ledger.as_caller(admin());
    let s = owner.create_session("Budget", "where the money goes").unwrap();
    owner.register_voter(s, voter(0xbb)).unwrap();
    drop(ledger);

    let err = Ledger::open(store.clone(), voter(0xbb), VotingParams::default())
        .err()
        .unwrap();
    assert!(matches!(
        err,
        LedgerError::AdministratorMismatch { stored, configured }
            if stored == admin() && configured == voter(0xbb)
    ));
    assert_eq!(store.block_count().unwrap(), 2);

    let reopened = Ledger::open(store, admin(), VotingParams::default()).unwrap();
    assert_eq!(
        reopened.as_caller(admin()).advance(s).unwrap(),
        WorkflowStatus::ProposalsRegistrationStarted
    );
    let seeds = reopened.proposals(s).unwrap();
    assert!(seeds.iter().all(|p| p.proposer == admin()));
}

#[test]
fn empty_store_accepts_any_administrator() {
    let store = Arc::new(MemoryBlockStore::new());
    assert!(Ledger::open(store.clone(), voter(1), VotingParams::default()).is_ok());
    assert!(Ledger::open(store, voter(2), VotingParams::default()).is_ok());
}

#[test]
fn unusable_voting_params_are_refused() {
    for cap in [0, 1, 257] {
        let params = VotingParams {
            max_proposals_per_session: cap,
            ..VotingParams::default()
        };
        let err = Ledger::open(Arc::new(MemoryBlockStore::new()), admin(), params)
            .err()
            .unwrap();
        assert!(matches!(err, LedgerError::InvalidParams(_)));
    }

    let seeds_only = VotingParams {
        max_proposals_per_session: 2,
        ..VotingParams::default()
    };
    let ledger = Ledger::open(Arc::new(MemoryBlockStore::new()), admin(), seeds_only).unwrap();
    let owner = ledger.as_caller(admin());
    let s = owner.create_session("Tiny", "seeds only").unwrap();
    assert_eq!(
        owner.start_proposals_registration(s).unwrap(),
        WorkflowStatus::ProposalsRegistrationStarted
    );
}

#[test]
fn corrupted_store_fails_to_open() {
    let store = Arc::new(MemoryBlockStore::new());
    store.put_block(BlockNumber::GENESIS, b"not a block").unwrap();
    let err = Ledger::open(store, admin(), VotingParams::default()).err().unwrap();
    assert!(matches!(err, LedgerError::Corrupted { .. }));
}

#[test]
fn event_queries_filter_by_kind_session_and_range() {
    let (_store, ledger) = open_memory();
    let s0 = voting_session(&ledger);
    let owner = ledger.as_caller(admin());
    let s1 = owner.create_session("Second", "another").unwrap();
    owner.register_voter(s1, voter(1)).unwrap();

    let registered = ledger
        .events(&EventFilter::all().kind(EventKind::VoterRegistered))
        .unwrap();
    assert_eq!(registered.len(), 4);

    let in_s1 = ledger.events(&EventFilter::all().session(s1)).unwrap();
    assert_eq!(in_s1.len(), 2);
    assert!(in_s1.iter().all(|r| r.event.session_id() == s1));

    let early = ledger
        .events(&EventFilter::all().session(s0).blocks(None, Some(BlockNumber::new(1))))
        .unwrap();
    assert_eq!(early.len(), 2);
    assert!(early.windows(2).all(|w| w[0].block <= w[1].block));

    let everything = ledger.events(&EventFilter::all()).unwrap();
    let rebuilt = replay(&everything).unwrap();
    assert_eq!(rebuilt.len(), 2);
    assert_eq!(
        rebuilt.get(s0).unwrap(),
        &ledger.session(s0).unwrap()
    );
}

#[test]
fn subscribers_see_records_in_commit_order() {
    let (_store, ledger) = open_memory();
    let seen: Arc<Mutex<Vec<EventRecord>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    ledger.subscribe(Box::new(move |record| {
        sink.lock().unwrap().push(record.clone());
    }));

    voting_session(&ledger);
    let _ = ledger.as_caller(voter(8)).vote(SessionId::FIRST, ProposalId::BLANK);

    let seen = seen.lock().unwrap();
    let stored = ledger.events(&EventFilter::all()).unwrap();
    assert_eq!(*seen, stored);
}

#[test]
fn concurrent_voters_get_distinct_blocks() {
    let (store, ledger) = open_memory();
    let ledger = Arc::new(ledger);
    let owner = ledger.as_caller(admin());
    let s = owner.create_session("Crowd", "many voters").unwrap();
    for n in 1..=16 {
        owner.register_voter(s, voter(n)).unwrap();
    }
    owner.advance(s).unwrap();
    owner.advance(s).unwrap();
    owner.advance(s).unwrap();
    let start = store.block_count().unwrap();

    let handles: Vec<_> = (1..=16)
        .map(|n| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                ledger
                    .as_caller(voter(n))
                    .vote(s, ProposalId::BLANK)
                    .unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(store.block_count().unwrap(), start + 16);
    assert_eq!(ledger.proposal(s, ProposalId::BLANK).unwrap().vote_count, 16);
    let votes = ledger.events(&EventFilter::all().kind(EventKind::Voted)).unwrap();
    let mut blocks: Vec<u64> = votes.iter().map(|r| r.block.as_u64()).collect();
    blocks.dedup();
    assert_eq!(blocks.len(), 16);
}
