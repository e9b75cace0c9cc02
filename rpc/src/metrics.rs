//! Prometheus metrics for the ledger API.
//!
//! [`RpcMetrics`] owns a dedicated [`Registry`] that the `/metrics` endpoint
//! encodes into the Prometheus text exposition format.

use ballot_ledger::LedgerSummary;
use ballot_voting::ErrorKind;
use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

pub struct RpcMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Transactions accepted and persisted as a block.
    pub transactions_committed: IntCounter,
    /// Transactions refused by the voting engine, labelled by error kind.
    pub transactions_rejected: IntCounterVec,

    // ── Gauges ──────────────────────────────────────────────────────────
    pub session_count: IntGauge,
    pub block_count: IntGauge,
}

impl RpcMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let transactions_committed = register_int_counter_with_registry!(
            Opts::new(
                "ballot_transactions_committed_total",
                "Total transactions committed to the ledger"
            ),
            registry
        )
        .expect("failed to register transactions_committed counter");

        let transactions_rejected = register_int_counter_vec_with_registry!(
            Opts::new(
                "ballot_transactions_rejected_total",
                "Total transactions rejected, by error kind"
            ),
            &["kind"],
            registry
        )
        .expect("failed to register transactions_rejected counter");

        let session_count = register_int_gauge_with_registry!(
            Opts::new("ballot_session_count", "Current number of voting sessions"),
            registry
        )
        .expect("failed to register session_count gauge");

        let block_count = register_int_gauge_with_registry!(
            Opts::new("ballot_block_count", "Current number of ledger blocks"),
            registry
        )
        .expect("failed to register block_count gauge");

        Self {
            registry,
            transactions_committed,
            transactions_rejected,
            session_count,
            block_count,
        }
    }

    pub fn record_commit(&self, summary: &LedgerSummary) {
        self.transactions_committed.inc();
        self.observe(summary);
    }

    pub fn record_rejection(&self, kind: ErrorKind) {
        self.transactions_rejected
            .with_label_values(&[kind.as_str()])
            .inc();
    }

    pub fn observe(&self, summary: &LedgerSummary) {
        self.session_count.set(summary.sessions as i64);
        self.block_count.set(summary.blocks as i64);
    }

    /// Render every registered metric in the text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for RpcMetrics {
    fn default() -> Self {
        Self::new()
    }
}
