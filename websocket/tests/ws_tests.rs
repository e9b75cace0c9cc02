use std::sync::Arc;
use std::time::Duration;

use ballot_ledger::Ledger;
use ballot_store::MemoryBlockStore;
use ballot_types::{Address, ProposalId, SessionId};
use ballot_voting::VotingParams;
use ballot_websocket::{router, WsState};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn admin() -> Address {
    Address::from_low_u64(0xad)
}

fn voter(n: u64) -> Address {
    Address::from_low_u64(n)
}

async fn serve(ledger: Arc<Ledger>) -> String {
    let state = Arc::new(WsState::attach(ledger, 64));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("ws://{addr}/ws")
}

async fn send(client: &mut Client, value: Value) {
    client.send(Message::Text(value.to_string())).await.unwrap();
}

async fn next_json(client: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for a message")
            .unwrap()
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

fn ledger() -> Arc<Ledger> {
    Arc::new(
        Ledger::open(
            Arc::new(MemoryBlockStore::new()),
            admin(),
            VotingParams::default(),
        )
        .unwrap(),
    )
}

#[tokio::test]
async fn replay_then_live_without_duplicates() {
    let ledger = ledger();
    let owner = ledger.as_caller(admin());
    let s = owner.create_session("Retro", "history first").unwrap();
    owner.register_voter(s, voter(1)).unwrap();

    let url = serve(Arc::clone(&ledger)).await;
    let (mut client, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    send(&mut client, json!({"action": "subscribe", "from_block": 0})).await;

    assert_eq!(next_json(&mut client).await["type"], "ack");
    let first = next_json(&mut client).await;
    assert_eq!(first["type"], "event");
    assert_eq!(first["record"]["block"], 0);
    let second = next_json(&mut client).await;
    assert_eq!(second["record"]["block"], 1);

    ledger.as_caller(admin()).advance(s).unwrap();
    // Status change plus the two seeded proposals, all in block 2.
    for index in 0..3 {
        let live = next_json(&mut client).await;
        assert_eq!(live["record"]["block"], 2);
        assert_eq!(live["record"]["log_index"], index);
    }

    send(&mut client, json!({"action": "ping"})).await;
    assert_eq!(next_json(&mut client).await["type"], "pong");
}

#[tokio::test]
async fn live_subscription_filters_by_kind_and_session() {
    let ledger = ledger();
    let url = serve(Arc::clone(&ledger)).await;
    let (mut client, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    send(
        &mut client,
        json!({"action": "subscribe", "kinds": ["voted"], "session_id": 0}),
    )
    .await;
    assert_eq!(next_json(&mut client).await["type"], "ack");

    let owner = ledger.as_caller(admin());
    let s = owner.create_session("Live", "filtered").unwrap();
    owner.register_voter(s, voter(1)).unwrap();
    for _ in 0..3 {
        owner.advance(s).unwrap();
    }
    ledger
        .as_caller(voter(1))
        .vote(s, ProposalId::BLANK)
        .unwrap();
    assert_eq!(s, SessionId::FIRST);

    let msg = next_json(&mut client).await;
    assert_eq!(msg["type"], "event");
    assert_eq!(msg["record"]["event"]["Voted"]["proposal_id"], 1);

    send(&mut client, json!({"action": "unsubscribe"})).await;
    assert_eq!(next_json(&mut client).await["action"], "unsubscribe");
}

#[tokio::test]
async fn bad_messages_get_an_error_reply() {
    let url = serve(ledger()).await;
    let (mut client, _) = tokio_tungstenite::connect_async(url).await.unwrap();

    send(&mut client, json!({"action": "dance"})).await;
    assert_eq!(next_json(&mut client).await["type"], "error");

    send(&mut client, json!({"action": "subscribe", "kinds": ["Exploded"]})).await;
    assert_eq!(next_json(&mut client).await["type"], "error");

    send(&mut client, json!({"action": "unsubscribe"})).await;
    let reply = next_json(&mut client).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["message"], "Not subscribed");
}
