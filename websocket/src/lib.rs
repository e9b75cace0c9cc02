//! WebSocket server for live ledger events.
//!
//! Clients subscribe with an optional kind and session filter. A subscription
//! may start from a historical block: stored records are replayed first and
//! live records follow without gaps or duplicates.

pub mod server;
pub mod subscriptions;

pub use server::{router, WebSocketServer, WsState};
pub use subscriptions::{ClientMessage, ServerMessage, Subscription};
