//! Real-time event fan-out over WebSocket

mod hub;
mod protocol;

pub use hub::StreamHub;
pub use protocol::{broadcast_frame, ClientFrame, ServerFrame};

use crate::api::types::AppState;
use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};

/// Upgrade handler for `GET /ws`
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| hub.handle_socket(socket))
}
