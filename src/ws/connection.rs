//! Per-connection read/write loop.
//!
//! Each accepted socket is registered with the [`RelayService`], then a
//! single task alternates between inbound client frames and the
//! connection's outbound queue until either side closes.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use super::messages::{ClientFrame, ServerFrame};
use crate::domain::ConnectionId;
use crate::error::RelayError;
use crate::service::RelayService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads client frames, dispatches them, and answers with an ack or error.
/// - Forwards frames queued for this connection by its room peers.
/// - Unregisters the connection (leaving every room) on exit.
pub async fn run_connection(socket: WebSocket, relay: Arc<RelayService>) {
    let (conn_id, mut outbound_rx) = relay.connect().await;
    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            // Incoming frame from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&relay, conn_id, &text).await;
                        if let Some(reply_json) = reply
                            && ws_tx.send(Message::text(reply_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        if let Some(reply_json) = reject_binary_frame(conn_id)
                            && ws_tx.send(Message::text(reply_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(connection = %conn_id, error = %e, "ws read failed");
                        break;
                    }
                    _ => {}
                }
            }
            // Frame queued by a room peer or the relay
            outbound = outbound_rx.recv() => {
                let Some(outbound) = outbound else {
                    break;
                };
                if let Some(json) = ServerFrame::event(&outbound).to_json()
                    && ws_tx.send(Message::text(json)).await.is_err() {
                        break;
                    }
            }
        }
    }

    let _ = relay.disconnect(conn_id).await;
    tracing::debug!(connection = %conn_id, "ws connection closed");
}

/// Handles a text frame from the client, returning the JSON reply, if any.
///
/// Malformed frames and failed operations always produce an `error` frame.
/// Successful events produce an `ack` when the event is always acknowledged
/// or the client supplied a correlation id.
pub async fn handle_text_message(
    relay: &RelayService,
    conn_id: ConnectionId,
    text: &str,
) -> Option<String> {
    let frame = match ClientFrame::parse(text) {
        Ok(frame) => frame,
        Err(err) => {
            tracing::debug!(connection = %conn_id, error = %err, "rejected client frame");
            return ServerFrame::error(None, &err).to_json();
        }
    };

    let wants_ack = frame.id.is_some() || frame.event.always_acked();
    match relay.dispatch(conn_id, frame.event).await {
        Ok(dispatch) if wants_ack => ServerFrame::ack(frame.id, &dispatch).to_json(),
        Ok(_) => None,
        Err(err) => ServerFrame::error(frame.id, &err).to_json(),
    }
}

/// Builds the error reply for a binary frame; the protocol is JSON text only.
#[must_use]
pub fn reject_binary_frame(conn_id: ConnectionId) -> Option<String> {
    let err = RelayError::MalformedFrame("binary frames are not supported".to_string());
    tracing::debug!(connection = %conn_id, "rejected binary frame");
    ServerFrame::error(None, &err).to_json()
}
