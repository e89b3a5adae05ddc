//! Per-connection handler: event decoding and routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Spawn a writer task that drains the client's outbound channel
//!   2. Loop: receive frames → decode `Envelope<ClientEvent>` → route to
//!      the room manager
//!   3. On close, leave whatever room the client is in

use std::sync::Arc;

use skirmish_protocol::{ClientEvent, ClientId, Codec, Envelope, ServerEvent};
use skirmish_room::ClientSender;
use skirmish_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::SkirmishError;
use crate::server::ServerState;

/// Drop guard that removes the client from its room when the handler exits.
///
/// Runs even if the handler panics. `Drop` is synchronous, so the leave is
/// spawned as a fire-and-forget task.
struct DisconnectGuard<C: Codec> {
    client: ClientId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for DisconnectGuard<C> {
    fn drop(&mut self) {
        let client = self.client;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.rooms.disconnect(client).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), SkirmishError> {
    let conn = Arc::new(conn);
    let client = ClientId::from(conn.id());
    tracing::info!(%client, "client connected");

    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_events(Arc::clone(&conn), rx, Arc::clone(&state)));

    let _guard = DisconnectGuard {
        client,
        state: Arc::clone(&state),
    };

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%client, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%client, error = %e, "recv error");
                break;
            }
        };

        let envelope: Envelope<ClientEvent> = match state.codec.decode(&data) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(%client, error = %e, "failed to decode envelope");
                continue;
            }
        };

        if let Err(e) = dispatch(&state, client, envelope.payload, &tx).await {
            tracing::debug!(%client, error = %e, "event not applied");
        }
    }

    writer.abort();
    // _guard drops here → leave fires.
    Ok(())
}

/// Routes one client event to the room manager.
async fn dispatch<C: Codec>(
    state: &ServerState<C>,
    client: ClientId,
    event: ClientEvent,
    tx: &ClientSender,
) -> Result<(), SkirmishError> {
    tracing::trace!(%client, room = %event.room(), ?event, "client event");

    let rooms = &state.rooms;
    match event {
        ClientEvent::JoinRoom(room) => rooms.join(client, &room, tx.clone()).await?,
        ClientEvent::LeaveRoom(room) => rooms.leave(client, &room).await?,
        ClientEvent::ConfirmPlayer(room) => rooms.confirm(client, &room).await?,
        ClientEvent::ReadyForRound { room_id } => rooms.ready(client, &room_id).await?,
        ClientEvent::PlayerMove { room_id, mv } => {
            rooms.submit_move(client, &room_id, mv).await?
        }
        ClientEvent::PlayAgain { room_id } => rooms.play_again(client, &room_id).await?,
    }
    Ok(())
}

/// Drains the client's outbound channel onto the socket, stamping each
/// event with a per-connection sequence number starting at 1.
async fn write_events<C: Codec>(
    conn: Arc<WebSocketConnection>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
    state: Arc<ServerState<C>>,
) {
    let mut seq: u64 = 1;

    while let Some(event) = rx.recv().await {
        let name = event.name();
        let envelope = Envelope {
            seq: next_seq(&mut seq),
            timestamp: state.uptime_ms(),
            payload: event,
        };

        let bytes = match state.codec.encode(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(conn_id = %conn.id(), event = name, error = %e, "encode failed");
                continue;
            }
        };

        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "send failed, stopping writer");
            break;
        }
    }
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}
