//! Per-connection WebSocket session: registration with the hub, the outbound writer and
//! the inbound reader with its idle policy.

use std::{
    fmt::Display,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use axum::{
    body::Bytes,
    extract::ws::{Message, WebSocket},
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::{
    sync::mpsc,
    time::{Instant, MissedTickBehavior, interval_at, sleep, timeout},
};
use tracing::{debug, info, warn};

use crate::{
    dto::ws::ClientInboundMessage,
    state::{ConnectionHandle, SharedState},
};

/// Upper bound on how long a closing session waits for its writer to flush.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle the full lifecycle of one player's WebSocket connection.
///
/// Splits the socket and hands both halves to [`run_session`].
pub async fn handle_socket(state: SharedState, socket: WebSocket, room_code: String, player_id: String) {
    let (sender, receiver) = socket.split();
    run_session(state, sender, receiver, room_code, player_id).await;
}

/// Time of the last payload the writer delivered, shared with the reader.
///
/// Pings are not recorded, so a connection that only receives probes still goes idle.
#[derive(Clone)]
struct OutboundActivity {
    origin: Instant,
    elapsed_ms: Arc<AtomicU64>,
}

impl OutboundActivity {
    fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    fn record(&self) {
        let elapsed = u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.elapsed_ms.store(elapsed, Ordering::Relaxed);
    }

    fn last(&self) -> Instant {
        self.origin + Duration::from_millis(self.elapsed_ms.load(Ordering::Relaxed))
    }
}

/// Register the connection, pump both directions, and unregister on any exit path.
///
/// The session ends when:
/// - the peer sends a close frame or hangs up,
/// - a receive or write fails,
/// - the hub drops the connection because its queue is full,
/// - nothing was received for `idle_timeout` and nothing was delivered either.
///
/// Pings go out every `ping_interval` regardless of traffic, so a responsive peer keeps
/// the connection alive even when it never sends anything of its own.
pub(crate) async fn run_session<S, R, E>(
    state: SharedState,
    sender: S,
    mut receiver: R,
    room_code: String,
    player_id: String,
) where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let settings = state.config().session.clone();
    let (handle, queue) = state
        .hub()
        .register(&room_code, &player_id, settings.outbound_capacity);
    info!(room = %room_code, player = %player_id, connection = %handle.id, "player connected");

    let activity = OutboundActivity::new();
    let mut writer = tokio::spawn(outbound_pump(
        sender,
        queue,
        settings.ping_interval,
        activity.clone(),
        handle.clone(),
    ));
    let mut writer_finished = false;

    let idle = sleep(settings.idle_timeout);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            frame = receiver.next() => match frame {
                Some(Ok(message)) => {
                    if !handle_frame(&handle, message) {
                        break;
                    }
                    idle.as_mut().reset(Instant::now() + settings.idle_timeout);
                }
                Some(Err(err)) => {
                    warn!(room = %room_code, player = %player_id, error = %err, "websocket receive error");
                    break;
                }
                None => break,
            },
            () = &mut idle => {
                let resume_at = activity.last() + settings.idle_timeout;
                if resume_at > Instant::now() {
                    idle.as_mut().reset(resume_at);
                    continue;
                }
                info!(room = %room_code, player = %player_id, "connection idle; closing");
                break;
            }
            _ = &mut writer => {
                writer_finished = true;
                break;
            }
        }
    }

    // Unregistering closes the outbound queue, which tells the writer to send a close frame.
    state.hub().unregister(&handle);
    if !writer_finished && timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await.is_err() {
        writer.abort();
    }

    info!(room = %room_code, player = %player_id, connection = %handle.id, "player disconnected");
}

/// Process one inbound frame. Returns `false` when the peer asked to close.
///
/// Text frames are decoded and logged; answers travel over HTTP, so nothing here
/// changes room state.
fn handle_frame(handle: &ConnectionHandle, message: Message) -> bool {
    match message {
        Message::Text(text) => {
            match ClientInboundMessage::from_json_str(text.as_str()) {
                Ok(ClientInboundMessage::Answer(answer)) => debug!(
                    room = %handle.room_code,
                    player = %handle.player_id,
                    question = %answer.question_id,
                    "ignoring socket answer; answers are submitted over HTTP"
                ),
                Ok(ClientInboundMessage::Unknown(kind)) => debug!(
                    room = %handle.room_code,
                    player = %handle.player_id,
                    kind = %kind,
                    "ignoring unknown message type"
                ),
                Err(err) => warn!(
                    room = %handle.room_code,
                    player = %handle.player_id,
                    error = %err,
                    "failed to parse socket message"
                ),
            }
            true
        }
        Message::Close(_) => {
            debug!(room = %handle.room_code, player = %handle.player_id, "peer closed the socket");
            false
        }
        // Pings are answered by the websocket layer; pongs only reset the idle timer.
        Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => true,
    }
}

/// Write queued payloads and a ping every `ping_interval`.
///
/// Sends a close frame once the hub closes the queue, and stops on the first failed write.
async fn outbound_pump<S>(
    mut sender: S,
    mut queue: mpsc::Receiver<Message>,
    ping_interval: Duration,
    activity: OutboundActivity,
    handle: ConnectionHandle,
) where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let mut ticker = interval_at(Instant::now() + ping_interval, ping_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let (message, payload) = tokio::select! {
            queued = queue.recv() => match queued {
                Some(message) => (message, true),
                None => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            },
            _ = ticker.tick() => (Message::Ping(Bytes::new()), false),
        };

        if let Err(err) = sender.send(message).await {
            debug!(
                room = %handle.room_code,
                player = %handle.player_id,
                error = %err,
                "websocket write failed"
            );
            break;
        }
        if payload {
            activity.record();
        }
    }
}
