//! Process-wide registry of live sockets grouped by room code.
//!
//! A single dispatcher task owns the room map and applies register, unregister and
//! broadcast commands in arrival order, so no lock guards the connection sets.

use std::collections::HashMap;

use axum::extract::ws::{Message, Utf8Bytes};
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    oneshot,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dto::ws::BroadcastEnvelope;

/// Identity of one registered socket. Several connections may share a player id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionHandle {
    /// Unique per registration.
    pub id: Uuid,
    /// Room the socket subscribed to.
    pub room_code: String,
    /// Player named in the socket path.
    pub player_id: String,
}

struct Connection {
    handle: ConnectionHandle,
    outbound: mpsc::Sender<Message>,
}

enum HubCommand {
    Register(Connection),
    Unregister(ConnectionHandle),
    Broadcast {
        room_code: String,
        payload: Utf8Bytes,
    },
    RoomSize {
        room_code: String,
        reply: oneshot::Sender<usize>,
    },
}

/// Cloneable handle to the dispatcher task.
#[derive(Clone)]
pub struct Hub {
    commands: mpsc::UnboundedSender<HubCommand>,
}

impl Hub {
    /// Start the dispatcher task. Must be called from within a Tokio runtime.
    pub fn spawn() -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        tokio::spawn(Dispatcher::default().run(receiver));
        Self { commands }
    }

    /// Register a new connection and return its handle with the receiving end of its
    /// outbound queue. Dropping every sender of the queue is how the hub closes it.
    pub fn register(
        &self,
        room_code: &str,
        player_id: &str,
        capacity: usize,
    ) -> (ConnectionHandle, mpsc::Receiver<Message>) {
        let (outbound, queue) = mpsc::channel(capacity.max(1));
        let handle = ConnectionHandle {
            id: Uuid::new_v4(),
            room_code: room_code.to_string(),
            player_id: player_id.to_string(),
        };
        self.send(HubCommand::Register(Connection {
            handle: handle.clone(),
            outbound,
        }));
        (handle, queue)
    }

    /// Remove the connection and close its queue. Unknown handles are ignored.
    pub fn unregister(&self, handle: &ConnectionHandle) {
        self.send(HubCommand::Unregister(handle.clone()));
    }

    /// Queue `payload` for every connection of `room_code`. Never waits on a consumer.
    pub fn broadcast(&self, room_code: &str, payload: impl Into<Utf8Bytes>) {
        self.send(HubCommand::Broadcast {
            room_code: room_code.to_string(),
            payload: payload.into(),
        });
    }

    /// Serialize and fan out an envelope; serialization failures are logged and dropped.
    pub fn broadcast_envelope(&self, room_code: &str, envelope: &BroadcastEnvelope) {
        match envelope.to_json() {
            Ok(payload) => {
                debug!(room = %room_code, kind = envelope.kind(), "broadcasting envelope");
                self.broadcast(room_code, payload);
            }
            Err(err) => {
                warn!(room = %room_code, kind = envelope.kind(), error = %err, "failed to serialize envelope");
            }
        }
    }

    /// Number of connections currently registered for `room_code`.
    ///
    /// The answer reflects every command sent through this handle before the call.
    pub async fn connection_count(&self, room_code: &str) -> usize {
        let (reply, response) = oneshot::channel();
        self.send(HubCommand::RoomSize {
            room_code: room_code.to_string(),
            reply,
        });
        response.await.unwrap_or(0)
    }

    fn send(&self, command: HubCommand) {
        if self.commands.send(command).is_err() {
            warn!("hub dispatcher is gone; dropping command");
        }
    }
}

#[derive(Default)]
struct Dispatcher {
    rooms: HashMap<String, HashMap<Uuid, Connection>>,
}

impl Dispatcher {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<HubCommand>) {
        while let Some(command) = commands.recv().await {
            self.handle(command);
        }
        debug!("hub dispatcher stopped");
    }

    fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::Register(connection) => self.register(connection),
            HubCommand::Unregister(handle) => self.unregister(&handle),
            HubCommand::Broadcast { room_code, payload } => self.broadcast(&room_code, payload),
            HubCommand::RoomSize { room_code, reply } => {
                let _ = reply.send(self.rooms.get(&room_code).map_or(0, HashMap::len));
            }
        }
    }

    fn register(&mut self, connection: Connection) {
        let handle = connection.handle.clone();
        let room = self.rooms.entry(handle.room_code.clone()).or_default();
        room.insert(handle.id, connection);
        info!(
            room = %handle.room_code,
            player = %handle.player_id,
            connections = room.len(),
            "connection registered"
        );
    }

    fn unregister(&mut self, handle: &ConnectionHandle) {
        let Some(room) = self.rooms.get_mut(&handle.room_code) else {
            return;
        };
        // Dropping the connection drops its sender, which closes the outbound queue.
        if room.remove(&handle.id).is_some() {
            info!(room = %handle.room_code, player = %handle.player_id, "connection unregistered");
        }
        if room.is_empty() {
            self.rooms.remove(&handle.room_code);
        }
    }

    fn broadcast(&mut self, room_code: &str, payload: Utf8Bytes) {
        let Some(room) = self.rooms.get_mut(room_code) else {
            return;
        };

        room.retain(|_, connection| {
            match connection.outbound.try_send(Message::Text(payload.clone())) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        room = %room_code,
                        player = %connection.handle.player_id,
                        "outbound queue full; dropping slow connection"
                    );
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(room = %room_code, player = %connection.handle.player_id, "outbound queue closed");
                    false
                }
            }
        });

        if room.is_empty() {
            self.rooms.remove(room_code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(room_code: &str, player_id: &str, capacity: usize) -> (Connection, mpsc::Receiver<Message>) {
        let (outbound, queue) = mpsc::channel(capacity);
        let connection = Connection {
            handle: ConnectionHandle {
                id: Uuid::new_v4(),
                room_code: room_code.into(),
                player_id: player_id.into(),
            },
            outbound,
        };
        (connection, queue)
    }

    fn text(message: Option<Message>) -> String {
        match message {
            Some(Message::Text(text)) => text.as_str().to_string(),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[test]
    fn broadcast_to_unknown_room_is_a_no_op() {
        let mut dispatcher = Dispatcher::default();
        dispatcher.handle(HubCommand::Broadcast {
            room_code: "NOBODY".into(),
            payload: "hello".into(),
        });
        assert!(dispatcher.rooms.is_empty());
    }

    #[test]
    fn duplicate_player_connections_are_both_kept() {
        let mut dispatcher = Dispatcher::default();
        let (first, mut first_queue) = connection("ABC123", "alice", 4);
        let (second, mut second_queue) = connection("ABC123", "alice", 4);
        dispatcher.handle(HubCommand::Register(first));
        dispatcher.handle(HubCommand::Register(second));

        dispatcher.handle(HubCommand::Broadcast {
            room_code: "ABC123".into(),
            payload: "hi".into(),
        });

        assert_eq!(dispatcher.rooms["ABC123"].len(), 2);
        assert_eq!(text(first_queue.try_recv().ok()), "hi");
        assert_eq!(text(second_queue.try_recv().ok()), "hi");
    }

    #[test]
    fn broadcast_only_reaches_the_target_room() {
        let mut dispatcher = Dispatcher::default();
        let (inside, mut inside_queue) = connection("ABC123", "alice", 4);
        let (outside, mut outside_queue) = connection("XYZ789", "bob", 4);
        dispatcher.handle(HubCommand::Register(inside));
        dispatcher.handle(HubCommand::Register(outside));

        dispatcher.handle(HubCommand::Broadcast {
            room_code: "ABC123".into(),
            payload: "only you".into(),
        });

        assert_eq!(text(inside_queue.try_recv().ok()), "only you");
        assert!(outside_queue.try_recv().is_err());
    }

    #[test]
    fn saturated_connection_is_dropped_without_affecting_others() {
        let mut dispatcher = Dispatcher::default();
        let (slow, mut slow_queue) = connection("ABC123", "slow", 1);
        let (fast, mut fast_queue) = connection("ABC123", "fast", 8);
        let slow_id = slow.handle.id;
        dispatcher.handle(HubCommand::Register(slow));
        dispatcher.handle(HubCommand::Register(fast));

        for payload in ["one", "two", "three"] {
            dispatcher.handle(HubCommand::Broadcast {
                room_code: "ABC123".into(),
                payload: payload.into(),
            });
        }

        let room = &dispatcher.rooms["ABC123"];
        assert_eq!(room.len(), 1);
        assert!(!room.contains_key(&slow_id));

        // The slow consumer keeps what was already queued, then sees its queue closed.
        assert_eq!(text(slow_queue.try_recv().ok()), "one");
        assert!(matches!(
            slow_queue.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));

        for expected in ["one", "two", "three"] {
            assert_eq!(text(fast_queue.try_recv().ok()), expected);
        }
    }

    #[test]
    fn last_unregister_removes_the_room_entry_and_closes_the_queue() {
        let mut dispatcher = Dispatcher::default();
        let (only, mut queue) = connection("ABC123", "alice", 4);
        let handle = only.handle.clone();
        dispatcher.handle(HubCommand::Register(only));

        dispatcher.handle(HubCommand::Unregister(handle.clone()));
        assert!(dispatcher.rooms.is_empty());
        assert!(matches!(
            queue.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));

        // A second unregister for the same handle is harmless.
        dispatcher.handle(HubCommand::Unregister(handle));
    }

    #[test]
    fn closed_queue_is_pruned_on_broadcast() {
        let mut dispatcher = Dispatcher::default();
        let (gone, queue) = connection("ABC123", "alice", 4);
        dispatcher.handle(HubCommand::Register(gone));
        drop(queue);

        dispatcher.handle(HubCommand::Broadcast {
            room_code: "ABC123".into(),
            payload: "anyone?".into(),
        });
        assert!(dispatcher.rooms.is_empty());
    }

    #[tokio::test]
    async fn hub_handle_linearizes_commands() {
        let hub = Hub::spawn();
        assert_eq!(hub.connection_count("ABC123").await, 0);

        let (alice, mut alice_queue) = hub.register("ABC123", "alice", 8);
        let (_bob, mut bob_queue) = hub.register("ABC123", "bob", 8);
        assert_eq!(hub.connection_count("ABC123").await, 2);

        hub.broadcast_envelope("ABC123", &BroadcastEnvelope::GameStarted);
        assert_eq!(text(alice_queue.recv().await), r#"{"type":"game-started"}"#);
        assert_eq!(text(bob_queue.recv().await), r#"{"type":"game-started"}"#);

        hub.unregister(&alice);
        assert_eq!(hub.connection_count("ABC123").await, 1);
        assert!(alice_queue.recv().await.is_none());
    }
}
