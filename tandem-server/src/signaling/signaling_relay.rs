use crate::room::{Membership, RoomRegistry};
use crate::signaling::route::Route;
use dashmap::DashMap;
use std::sync::Arc;
use tandem_core::{
    ClientMessage, ConnectionId, Error, ErrorCode, IceServerConfig, Result, RoomId, ServerMessage,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

struct RelayInner {
    connections: DashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>,
    registry: RoomRegistry,
    ice_servers: Vec<IceServerConfig>,
}

/// Forwards signaling frames between live connections.
///
/// Each connection owns an unbounded outbound queue; forwarding pushes onto the
/// destination's queue and never waits on its socket. Frames from one
/// connection are handled in arrival order by that connection's task, which
/// keeps delivery FIFO per directed pair.
#[derive(Clone)]
pub struct SignalingRelay {
    inner: Arc<RelayInner>,
}

impl SignalingRelay {
    pub fn new(registry: RoomRegistry, ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                connections: DashMap::new(),
                registry,
                ice_servers,
            }),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.inner.registry
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    /// Registers a new transport and greets it with its id.
    pub fn connect(&self, tx: mpsc::UnboundedSender<ServerMessage>) -> ConnectionId {
        let connection_id = ConnectionId::new();
        self.inner.connections.insert(connection_id, tx);

        let welcome = ServerMessage::Welcome {
            connection_id,
            ice_servers: self.get_ice_servers(),
        };
        if let Err(e) = self.send_signal(connection_id, welcome) {
            warn!("Failed to greet {}: {}", connection_id.short(), e);
        }

        info!("Connection {} registered", connection_id.short());
        connection_id
    }

    /// Releases everything that references the connection.
    pub fn disconnect(&self, connection_id: &ConnectionId) {
        self.leave_room(connection_id);
        self.inner.connections.remove(connection_id);
        info!("Connection {} released", connection_id.short());
    }

    /// Entry point for raw text frames. Frames that do not parse are dropped.
    pub fn handle_text(&self, from: ConnectionId, text: &str) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(msg) => self.handle(from, msg),
            Err(e) => warn!("Invalid signal frame from {}: {}", from.short(), e),
        }
    }

    pub fn handle(&self, from: ConnectionId, msg: ClientMessage) {
        let kind = msg.kind();

        match Route::of(from, msg) {
            Route::Join { identity, room_id } => self.join_room(from, &identity, &room_id),
            Route::Leave => {
                self.leave_room(&from);
            }
            Route::Direct { to, message } => self.forward(from, to, kind, message),
        }
    }

    /// Queues `msg` on the connection's outbound channel.
    pub fn send_signal(&self, to: ConnectionId, msg: ServerMessage) -> Result<()> {
        let Some(peer) = self.inner.connections.get(&to) else {
            return Err(Error::DeliveryFailed(to));
        };
        peer.send(msg).map_err(|_| Error::DeliveryFailed(to))
    }

    fn join_room(&self, from: ConnectionId, identity: &str, room_id: &str) {
        let outcome = match self.inner.registry.join(from, room_id, identity) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Rejected join from {}: {}", from.short(), e);
                self.reject(from, e);
                return;
            }
        };

        if let Some(previous) = outcome.left_room() {
            self.announce_departure(from, previous);
        }

        let Membership { room, identity } = outcome.membership.clone();
        if !outcome.is_repeat() {
            self.broadcast(
                &room,
                from,
                ServerMessage::UserJoined {
                    identity: identity.clone(),
                    connection_id: from,
                },
            );
        }

        let ack = ServerMessage::JoinRoom {
            identity,
            room_id: room,
        };
        if let Err(e) = self.send_signal(from, ack) {
            warn!("Failed to acknowledge join: {}", e);
        }
    }

    fn leave_room(&self, connection_id: &ConnectionId) -> Option<Membership> {
        let membership = self.inner.registry.leave(connection_id)?;
        self.announce_departure(*connection_id, &membership);
        Some(membership)
    }

    fn announce_departure(&self, connection_id: ConnectionId, membership: &Membership) {
        self.broadcast(
            &membership.room,
            connection_id,
            ServerMessage::UserLeft {
                identity: membership.identity.clone(),
                connection_id,
            },
        );
    }

    fn forward(&self, from: ConnectionId, to: ConnectionId, kind: &str, message: ServerMessage) {
        if to == from {
            let e = Error::InvalidArgument(format!("{kind} addressed to its own sender"));
            warn!("Rejected frame from {}: {}", from.short(), e);
            self.reject(from, e);
            return;
        }

        match self.send_signal(to, message) {
            Ok(()) => debug!("Forwarded {} {} -> {}", kind, from.short(), to.short()),
            Err(e) => warn!("Dropped {} from {}: {}", kind, from.short(), e),
        }
    }

    fn broadcast(&self, room: &RoomId, except: ConnectionId, msg: ServerMessage) {
        for member in self.inner.registry.members_of(room) {
            if member == except {
                continue;
            }
            if let Err(e) = self.send_signal(member, msg.clone()) {
                debug!("Broadcast {} skipped: {}", msg.kind(), e);
            }
        }
    }

    fn reject(&self, to: ConnectionId, error: Error) {
        let msg = ServerMessage::Error {
            code: ErrorCode::InvalidArgument,
            message: error.to_string(),
        };
        if let Err(e) = self.send_signal(to, msg) {
            debug!("Could not report rejection: {}", e);
        }
    }
}
