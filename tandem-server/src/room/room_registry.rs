use crate::room::Membership;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tandem_core::{ConnectionId, Identity, Result, RoomId};
use tracing::{debug, info};

/// What a successful `join` changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub membership: Membership,
    /// Membership the connection held before this join, if any.
    pub previous: Option<Membership>,
}

impl JoinOutcome {
    /// `true` when the join repeated the connection's current room and identity.
    pub fn is_repeat(&self) -> bool {
        self.previous.as_ref() == Some(&self.membership)
    }

    /// Room the connection was moved out of.
    pub fn left_room(&self) -> Option<&Membership> {
        self.previous
            .as_ref()
            .filter(|prev| prev.room != self.membership.room)
    }
}

struct RegistryInner {
    rooms: DashMap<RoomId, HashSet<ConnectionId>>,
    members: DashMap<ConnectionId, Membership>,
    identities: DashMap<Identity, ConnectionId>,
}

/// In-memory room membership shared by every connection task.
///
/// Each room's member set is mutated under its map shard lock, so concurrent
/// joins and leaves on one room never lose an update. Operations for a single
/// connection are issued sequentially by that connection's task.
#[derive(Clone)]
pub struct RoomRegistry {
    inner: Arc<RegistryInner>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                rooms: DashMap::new(),
                members: DashMap::new(),
                identities: DashMap::new(),
            }),
        }
    }

    /// Puts `connection` into `room_id`, moving it out of any previous room.
    pub fn join(
        &self,
        connection: ConnectionId,
        room_id: &str,
        identity: &str,
    ) -> Result<JoinOutcome> {
        let room = RoomId::parse(room_id)?;
        let identity = Identity::parse(identity)?;
        let membership = Membership {
            room: room.clone(),
            identity: identity.clone(),
        };

        let previous = self.inner.members.insert(connection, membership.clone());

        if let Some(prev) = &previous {
            if prev.room != room {
                self.remove_from_room(&prev.room, &connection);
            }
            if prev.identity != identity {
                self.release_identity(&prev.identity, &connection);
            }
        }

        self.inner
            .rooms
            .entry(room.clone())
            .or_default()
            .insert(connection);
        self.inner.identities.insert(identity, connection);

        info!(
            "Connection {} joined room '{}' as '{}'",
            connection.short(),
            membership.room,
            membership.identity
        );

        Ok(JoinOutcome {
            membership,
            previous,
        })
    }

    /// Removes `connection` from its room. Returns the membership it held.
    pub fn leave(&self, connection: &ConnectionId) -> Option<Membership> {
        let (_, membership) = self.inner.members.remove(connection)?;

        self.remove_from_room(&membership.room, connection);
        self.release_identity(&membership.identity, connection);

        info!(
            "Connection {} left room '{}'",
            connection.short(),
            membership.room
        );
        Some(membership)
    }

    /// Snapshot of the room's current members.
    pub fn members_of(&self, room: &RoomId) -> HashSet<ConnectionId> {
        self.inner
            .rooms
            .get(room)
            .map(|members| members.value().clone())
            .unwrap_or_default()
    }

    pub fn membership(&self, connection: &ConnectionId) -> Option<Membership> {
        self.inner
            .members
            .get(connection)
            .map(|entry| entry.value().clone())
    }

    /// Connection that most recently joined under `identity`.
    pub fn connection_of(&self, identity: &Identity) -> Option<ConnectionId> {
        self.inner.identities.get(identity).map(|entry| *entry.value())
    }

    pub fn room_count(&self) -> usize {
        self.inner.rooms.len()
    }

    fn remove_from_room(&self, room: &RoomId, connection: &ConnectionId) {
        if let Some(mut members) = self.inner.rooms.get_mut(room) {
            members.remove(connection);
        }
        if self
            .inner
            .rooms
            .remove_if(room, |_, members| members.is_empty())
            .is_some()
        {
            debug!("Room '{}' is empty, dropping it", room);
        }
    }

    fn release_identity(&self, identity: &Identity, connection: &ConnectionId) {
        self.inner
            .identities
            .remove_if(identity, |_, owner| owner == connection);
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
