use tandem_core::{Identity, RoomId};

/// A connection's place in the registry: which room, under which identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub room: RoomId,
    pub identity: Identity,
}
