//! Entity and component ids are partitioned into three ranges:
//!
//! | range | meaning |
//! |---|---|
//! | `1 ..= LAST_REPLICATED_ID` | authoritative, replicated |
//! | `FIRST_UNACKED_ID ..= LAST_UNACKED_ID` | created by a client, waiting for the server to assign an id |
//! | `FIRST_LOCAL_ID ..= u32::MAX` | never replicated |
//!
//! Ids travel on the wire masked with `LAST_REPLICATED_ID`.

pub type EntityId = u32;
pub type ComponentId = u32;

pub const LAST_REPLICATED_ID: u32 = 0x3FFF_FFFF;
pub const FIRST_UNACKED_ID: u32 = 0x4000_0000;
pub const LAST_UNACKED_ID: u32 = 0x7FFF_FFFF;
pub const FIRST_LOCAL_ID: u32 = 0x8000_0000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdKind {
    Replicated,
    Unacked,
    Local,
}

impl IdKind {
    pub fn of(id: u32) -> Self {
        if id >= FIRST_LOCAL_ID {
            IdKind::Local
        } else if id >= FIRST_UNACKED_ID {
            IdKind::Unacked
        } else {
            IdKind::Replicated
        }
    }

    fn bounds(self) -> (u32, u32) {
        match self {
            IdKind::Replicated => (1, LAST_REPLICATED_ID),
            IdKind::Unacked => (FIRST_UNACKED_ID, LAST_UNACKED_ID),
            IdKind::Local => (FIRST_LOCAL_ID, u32::MAX),
        }
    }
}

pub fn is_local_id(id: u32) -> bool {
    IdKind::of(id) == IdKind::Local
}

pub fn is_unacked_id(id: u32) -> bool {
    IdKind::of(id) == IdKind::Unacked
}

/// The id as written on the wire.
pub fn wire_id(id: u32) -> u32 {
    id & LAST_REPLICATED_ID
}

/// Restores the unacked range bit of an id echoed back by the server.
pub fn unacked_id(wire_id: u32) -> u32 {
    (wire_id & LAST_REPLICATED_ID) | FIRST_UNACKED_ID
}

/// Hands out ids from the three ranges. Each range wraps back to its start
/// when exhausted, so callers must skip ids that are still in use.
#[derive(Clone, Debug)]
pub struct UniqueIdGenerator {
    replicated: u32,
    unacked: u32,
    local: u32,
}

impl Default for UniqueIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl UniqueIdGenerator {
    pub fn new() -> Self {
        Self {
            replicated: 0,
            unacked: FIRST_UNACKED_ID - 1,
            local: FIRST_LOCAL_ID - 1,
        }
    }

    pub fn allocate(&mut self, kind: IdKind) -> u32 {
        let (first, last) = kind.bounds();
        let current = match kind {
            IdKind::Replicated => &mut self.replicated,
            IdKind::Unacked => &mut self.unacked,
            IdKind::Local => &mut self.local,
        };
        *current = if *current >= last || *current < first {
            first
        } else {
            *current + 1
        };
        *current
    }
}
