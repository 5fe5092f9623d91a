//! Wire vocabulary shared between the Suzerain decision core and the world
//! service: typed identifiers, entity records, commands, response statuses,
//! observations, journal entries, and the MessagePack envelope.
//!
//! This crate contains no game logic; everything here is a serializable
//! value type.

mod command;
mod entity;
mod ids;
mod journal;
mod observation;
mod status;
mod troops;
pub mod wire;

pub use crate::command::{ActionKind, Command};
pub use crate::entity::{
    ArmyRecord, CharacterRank, CharacterRecord, DetachmentRecord, FiefRecord, SiegeRecord,
    SiegeRole,
};
pub use crate::ids::{
    ArmyId, CharacterId, DetachmentId, FiefId, JournalId, Nationality, PlayerId, RuntimeId,
    SiegeId,
};
pub use crate::journal::{JournalEntry, JournalKind};
pub use crate::observation::{Observation, Provenance, Query, Sighted};
pub use crate::status::{CommandOutcome, StatusCode};
pub use crate::troops::{TroopKind, TroopVector, TROOP_ARITY};
pub use crate::wire::{WireError, WIRE_VERSION};
