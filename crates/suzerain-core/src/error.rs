use suzerain_protocol::{
    ActionKind, ArmyId, CharacterId, DetachmentId, FiefId, SiegeId, TroopVector,
};
use thiserror::Error;

/// A snapshot invariant was violated. These indicate a reconciliation bug,
/// never bad input from the service, and abort the decision cycle.
#[derive(Debug, Error)]
pub enum InvariantError {
    #[error("controlled character {0:?} missing from snapshot")]
    MissingSelf(CharacterId),
    #[error("fief {0:?} expected in snapshot but not found")]
    MissingFief(FiefId),
    #[error("character {0:?} expected in snapshot but not found")]
    MissingCharacter(CharacterId),
    #[error("army {0:?} expected in snapshot but not found")]
    MissingArmy(ArmyId),
    #[error("siege {0:?} expected in snapshot but not found")]
    MissingSiege(SiegeId),
    #[error("detachment {0:?} expected in snapshot but not found")]
    MissingDetachment(DetachmentId),
    #[error("army {army:?} commander link points at {character:?} but the character commands {commands:?}")]
    CommanderLinkBroken {
        army: ArmyId,
        character: CharacterId,
        commands: Option<ArmyId>,
    },
    #[error("troop vector {0:?} cannot cover requested split")]
    TroopSplitUnderflow(TroopVector),
}

/// The capability catalog was asked about an unregistered action kind.
/// A programming error: the registry must cover every kind it is queried for.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("action kind {0:?} not registered in capability catalog")]
    UnknownAction(ActionKind),
}

/// Failure talking to the world service itself (as opposed to a domain
/// failure the service reports through a status code).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("wire error: {0}")]
    Wire(#[from] suzerain_protocol::WireError),
    #[error("world service unavailable: {0}")]
    Unavailable(String),
}

/// Top-level error of the turn loop.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Invariant(#[from] InvariantError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}
