use serde::{Deserialize, Serialize};

use crate::{CharacterId, FiefId, JournalId, PlayerId};

/// Event category of a journal entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalKind {
    Pillage,
    SiegeLaid,
    SiegeLifted,
    Battle,
    RansomDemand,
    RansomPaid,
    MarriageProposal,
    Marriage,
    Knighting,
    Death,
    FiefGranted,
}

/// Immutable event record delivered with overview observations. The agent
/// uses these to detect newly-hostile or newly-friendly actors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: JournalId,
    pub kind: JournalKind,
    /// Player responsible for the event.
    pub actor: PlayerId,
    /// Player on the receiving end, if any.
    #[serde(default)]
    pub victim: Option<PlayerId>,
    #[serde(default)]
    pub character: Option<CharacterId>,
    #[serde(default)]
    pub location: Option<FiefId>,
    pub season: u32,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub replied: bool,
}
