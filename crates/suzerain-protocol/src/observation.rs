use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    ArmyRecord, CharacterId, CharacterRecord, DetachmentRecord, FiefId, FiefRecord, JournalEntry,
    SiegeRecord,
};

/// Read queries the agent can pose to the world service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Query {
    /// Everything the acting character can currently see, plus own holdings.
    Overview { character: CharacterId },
    /// Journal entries newer than the given season.
    JournalSince { season: u32 },
}

/// How a foreign record was obtained. Spied records carry privileged fields
/// (treasury, militia) that overview records omit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Overview,
    Spied,
}

/// A foreign record plus the provenance needed to judge its staleness.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sighted<T> {
    pub record: T,
    pub provenance: Provenance,
    pub season: u32,
}

impl<T> Sighted<T> {
    pub fn overview(record: T, season: u32) -> Self {
        Self {
            record,
            provenance: Provenance::Overview,
            season,
        }
    }

    pub fn spied(record: T, season: u32) -> Self {
        Self {
            record,
            provenance: Provenance::Spied,
            season,
        }
    }
}

/// One complete observation: the fresh data a reconciliation cycle merges.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub season: u32,
    /// The acting character, authoritative.
    pub me: CharacterRecord,

    // Own holdings, authoritative.
    pub my_fiefs: Vec<FiefRecord>,
    pub my_characters: Vec<CharacterRecord>,
    pub my_armies: Vec<ArmyRecord>,
    #[serde(default)]
    pub my_detachments: Vec<DetachmentRecord>,

    // Foreign sightings, possibly partial.
    #[serde(default)]
    pub foreign_fiefs: Vec<Sighted<FiefRecord>>,
    #[serde(default)]
    pub foreign_characters: Vec<Sighted<CharacterRecord>>,
    #[serde(default)]
    pub foreign_armies: Vec<Sighted<ArmyRecord>>,
    #[serde(default)]
    pub foreign_detachments: Vec<Sighted<DetachmentRecord>>,
    #[serde(default)]
    pub sieges: Vec<SiegeRecord>,

    #[serde(default)]
    pub journal: Vec<JournalEntry>,

    /// Travel cost from the acting character's fief to each reachable fief.
    #[serde(default)]
    pub travel_costs: HashMap<FiefId, u32>,
}
