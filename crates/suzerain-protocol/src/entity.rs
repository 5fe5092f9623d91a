use serde::{Deserialize, Serialize};

use crate::{
    ArmyId, CharacterId, DetachmentId, FiefId, Nationality, PlayerId, SiegeId, TroopVector,
};

/// A fief as the service reports it. Fields beyond the public ones are only
/// populated for the owning player (treasury, militia) or a successful spy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FiefRecord {
    pub id: FiefId,
    pub owner: PlayerId,
    #[serde(default)]
    pub treasury: i64,
    #[serde(default)]
    pub militia: u32,
    pub keep_level: u8,
    #[serde(default)]
    pub unrest: bool,
    #[serde(default)]
    pub siege: Option<SiegeId>,
    #[serde(default)]
    pub characters_present: Vec<CharacterId>,
    #[serde(default)]
    pub armies_present: Vec<ArmyId>,
    #[serde(default)]
    pub barred_characters: Vec<CharacterId>,
    #[serde(default)]
    pub barred_nationalities: Vec<Nationality>,
    #[serde(default)]
    pub bailiff: Option<CharacterId>,
    #[serde(default)]
    pub ancestral_owner: Option<PlayerId>,
    #[serde(default)]
    pub recruited_this_season: bool,
    #[serde(default)]
    pub pillaged_this_season: bool,
}

/// Player-led character or hired retainer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterRank {
    PlayerLed,
    Retainer,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub id: CharacterId,
    pub player: PlayerId,
    pub rank: CharacterRank,
    pub nationality: Nationality,
    pub location: FiefId,
    pub alive: bool,
    /// Remaining season time budget; authoritative only for own characters.
    #[serde(default)]
    pub budget: u32,
    pub age: u8,
    pub leadership: u8,
    #[serde(default)]
    pub employer: Option<CharacterId>,
    #[serde(default)]
    pub spouse: Option<CharacterId>,
    #[serde(default)]
    pub betrothed: Option<CharacterId>,
    #[serde(default)]
    pub captor: Option<PlayerId>,
    #[serde(default)]
    pub commands: Option<ArmyId>,
    #[serde(default)]
    pub in_keep: bool,
}

/// Role an army plays in a siege, if any.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiegeRole {
    #[default]
    None,
    Besieging,
    Besieged,
    Garrison,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArmyRecord {
    pub id: ArmyId,
    pub owner: PlayerId,
    #[serde(default)]
    pub commander: Option<CharacterId>,
    pub location: FiefId,
    pub troops: TroopVector,
    pub maintained: bool,
    pub upkeep: i64,
    #[serde(default)]
    pub siege_role: SiegeRole,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SiegeRecord {
    pub id: SiegeId,
    pub besieger: PlayerId,
    pub defender: PlayerId,
    pub besieging_army: ArmyId,
    pub garrison: TroopVector,
    #[serde(default)]
    pub relief_army: Option<ArmyId>,
    pub fief: FiefId,
    pub keep_level: u8,
    pub seasons_elapsed: u8,
    pub seasons_remaining: u8,
}

/// Troops left behind by one character for collection by another.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetachmentRecord {
    pub id: DetachmentId,
    pub army: ArmyId,
    pub recipient: CharacterId,
    pub troops: TroopVector,
    pub season_created: u32,
}
