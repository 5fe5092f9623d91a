//! The reconciled, partial-knowledge view of the world.
//!
//! A snapshot is split into two partitions: `mine` holds authoritative
//! records for everything the agent controls, `foreign` is a cache of
//! possibly-stale sightings of everyone else. Every entity id resolves into
//! exactly one partition at a time. All containers are owned and ordered
//! (BTree maps/sets), so `clone()` yields a fully independent snapshot and
//! iteration order is stable across runs.

mod reconcile;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use suzerain_protocol::{
    ArmyId, ArmyRecord, CharacterId, CharacterRecord, DetachmentId, DetachmentRecord, FiefId,
    FiefRecord, Observation, PlayerId, Sighted, SiegeId, SiegeRecord,
};

use crate::error::InvariantError;

/// Authoritative holdings of the controlled player.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Holdings {
    pub fiefs: BTreeMap<FiefId, FiefRecord>,
    pub characters: BTreeMap<CharacterId, CharacterRecord>,
    pub armies: BTreeMap<ArmyId, ArmyRecord>,
    pub detachments: BTreeMap<DetachmentId, DetachmentRecord>,
}

/// Possibly-stale sightings of entities the agent does not control. Each
/// entry carries provenance (overview vs spied) and the season it was seen.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ForeignCache {
    pub fiefs: BTreeMap<FiefId, Sighted<FiefRecord>>,
    pub characters: BTreeMap<CharacterId, Sighted<CharacterRecord>>,
    pub armies: BTreeMap<ArmyId, Sighted<ArmyRecord>>,
    pub detachments: BTreeMap<DetachmentId, Sighted<DetachmentRecord>>,
}

/// Ally/enemy classification of other players. Persists across
/// reconciliations; journal digestion is what moves players between sets.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Relations {
    pub allies: BTreeSet<PlayerId>,
    pub enemies: BTreeSet<PlayerId>,
}

impl Relations {
    pub fn mark_enemy(&mut self, player: PlayerId) {
        self.allies.remove(&player);
        self.enemies.insert(player);
    }

    pub fn mark_ally(&mut self, player: PlayerId) {
        self.enemies.remove(&player);
        self.allies.insert(player);
    }

    pub fn is_ally(&self, player: PlayerId) -> bool {
        self.allies.contains(&player)
    }

    pub fn is_enemy(&self, player: PlayerId) -> bool {
        self.enemies.contains(&player)
    }
}

/// "Already attempted this season" tracking. Cleared on season rollover.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SeasonTracking {
    /// Characters already sent a marriage proposal this season.
    pub proposed_to: BTreeSet<CharacterId>,
    /// Characters already approached for hire this season.
    pub hire_attempted: BTreeSet<CharacterId>,
    /// Journal entries already digested (by id raw value).
    pub journal_seen: BTreeSet<u32>,
}

impl SeasonTracking {
    fn clear(&mut self) {
        self.proposed_to.clear();
        self.hire_attempted.clear();
        // journal_seen survives rollover: old entries stay digested.
    }
}

/// The agent's point-in-time model of the world.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WorldSnapshot {
    pub season: u32,
    pub player: PlayerId,
    /// The controlled (player-led) character.
    pub me: CharacterId,
    /// Fief the dynasty considers home; treasury transfers anchor here.
    pub home: FiefId,
    pub mine: Holdings,
    pub foreign: ForeignCache,
    /// Sieges are reported symmetrically; kept outside the partitions.
    pub sieges: BTreeMap<SiegeId, SiegeRecord>,
    pub relations: Relations,
    pub tracking: SeasonTracking,
    /// Travel cost from the controlled character's fief per destination.
    pub travel_costs: BTreeMap<FiefId, u32>,
}

impl WorldSnapshot {
    /// Build the first snapshot of a campaign from an initial observation.
    pub fn from_observation(
        player: PlayerId,
        obs: &Observation,
    ) -> Result<WorldSnapshot, InvariantError> {
        let me = obs.me.id;
        let home = obs
            .my_fiefs
            .first()
            .map(|f| f.id)
            .ok_or(InvariantError::MissingFief(obs.me.location))?;

        let empty = WorldSnapshot {
            season: obs.season,
            player,
            me,
            home,
            mine: Holdings::default(),
            foreign: ForeignCache::default(),
            sieges: BTreeMap::new(),
            relations: Relations::default(),
            tracking: SeasonTracking::default(),
            travel_costs: BTreeMap::new(),
        };
        empty.reconcile(obs)
    }

    // ---- partition-aware lookups ----

    /// The controlled character. Its absence is a reconciliation bug.
    pub fn me(&self) -> Result<&CharacterRecord, InvariantError> {
        self.mine
            .characters
            .get(&self.me)
            .ok_or(InvariantError::MissingSelf(self.me))
    }

    pub fn me_mut(&mut self) -> Result<&mut CharacterRecord, InvariantError> {
        self.mine
            .characters
            .get_mut(&self.me)
            .ok_or(InvariantError::MissingSelf(self.me))
    }

    /// Resolve a fief across both partitions, `mine` first.
    pub fn fief(&self, id: FiefId) -> Option<&FiefRecord> {
        self.mine
            .fiefs
            .get(&id)
            .or_else(|| self.foreign.fiefs.get(&id).map(|s| &s.record))
    }

    pub fn character(&self, id: CharacterId) -> Option<&CharacterRecord> {
        self.mine
            .characters
            .get(&id)
            .or_else(|| self.foreign.characters.get(&id).map(|s| &s.record))
    }

    pub fn army(&self, id: ArmyId) -> Option<&ArmyRecord> {
        self.mine
            .armies
            .get(&id)
            .or_else(|| self.foreign.armies.get(&id).map(|s| &s.record))
    }

    pub fn detachment(&self, id: DetachmentId) -> Option<&DetachmentRecord> {
        self.mine
            .detachments
            .get(&id)
            .or_else(|| self.foreign.detachments.get(&id).map(|s| &s.record))
    }

    pub fn siege(&self, id: SiegeId) -> Result<&SiegeRecord, InvariantError> {
        self.sieges.get(&id).ok_or(InvariantError::MissingSiege(id))
    }

    /// The fief the controlled character currently occupies. Invariants
    /// guarantee it is known; a miss is fatal, not recoverable.
    pub fn my_fief(&self) -> Result<&FiefRecord, InvariantError> {
        let location = self.me()?.location;
        self.fief(location)
            .ok_or(InvariantError::MissingFief(location))
    }

    /// The dynasty's home fief.
    pub fn home_fief(&self) -> Result<&FiefRecord, InvariantError> {
        self.mine
            .fiefs
            .get(&self.home)
            .ok_or(InvariantError::MissingFief(self.home))
    }

    /// Largest owned army by summed troop count; ties break toward the
    /// first-encountered (lowest id, since iteration is ordered).
    pub fn largest_army(&self) -> Option<&ArmyRecord> {
        let mut best: Option<&ArmyRecord> = None;
        for army in self.mine.armies.values() {
            let better = match best {
                None => true,
                Some(b) => army.troops.total() > b.troops.total(),
            };
            if better {
                best = Some(army);
            }
        }
        best
    }

    /// The army commanded by the controlled character, if any.
    pub fn my_army(&self) -> Result<Option<&ArmyRecord>, InvariantError> {
        match self.me()?.commands {
            None => Ok(None),
            Some(id) => {
                let army = self
                    .mine
                    .armies
                    .get(&id)
                    .ok_or(InvariantError::MissingArmy(id))?;
                Ok(Some(army))
            }
        }
    }

    // ---- derived quantities ----

    /// Treasury of the home fief: what policies treat as spendable money.
    pub fn war_chest(&self) -> Result<i64, InvariantError> {
        Ok(self.home_fief()?.treasury)
    }

    /// Combat value of all maintained owned armies.
    pub fn committed_troop_value(&self) -> u32 {
        self.mine
            .armies
            .values()
            .filter(|a| a.maintained)
            .map(|a| a.troops.value())
            .sum()
    }

    /// Ratio of committed troop value to war chest. Infinite treasury
    /// shortage (treasury <= 0) maps to `f64::INFINITY`.
    pub fn troop_ratio(&self) -> Result<f64, InvariantError> {
        let chest = self.war_chest()?;
        let value = f64::from(self.committed_troop_value());
        if chest <= 0 {
            Ok(if value == 0.0 { 0.0 } else { f64::INFINITY })
        } else {
            Ok(value / chest as f64)
        }
    }

    /// Hired retainers still alive.
    pub fn retainer_count(&self) -> usize {
        self.mine
            .characters
            .values()
            .filter(|c| c.rank == suzerain_protocol::CharacterRank::Retainer && c.alive)
            .count()
    }

    /// Check the cross-link between a character's `commands` field and the
    /// army's `commander` field. Used by reconciliation tests.
    pub fn check_command_links(&self) -> Result<(), InvariantError> {
        for army in self.mine.armies.values() {
            if let Some(commander) = army.commander {
                if let Some(character) = self.mine.characters.get(&commander) {
                    if character.commands != Some(army.id) {
                        return Err(InvariantError::CommanderLinkBroken {
                            army: army.id,
                            character: commander,
                            commands: character.commands,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    //! Hand-built snapshots shared by the unit tests of several modules.

    use suzerain_protocol::{
        ArmyId, ArmyRecord, CharacterId, CharacterRank, CharacterRecord, FiefId, FiefRecord,
        Nationality, PlayerId, SiegeRole, TroopKind, TroopVector,
    };

    use super::*;

    pub const ME: PlayerId = PlayerId(0);
    pub const RIVAL: PlayerId = PlayerId(1);

    pub fn fief(id: u32, owner: PlayerId, treasury: i64) -> FiefRecord {
        FiefRecord {
            id: FiefId::new(id),
            owner,
            treasury,
            militia: 40,
            keep_level: 1,
            unrest: false,
            siege: None,
            characters_present: Vec::new(),
            armies_present: Vec::new(),
            barred_characters: Vec::new(),
            barred_nationalities: Vec::new(),
            bailiff: None,
            ancestral_owner: None,
            recruited_this_season: false,
            pillaged_this_season: false,
        }
    }

    pub fn character(id: u32, player: PlayerId, location: u32) -> CharacterRecord {
        CharacterRecord {
            id: CharacterId::new(id),
            player,
            rank: CharacterRank::PlayerLed,
            nationality: Nationality::Aldmark,
            location: FiefId::new(location),
            alive: true,
            budget: 30,
            age: 25,
            leadership: 3,
            employer: None,
            spouse: None,
            betrothed: None,
            captor: None,
            commands: None,
            in_keep: false,
        }
    }

    pub fn army(id: u32, owner: PlayerId, location: u32, men: u32) -> ArmyRecord {
        ArmyRecord {
            id: ArmyId::new(id),
            owner,
            commander: None,
            location: FiefId::new(location),
            troops: TroopVector::of(TroopKind::MenAtArms, men),
            maintained: true,
            upkeep: 10,
            siege_role: SiegeRole::None,
        }
    }

    /// One controlled character at home fief 1 with an army, rival fief 2.
    pub fn small_world() -> WorldSnapshot {
        let mut snapshot = WorldSnapshot {
            season: 1,
            player: ME,
            me: CharacterId::new(1),
            home: FiefId::new(1),
            mine: Holdings::default(),
            foreign: ForeignCache::default(),
            sieges: BTreeMap::new(),
            relations: Relations::default(),
            tracking: SeasonTracking::default(),
            travel_costs: BTreeMap::new(),
        };

        let mut home = fief(1, ME, 200);
        home.characters_present.push(CharacterId::new(1));
        home.armies_present.push(ArmyId::new(1));
        snapshot.mine.fiefs.insert(home.id, home);

        let mut lead = character(1, ME, 1);
        lead.commands = Some(ArmyId::new(1));
        snapshot.mine.characters.insert(lead.id, lead);

        let mut host = army(1, ME, 1, 60);
        host.commander = Some(CharacterId::new(1));
        snapshot.mine.armies.insert(host.id, host);

        let rival_fief = fief(2, RIVAL, 0);
        snapshot
            .foreign
            .fiefs
            .insert(rival_fief.id, Sighted::overview(rival_fief, 1));

        snapshot.travel_costs.insert(FiefId::new(2), 4);
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use suzerain_protocol::TroopKind;

    use super::test_fixtures::*;
    use super::*;

    #[test]
    fn lookups_prefer_mine_partition() {
        let snapshot = small_world();
        assert_eq!(snapshot.fief(FiefId::new(1)).unwrap().owner, ME);
        assert_eq!(snapshot.fief(FiefId::new(2)).unwrap().owner, RIVAL);
        assert!(snapshot.fief(FiefId::new(99)).is_none());
    }

    #[test]
    fn my_fief_miss_is_invariant_error() {
        let mut snapshot = small_world();
        snapshot.mine.fiefs.clear();
        assert!(matches!(
            snapshot.my_fief(),
            Err(InvariantError::MissingFief(_))
        ));
    }

    #[test]
    fn largest_army_breaks_ties_by_first_encounter() {
        let mut snapshot = small_world();
        snapshot.mine.armies.insert(ArmyId::new(2), army(2, ME, 1, 60));
        // Same troop count: the lower id wins.
        assert_eq!(snapshot.largest_army().unwrap().id, ArmyId::new(1));

        snapshot.mine.armies.insert(ArmyId::new(3), army(3, ME, 1, 80));
        assert_eq!(snapshot.largest_army().unwrap().id, ArmyId::new(3));
    }

    #[test]
    fn deep_copy_is_independent() {
        let source = small_world();
        let mut copy = source.clone();

        copy.mine.fiefs.get_mut(&FiefId::new(1)).unwrap().treasury = -999;
        copy.me_mut().unwrap().budget = 0;
        copy.travel_costs.insert(FiefId::new(7), 1);
        if let Some(a) = copy.mine.armies.get_mut(&ArmyId::new(1)) {
            a.troops = a.troops.add(&suzerain_protocol::TroopVector::of(TroopKind::Knights, 5));
        }

        // Source untouched on every mutated path.
        assert_eq!(source.mine.fiefs[&FiefId::new(1)].treasury, 200);
        assert_eq!(source.me().unwrap().budget, 30);
        assert!(!source.travel_costs.contains_key(&FiefId::new(7)));
        assert_eq!(source.mine.armies[&ArmyId::new(1)].troops.count(TroopKind::Knights), 0);
    }

    #[test]
    fn command_links_checked_both_ways() {
        let mut snapshot = small_world();
        snapshot
            .mine
            .characters
            .get_mut(&CharacterId::new(1))
            .unwrap()
            .commands = None;
        assert!(matches!(
            snapshot.check_command_links(),
            Err(InvariantError::CommanderLinkBroken { .. })
        ));
    }

    #[test]
    fn troop_ratio_uses_maintained_value_only() {
        let mut snapshot = small_world();
        // 60 men-at-arms at weight 4 = 240 value over 200 treasury.
        assert!((snapshot.troop_ratio().unwrap() - 1.2).abs() < 1e-9);

        snapshot
            .mine
            .armies
            .get_mut(&ArmyId::new(1))
            .unwrap()
            .maintained = false;
        assert_eq!(snapshot.troop_ratio().unwrap(), 0.0);
    }
}
