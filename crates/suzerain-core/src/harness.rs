//! In-process scripted world service.
//!
//! Owns a small authoritative campaign and answers the agent's queries with
//! partial views, the way the real service would: own holdings come back
//! authoritative, everyone else's as overview sightings with privileged
//! fields blanked. Combat is resolved with a seeded RNG, so whole seasons
//! replay bit-identically for a given seed. Used by the season binary and
//! the integration tests.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use suzerain_protocol::{
    ArmyId, ArmyRecord, CharacterId, CharacterRank, CharacterRecord, Command, CommandOutcome,
    FiefId, FiefRecord, JournalEntry, JournalId, JournalKind, Nationality, Observation, PlayerId,
    Query, SiegeRole, StatusCode, TroopKind, TroopVector,
};

use crate::agent::WorldService;
use crate::catalog::recruit_price;
use crate::error::ServiceError;

const AGENT: PlayerId = PlayerId(0);
const RIVAL: PlayerId = PlayerId(1);
const HIRE_FEE: i64 = 50;

/// Authoritative campaign state plus the RNG for combat resolution.
pub struct ScriptedWorld {
    season: u32,
    fiefs: BTreeMap<FiefId, FiefRecord>,
    characters: BTreeMap<CharacterId, CharacterRecord>,
    armies: BTreeMap<ArmyId, ArmyRecord>,
    journal: Vec<JournalEntry>,
    /// Symmetric travel costs between fiefs.
    routes: BTreeMap<(FiefId, FiefId), u32>,
    rng: StdRng,
    next_journal: u32,
}

impl ScriptedWorld {
    /// A two-player campaign: the agent holds fief 1, the rival holds
    /// fiefs 2 and 3. The rival has already pillaged our land, so the first
    /// observation carries a hostile journal entry.
    pub fn new(seed: u64) -> Self {
        let mut world = Self {
            season: 1,
            fiefs: BTreeMap::new(),
            characters: BTreeMap::new(),
            armies: BTreeMap::new(),
            journal: Vec::new(),
            routes: BTreeMap::new(),
            rng: StdRng::seed_from_u64(seed),
            next_journal: 1,
        };

        world.add_fief(1, AGENT, 260, 50, 2);
        world.add_fief(2, RIVAL, 180, 40, 2);
        world.add_fief(3, RIVAL, 60, 20, 1);

        world.add_character(1, AGENT, CharacterRank::PlayerLed, 1, Some(1));
        world.add_character(2, RIVAL, CharacterRank::PlayerLed, 2, Some(2));
        // An unemployed retainer loitering on our land, hireable.
        world.add_character(3, RIVAL, CharacterRank::Retainer, 1, None);

        world.add_army(1, AGENT, Some(1), 1, TroopVector::of(TroopKind::MenAtArms, 40), 12);
        world.add_army(2, RIVAL, Some(2), 2, TroopVector::of(TroopKind::MenAtArms, 55), 15);

        world.add_route(1, 2, 4);
        world.add_route(1, 3, 2);
        world.add_route(2, 3, 3);

        // The rivalry that starts the campaign.
        world.fiefs.get_mut(&FiefId::new(1)).unwrap().pillaged_this_season = true;
        world.push_journal(JournalKind::Pillage, RIVAL, Some(AGENT), None, Some(FiefId::new(1)));

        world
    }

    fn add_fief(&mut self, id: u32, owner: PlayerId, treasury: i64, militia: u32, keep: u8) {
        let id = FiefId::new(id);
        self.fiefs.insert(
            id,
            FiefRecord {
                id,
                owner,
                treasury,
                militia,
                keep_level: keep,
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
            },
        );
    }

    fn add_character(
        &mut self,
        id: u32,
        player: PlayerId,
        rank: CharacterRank,
        location: u32,
        commands: Option<u32>,
    ) {
        let id = CharacterId::new(id);
        let location = FiefId::new(location);
        self.characters.insert(
            id,
            CharacterRecord {
                id,
                player,
                rank,
                nationality: Nationality::Aldmark,
                location,
                alive: true,
                budget: 30,
                age: 27,
                leadership: 4,
                employer: None,
                spouse: None,
                betrothed: None,
                captor: None,
                commands: commands.map(ArmyId::new),
                in_keep: false,
            },
        );
        if let Some(fief) = self.fiefs.get_mut(&location) {
            fief.characters_present.push(id);
        }
    }

    fn add_army(
        &mut self,
        id: u32,
        owner: PlayerId,
        commander: Option<u32>,
        location: u32,
        troops: TroopVector,
        upkeep: i64,
    ) {
        let id = ArmyId::new(id);
        let location = FiefId::new(location);
        self.armies.insert(
            id,
            ArmyRecord {
                id,
                owner,
                commander: commander.map(CharacterId::new),
                location,
                troops,
                maintained: true,
                upkeep,
                siege_role: SiegeRole::None,
            },
        );
        if let Some(fief) = self.fiefs.get_mut(&location) {
            fief.armies_present.push(id);
        }
    }

    fn add_route(&mut self, a: u32, b: u32, cost: u32) {
        let a = FiefId::new(a);
        let b = FiefId::new(b);
        self.routes.insert((a, b), cost);
        self.routes.insert((b, a), cost);
    }

    fn push_journal(
        &mut self,
        kind: JournalKind,
        actor: PlayerId,
        victim: Option<PlayerId>,
        character: Option<CharacterId>,
        location: Option<FiefId>,
    ) {
        let id = JournalId::new(self.next_journal);
        self.next_journal += 1;
        self.journal.push(JournalEntry {
            id,
            kind,
            actor,
            victim,
            character,
            location,
            season: self.season,
            read: false,
            replied: false,
        });
    }

    fn character(&self, id: CharacterId) -> Result<&CharacterRecord, ServiceError> {
        self.characters
            .get(&id)
            .ok_or_else(|| ServiceError::Unavailable(format!("unknown character {id:?}")))
    }

    /// Blank fields an overview sighting is not entitled to.
    fn overview_fief(record: &FiefRecord) -> FiefRecord {
        FiefRecord {
            treasury: 0,
            militia: 0,
            ..record.clone()
        }
    }

    fn seasonal_rollover(&mut self) {
        self.season += 1;
        for c in self.characters.values_mut() {
            c.budget = 30;
        }
        for f in self.fiefs.values_mut() {
            f.recruited_this_season = false;
            f.pillaged_this_season = false;
            // Rents come in.
            f.treasury += 30;
        }
    }

    fn ok(command: &Command, cost: Option<u32>) -> CommandOutcome {
        CommandOutcome {
            command: command.clone(),
            status: StatusCode::Ok,
            cost_reported: cost,
        }
    }

    fn fail(command: &Command, status: StatusCode) -> CommandOutcome {
        CommandOutcome {
            command: command.clone(),
            status,
            cost_reported: None,
        }
    }

    fn spend_budget(&mut self, actor: CharacterId, cost: u32) {
        if let Some(c) = self.characters.get_mut(&actor) {
            c.budget = c.budget.saturating_sub(cost);
        }
    }

    // The acting character: the harness serves a single agent.
    fn agent_character(&self) -> CharacterId {
        CharacterId::new(1)
    }
}

impl WorldService for ScriptedWorld {
    fn observe(&mut self, query: &Query) -> Result<Observation, ServiceError> {
        let character = match query {
            Query::Overview { character } => *character,
            Query::JournalSince { .. } => self.agent_character(),
        };
        let me = self.character(character)?.clone();
        let player = me.player;
        let at = me.location;

        let my_fiefs: Vec<_> = self
            .fiefs
            .values()
            .filter(|f| f.owner == player)
            .cloned()
            .collect();
        let my_characters: Vec<_> = self
            .characters
            .values()
            .filter(|c| c.player == player && c.id != character)
            .cloned()
            .collect();
        let my_armies: Vec<_> = self
            .armies
            .values()
            .filter(|a| a.owner == player)
            .cloned()
            .collect();

        let season = self.season;
        let foreign_fiefs: Vec<_> = self
            .fiefs
            .values()
            .filter(|f| f.owner != player)
            .map(|f| suzerain_protocol::Sighted::overview(Self::overview_fief(f), season))
            .collect();
        let foreign_characters: Vec<_> = self
            .characters
            .values()
            .filter(|c| c.player != player)
            .map(|c| suzerain_protocol::Sighted::overview(c.clone(), season))
            .collect();
        let foreign_armies: Vec<_> = self
            .armies
            .values()
            .filter(|a| a.owner != player)
            .map(|a| suzerain_protocol::Sighted::overview(a.clone(), season))
            .collect();

        let travel_costs = self
            .routes
            .iter()
            .filter(|((from, _), _)| *from == at)
            .map(|((_, to), cost)| (*to, *cost))
            .collect();

        Ok(Observation {
            season,
            me,
            my_fiefs,
            my_characters,
            my_armies,
            my_detachments: Vec::new(),
            foreign_fiefs,
            foreign_characters,
            foreign_armies,
            foreign_detachments: Vec::new(),
            sieges: Vec::new(),
            journal: self.journal.clone(),
            travel_costs,
        })
    }

    fn execute(&mut self, command: &Command) -> Result<CommandOutcome, ServiceError> {
        let actor = self.agent_character();
        match command {
            Command::Recruit { fief, kind, count } => {
                let player = self.character(actor)?.player;
                let Some(record) = self.fiefs.get_mut(fief) else {
                    return Ok(Self::fail(command, StatusCode::TargetNotFound));
                };
                if record.owner != player {
                    return Ok(Self::fail(command, StatusCode::Unauthorized));
                }
                if record.recruited_this_season {
                    return Ok(Self::fail(command, StatusCode::AlreadyDoneThisSeason));
                }
                let price = recruit_price(*kind) * i64::from(*count);
                if record.treasury < price || record.militia < *count {
                    return Ok(Self::fail(command, StatusCode::InsufficientFunds));
                }
                record.treasury -= price;
                record.militia -= *count;
                record.recruited_this_season = true;
                let at = *fief;
                if let Some(army) = self
                    .armies
                    .values_mut()
                    .find(|a| a.owner == player && a.location == at)
                {
                    army.troops = army.troops.add(&TroopVector::of(*kind, *count));
                }
                self.spend_budget(actor, 2);
                Ok(Self::ok(command, Some(2)))
            }
            Command::MaintainArmy { army } => {
                let player = self.character(actor)?.player;
                let Some(record) = self.armies.get_mut(army) else {
                    return Ok(Self::fail(command, StatusCode::TargetNotFound));
                };
                if record.owner != player {
                    return Ok(Self::fail(command, StatusCode::Unauthorized));
                }
                let upkeep = record.upkeep;
                let home = FiefId::new(1);
                let fief = self.fiefs.get_mut(&home).expect("home fief");
                if fief.treasury < upkeep {
                    return Ok(Self::fail(command, StatusCode::InsufficientFunds));
                }
                fief.treasury -= upkeep;
                self.armies.get_mut(army).expect("checked above").maintained = true;
                self.spend_budget(actor, 1);
                Ok(Self::ok(command, Some(1)))
            }
            Command::DisbandArmy { army } => {
                let player = self.character(actor)?.player;
                match self.armies.get(army) {
                    None => return Ok(Self::fail(command, StatusCode::TargetNotFound)),
                    Some(a) if a.owner != player => {
                        return Ok(Self::fail(command, StatusCode::Unauthorized))
                    }
                    Some(_) => {}
                }
                let removed = self.armies.remove(army).expect("checked above");
                if let Some(commander) = removed.commander {
                    if let Some(c) = self.characters.get_mut(&commander) {
                        c.commands = None;
                    }
                }
                self.spend_budget(actor, 1);
                Ok(Self::ok(command, Some(1)))
            }
            Command::Move { to } => {
                let from = self.character(actor)?.location;
                let Some(cost) = self.routes.get(&(from, *to)).copied() else {
                    return Ok(Self::fail(command, StatusCode::TargetNotFound));
                };
                if self.character(actor)?.budget < cost {
                    return Ok(Self::fail(command, StatusCode::BudgetExhausted));
                }
                let commanded = self.character(actor)?.commands;
                if let Some(c) = self.characters.get_mut(&actor) {
                    c.location = *to;
                }
                if let Some(army_id) = commanded {
                    if let Some(a) = self.armies.get_mut(&army_id) {
                        a.location = *to;
                    }
                }
                self.spend_budget(actor, cost);
                // Movement reports its exact cost.
                Ok(Self::ok(command, Some(cost)))
            }
            Command::Pillage { fief } => {
                let player = self.character(actor)?.player;
                let Some(record) = self.fiefs.get_mut(fief) else {
                    return Ok(Self::fail(command, StatusCode::TargetNotFound));
                };
                if record.owner == player {
                    return Ok(Self::fail(command, StatusCode::Unauthorized));
                }
                if record.pillaged_this_season {
                    return Ok(Self::fail(command, StatusCode::AlreadyDoneThisSeason));
                }
                // Loot depends on hidden service-side randomness.
                let share = self.rng.gen_range(20..=50);
                let victim = record.owner;
                let loot = record.treasury * share / 100;
                record.treasury -= loot;
                record.pillaged_this_season = true;
                record.unrest = true;
                let loot_to = FiefId::new(1);
                if let Some(home) = self.fiefs.get_mut(&loot_to) {
                    home.treasury += loot;
                }
                self.push_journal(JournalKind::Pillage, AGENT, Some(victim), None, Some(*fief));
                self.spend_budget(actor, 3);
                // Cost deliberately unreported: exercises the ¾ fallback.
                Ok(Self::ok(command, None))
            }
            Command::Attack { army, target } => {
                let (mine_value, mine_owner) = match self.armies.get(army) {
                    None => return Ok(Self::fail(command, StatusCode::TargetNotFound)),
                    Some(a) => (a.troops.value(), a.owner),
                };
                let theirs_value = match self.armies.get(target) {
                    None => return Ok(Self::fail(command, StatusCode::StalePrecondition)),
                    Some(a) => a.troops.value(),
                };
                // Hidden randomness: a swing of ±25% on each side.
                let swing_a = self.rng.gen_range(75..=125);
                let swing_b = self.rng.gen_range(75..=125);
                let ours = u64::from(mine_value) * swing_a;
                let theirs = u64::from(theirs_value) * swing_b;
                let (loser, victim) = if ours >= theirs {
                    (*target, self.armies[target].owner)
                } else {
                    (*army, mine_owner)
                };
                if let Some(a) = self.armies.get_mut(&loser) {
                    a.troops = TroopVector::EMPTY;
                    a.maintained = false;
                }
                self.push_journal(JournalKind::Battle, mine_owner, Some(victim), None, None);
                self.spend_budget(actor, 3);
                Ok(Self::ok(command, Some(3)))
            }
            Command::HireRetainer { character } => {
                match self.characters.get(character) {
                    None => return Ok(Self::fail(command, StatusCode::TargetNotFound)),
                    Some(c) if c.employer.is_some() || c.rank != CharacterRank::Retainer => {
                        return Ok(Self::fail(command, StatusCode::StalePrecondition))
                    }
                    Some(_) => {}
                }
                let home = FiefId::new(1);
                let fee_paid = match self.fiefs.get_mut(&home) {
                    Some(f) if f.treasury >= HIRE_FEE => {
                        f.treasury -= HIRE_FEE;
                        true
                    }
                    _ => false,
                };
                if !fee_paid {
                    return Ok(Self::fail(command, StatusCode::InsufficientFunds));
                }
                let c = self.characters.get_mut(character).expect("checked above");
                c.employer = Some(actor);
                c.player = AGENT;
                self.spend_budget(actor, 2);
                Ok(Self::ok(command, Some(2)))
            }
            Command::EnterKeep => {
                if let Some(c) = self.characters.get_mut(&actor) {
                    c.in_keep = true;
                }
                self.spend_budget(actor, 1);
                Ok(Self::ok(command, Some(1)))
            }
            Command::ExitKeep => {
                if let Some(c) = self.characters.get_mut(&actor) {
                    c.in_keep = false;
                }
                self.spend_budget(actor, 1);
                Ok(Self::ok(command, Some(1)))
            }
            Command::TransferTreasury { from, to, amount } => {
                let player = self.character(actor)?.player;
                let both_ours = self.fiefs.get(from).map(|f| f.owner) == Some(player)
                    && self.fiefs.get(to).map(|f| f.owner) == Some(player);
                if !both_ours {
                    return Ok(Self::fail(command, StatusCode::Unauthorized));
                }
                let moved = {
                    let source = self.fiefs.get_mut(from).expect("checked above");
                    let moved = (*amount).clamp(0, source.treasury);
                    source.treasury -= moved;
                    moved
                };
                self.fiefs.get_mut(to).expect("checked above").treasury += moved;
                self.spend_budget(actor, 1);
                Ok(Self::ok(command, Some(1)))
            }
            Command::EndSeason => {
                self.seasonal_rollover();
                Ok(Self::ok(command, Some(0)))
            }
            // Everything else the scripted campaign never needs.
            _ => Ok(Self::fail(command, StatusCode::NotYetApplicable)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_observation_reports_the_scripted_raid() {
        let mut world = ScriptedWorld::new(7);
        let obs = world
            .observe(&Query::Overview {
                character: CharacterId::new(1),
            })
            .unwrap();
        assert_eq!(obs.me.id, CharacterId::new(1));
        assert_eq!(obs.my_fiefs.len(), 1);
        assert_eq!(obs.foreign_fiefs.len(), 2);
        assert!(obs
            .journal
            .iter()
            .any(|e| e.kind == JournalKind::Pillage && e.victim == Some(AGENT)));
        // Overview sightings hide privileged fields.
        assert!(obs.foreign_fiefs.iter().all(|s| s.record.treasury == 0));
    }

    #[test]
    fn move_reports_exact_cost() {
        let mut world = ScriptedWorld::new(7);
        let outcome = world
            .execute(&Command::Move { to: FiefId::new(3) })
            .unwrap();
        assert_eq!(outcome.status, StatusCode::Ok);
        assert_eq!(outcome.cost_reported, Some(2));
        assert_eq!(
            world.characters[&CharacterId::new(1)].location,
            FiefId::new(3)
        );
        // The commanded army marched along.
        assert_eq!(world.armies[&ArmyId::new(1)].location, FiefId::new(3));
    }

    #[test]
    fn pillage_keeps_cost_unreported() {
        let mut world = ScriptedWorld::new(7);
        world.execute(&Command::Move { to: FiefId::new(3) }).unwrap();
        let outcome = world
            .execute(&Command::Pillage { fief: FiefId::new(3) })
            .unwrap();
        assert_eq!(outcome.status, StatusCode::Ok);
        assert_eq!(outcome.cost_reported, None);
        assert!(world.fiefs[&FiefId::new(3)].pillaged_this_season);
    }

    #[test]
    fn same_seed_same_combat() {
        let run = |seed| {
            let mut world = ScriptedWorld::new(seed);
            world
                .execute(&Command::Attack {
                    army: ArmyId::new(1),
                    target: ArmyId::new(2),
                })
                .unwrap();
            world.armies[&ArmyId::new(1)].troops.total()
        };
        assert_eq!(run(11), run(11));
    }

    #[test]
    fn rollover_resets_budgets_and_flags() {
        let mut world = ScriptedWorld::new(7);
        world.execute(&Command::Move { to: FiefId::new(3) }).unwrap();
        world.execute(&Command::EndSeason).unwrap();
        assert_eq!(world.season, 2);
        assert_eq!(world.characters[&CharacterId::new(1)].budget, 30);
        assert!(!world.fiefs[&FiefId::new(1)].pillaged_this_season);
    }
}
