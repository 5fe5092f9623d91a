//! Greedy rule policy: an ordered list of single-responsibility
//! condition→command rules. The first rule whose condition holds wins.
//! Deterministic, explainable, no lookahead.

use std::collections::BTreeSet;

use suzerain_protocol::{ActionKind, CharacterRank, Command};
use tracing::debug;

use crate::catalog::CapabilityCatalog;
use crate::config::AgentConfig;
use crate::error::{AgentError, InvariantError};
use crate::feasibility::feasible_actions;
use crate::snapshot::WorldSnapshot;

use super::{recruit_pick, Policy};

struct RuleInputs<'a> {
    snapshot: &'a WorldSnapshot,
    config: &'a AgentConfig,
    feasible: &'a [ActionKind],
}

impl RuleInputs<'_> {
    fn feasible(&self, kind: ActionKind) -> bool {
        self.feasible.contains(&kind)
    }
}

type RuleFn = fn(&RuleInputs<'_>) -> Result<Option<Command>, InvariantError>;

struct Rule {
    name: &'static str,
    build: RuleFn,
}

pub struct RulePolicy {
    rules: Vec<Rule>,
}

impl RulePolicy {
    /// The standard rule order. Survival first, then economy, then war,
    /// then dynasty, then movement.
    pub fn standard() -> Self {
        let rules = vec![
            Rule { name: "respond_ransom", build: respond_ransom },
            Rule { name: "maintain_army", build: maintain_army },
            Rule { name: "disband_overextended", build: disband_overextended },
            Rule { name: "recruit_below_target", build: recruit_below_target },
            Rule { name: "attack_with_odds", build: attack_with_odds },
            Rule { name: "pillage_hostile_fief", build: pillage_hostile_fief },
            Rule { name: "hire_retainer", build: hire_retainer },
            Rule { name: "propose_marriage", build: propose_marriage },
            Rule { name: "advance_on_enemy", build: advance_on_enemy },
        ];
        Self { rules }
    }
}

impl Policy for RulePolicy {
    fn select_action(
        &self,
        snapshot: &WorldSnapshot,
        catalog: &CapabilityCatalog,
        config: &AgentConfig,
        excluded: &BTreeSet<ActionKind>,
    ) -> Result<Option<Command>, AgentError> {
        let feasible = feasible_actions(snapshot, catalog, config, excluded)?;
        let inputs = RuleInputs {
            snapshot,
            config,
            feasible: &feasible,
        };
        for rule in &self.rules {
            if let Some(command) = (rule.build)(&inputs)? {
                debug!(rule = rule.name, ?command, "rule fired");
                return Ok(Some(command));
            }
        }
        debug!("no rule fired");
        Ok(None)
    }
}

// ---- the rules ----

fn respond_ransom(inputs: &RuleInputs<'_>) -> Result<Option<Command>, InvariantError> {
    if !inputs.feasible(ActionKind::RespondRansom) {
        return Ok(None);
    }
    // Pay if the chest can bear it; refuse and sit it out otherwise.
    let accept = inputs.snapshot.war_chest()? > 0;
    Ok(Some(Command::RespondRansom { accept }))
}

fn maintain_army(inputs: &RuleInputs<'_>) -> Result<Option<Command>, InvariantError> {
    if !inputs.feasible(ActionKind::MaintainArmy) {
        return Ok(None);
    }
    let chest = inputs.snapshot.war_chest()?;
    let army = inputs
        .snapshot
        .mine
        .armies
        .values()
        .find(|a| !a.maintained && a.upkeep <= chest);
    Ok(army.map(|a| Command::MaintainArmy { army: a.id }))
}

fn disband_overextended(inputs: &RuleInputs<'_>) -> Result<Option<Command>, InvariantError> {
    if !inputs.feasible(ActionKind::DisbandArmy) {
        return Ok(None);
    }
    if inputs.snapshot.troop_ratio()? <= inputs.config.troop_ratio_max {
        return Ok(None);
    }
    // Shed the smallest army first.
    let smallest = inputs
        .snapshot
        .mine
        .armies
        .values()
        .min_by_key(|a| (a.troops.total(), a.id));
    Ok(smallest.map(|a| Command::DisbandArmy { army: a.id }))
}

fn recruit_below_target(inputs: &RuleInputs<'_>) -> Result<Option<Command>, InvariantError> {
    if !inputs.feasible(ActionKind::Recruit) {
        return Ok(None);
    }
    if inputs.snapshot.troop_ratio()? >= inputs.config.troop_ratio_min {
        return Ok(None);
    }
    let me = inputs.snapshot.me()?;
    let Some(fief) = inputs.snapshot.mine.fiefs.get(&me.location) else {
        return Ok(None);
    };
    Ok(
        recruit_pick(fief.militia, fief.treasury, inputs.config).map(|(kind, count)| {
            Command::Recruit {
                fief: fief.id,
                kind,
                count,
            }
        }),
    )
}

fn attack_with_odds(inputs: &RuleInputs<'_>) -> Result<Option<Command>, InvariantError> {
    if !inputs.feasible(ActionKind::Attack) {
        return Ok(None);
    }
    let me = inputs.snapshot.me()?;
    let Some(army) = inputs.snapshot.my_army()? else {
        return Ok(None);
    };
    let own_value = f64::from(army.troops.value());

    // Weakest hostile army on site, if the odds clear the bar.
    let target = inputs
        .snapshot
        .foreign
        .armies
        .values()
        .filter(|s| {
            s.record.location == me.location
                && inputs.snapshot.relations.is_enemy(s.record.owner)
        })
        .min_by_key(|s| (s.record.troops.value(), s.record.id));
    let Some(target) = target else {
        return Ok(None);
    };

    let enemy_value = f64::from(target.record.troops.value()).max(1.0);
    if own_value / enemy_value < inputs.config.attack_odds_threshold {
        return Ok(None);
    }
    Ok(Some(Command::Attack {
        army: army.id,
        target: target.record.id,
    }))
}

fn pillage_hostile_fief(inputs: &RuleInputs<'_>) -> Result<Option<Command>, InvariantError> {
    if !inputs.feasible(ActionKind::Pillage) {
        return Ok(None);
    }
    let me = inputs.snapshot.me()?;
    let Some(sighted) = inputs.snapshot.foreign.fiefs.get(&me.location) else {
        return Ok(None);
    };
    if !inputs.snapshot.relations.is_enemy(sighted.record.owner) {
        return Ok(None);
    }
    Ok(Some(Command::Pillage {
        fief: sighted.record.id,
    }))
}

fn hire_retainer(inputs: &RuleInputs<'_>) -> Result<Option<Command>, InvariantError> {
    if !inputs.feasible(ActionKind::HireRetainer) {
        return Ok(None);
    }
    if inputs.snapshot.retainer_count() >= usize::from(inputs.config.retainer_target) {
        return Ok(None);
    }
    let me = inputs.snapshot.me()?;
    let candidate = inputs.snapshot.foreign.characters.values().find(|s| {
        s.record.rank == CharacterRank::Retainer
            && s.record.alive
            && s.record.employer.is_none()
            && s.record.location == me.location
            && !inputs.snapshot.tracking.hire_attempted.contains(&s.record.id)
    });
    Ok(candidate.map(|s| Command::HireRetainer {
        character: s.record.id,
    }))
}

fn propose_marriage(inputs: &RuleInputs<'_>) -> Result<Option<Command>, InvariantError> {
    if !inputs.feasible(ActionKind::ProposeMarriage) {
        return Ok(None);
    }
    let candidate = inputs.snapshot.foreign.characters.values().find(|s| {
        s.record.alive
            && s.record.spouse.is_none()
            && s.record.betrothed.is_none()
            && s.record.age >= inputs.config.marriageable_age
            && !inputs.snapshot.tracking.proposed_to.contains(&s.record.id)
    });
    Ok(candidate.map(|s| Command::ProposeMarriage { to: s.record.id }))
}

fn advance_on_enemy(inputs: &RuleInputs<'_>) -> Result<Option<Command>, InvariantError> {
    if !inputs.feasible(ActionKind::Move) {
        return Ok(None);
    }
    let me = inputs.snapshot.me()?;
    // Nearest reachable fief held by a known enemy.
    let destination = inputs
        .snapshot
        .travel_costs
        .iter()
        .filter(|(dest, cost)| {
            **dest != me.location
                && **cost <= me.budget
                && inputs
                    .snapshot
                    .foreign
                    .fiefs
                    .get(dest)
                    .map(|s| inputs.snapshot.relations.is_enemy(s.record.owner))
                    .unwrap_or(false)
        })
        .min_by_key(|(dest, cost)| (**cost, **dest));
    Ok(destination.map(|(dest, _)| Command::Move { to: *dest }))
}

#[cfg(test)]
mod tests {
    use suzerain_protocol::{ArmyId, FiefId, PlayerId, Sighted};

    use crate::snapshot::test_fixtures::{self, small_world, RIVAL};

    use super::*;

    fn select(snapshot: &WorldSnapshot) -> Option<Command> {
        let catalog = CapabilityCatalog::standard();
        let config = AgentConfig::default();
        RulePolicy::standard()
            .select_action(snapshot, &catalog, &config, &BTreeSet::new())
            .unwrap()
    }

    #[test]
    fn maintenance_beats_movement() {
        let mut snapshot = small_world();
        snapshot.relations.mark_enemy(RIVAL);
        snapshot
            .mine
            .armies
            .get_mut(&ArmyId::new(1))
            .unwrap()
            .maintained = false;

        // Both maintain and move are on the table; maintain must win.
        match select(&snapshot) {
            Some(Command::MaintainArmy { army }) => assert_eq!(army, ArmyId::new(1)),
            other => panic!("expected maintain, got {other:?}"),
        }
    }

    #[test]
    fn ransom_response_trumps_everything() {
        let mut snapshot = small_world();
        snapshot.me_mut().unwrap().captor = Some(PlayerId(1));
        snapshot
            .mine
            .armies
            .get_mut(&ArmyId::new(1))
            .unwrap()
            .maintained = false;

        match select(&snapshot) {
            Some(Command::RespondRansom { accept }) => assert!(accept),
            other => panic!("expected ransom response, got {other:?}"),
        }
    }

    #[test]
    fn recruits_when_ratio_below_minimum() {
        let mut snapshot = small_world();
        // Drop army value to zero men: ratio 0 < min 0.8.
        snapshot
            .mine
            .armies
            .get_mut(&ArmyId::new(1))
            .unwrap()
            .troops = suzerain_protocol::TroopVector::EMPTY;

        match select(&snapshot) {
            Some(Command::Recruit { fief, count, .. }) => {
                assert_eq!(fief, FiefId::new(1));
                assert!(count >= 10);
            }
            other => panic!("expected recruit, got {other:?}"),
        }
    }

    #[test]
    fn advances_on_enemy_land_when_economy_is_settled() {
        let mut snapshot = small_world();
        snapshot.relations.mark_enemy(RIVAL);
        // Ratio 1.2 sits between min and max; no economic rule fires.
        match select(&snapshot) {
            Some(Command::Move { to }) => assert_eq!(to, FiefId::new(2)),
            other => panic!("expected advance, got {other:?}"),
        }
    }

    #[test]
    fn attacks_only_with_sufficient_odds() {
        let mut snapshot = small_world();
        snapshot.relations.mark_enemy(RIVAL);

        // Strong enemy on site: 60 men-at-arms each, odds 1.0 < 1.25.
        let enemy = test_fixtures::army(9, RIVAL, 1, 60);
        snapshot
            .foreign
            .armies
            .insert(enemy.id, Sighted::overview(enemy, 1));
        assert!(!matches!(select(&snapshot), Some(Command::Attack { .. })));

        // Weak enemy: odds 2.0, attack fires.
        let weak = test_fixtures::army(9, RIVAL, 1, 30);
        snapshot
            .foreign
            .armies
            .insert(weak.id, Sighted::overview(weak, 1));
        match select(&snapshot) {
            Some(Command::Attack { army, target }) => {
                assert_eq!(army, ArmyId::new(1));
                assert_eq!(target, ArmyId::new(9));
            }
            other => panic!("expected attack, got {other:?}"),
        }
    }

    #[test]
    fn no_rule_yields_none_when_budget_is_gone() {
        let mut snapshot = small_world();
        snapshot.me_mut().unwrap().budget = 0;
        assert_eq!(select(&snapshot), None);
    }
}
