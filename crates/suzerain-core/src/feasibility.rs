//! Feasibility engine: which action kinds are currently legal and
//! affordable.
//!
//! Each registered kind's predicate conjunction is evaluated against the
//! snapshot, then the universal budget gate (remaining budget must cover the
//! catalog maximum), then the per-cycle exclusion set. Captivity overrides
//! everything: a captive can respond to the ransom demand and nothing else.
//!
//! Output order follows catalog registration order. Ordering carries no
//! meaning; policies do their own prioritization.

use std::collections::BTreeSet;

use suzerain_protocol::{ActionKind, CharacterRank, TroopKind};

use crate::catalog::{recruit_price, CapabilityCatalog};
use crate::config::AgentConfig;
use crate::error::{AgentError, InvariantError};
use crate::snapshot::WorldSnapshot;

/// Enumerate the feasible action kinds for the controlled character.
pub fn feasible_actions(
    snapshot: &WorldSnapshot,
    catalog: &CapabilityCatalog,
    config: &AgentConfig,
    excluded: &BTreeSet<ActionKind>,
) -> Result<Vec<ActionKind>, AgentError> {
    let me = snapshot.me()?;

    // Captivity override: the ransom response is the only move left.
    if me.captor.is_some() {
        let traits = catalog.traits(ActionKind::RespondRansom)?;
        let open = !excluded.contains(&ActionKind::RespondRansom)
            && me.budget >= traits.max_cost
            && (traits.precondition)(snapshot, config)?;
        return Ok(if open {
            vec![ActionKind::RespondRansom]
        } else {
            Vec::new()
        });
    }

    let mut feasible = Vec::new();
    for kind in ActionKind::ALL {
        if excluded.contains(&kind) {
            continue;
        }
        let traits = catalog.traits(kind)?;
        if me.budget < traits.max_cost {
            continue;
        }
        if (traits.precondition)(snapshot, config)? {
            feasible.push(kind);
        }
    }
    Ok(feasible)
}

// ---- predicates, one per action kind ----
//
// Each is a conjunction over the snapshot; none mutates anything.

pub(crate) fn always(_: &WorldSnapshot, _: &AgentConfig) -> Result<bool, InvariantError> {
    Ok(true)
}

pub(crate) fn can_respond_ransom(
    snapshot: &WorldSnapshot,
    _: &AgentConfig,
) -> Result<bool, InvariantError> {
    Ok(snapshot.me()?.captor.is_some())
}

pub(crate) fn can_maintain_army(
    snapshot: &WorldSnapshot,
    _: &AgentConfig,
) -> Result<bool, InvariantError> {
    let chest = snapshot.war_chest()?;
    Ok(snapshot
        .mine
        .armies
        .values()
        .any(|a| !a.maintained && a.upkeep <= chest))
}

pub(crate) fn can_disband_army(
    snapshot: &WorldSnapshot,
    _: &AgentConfig,
) -> Result<bool, InvariantError> {
    Ok(!snapshot.mine.armies.is_empty())
}

pub(crate) fn can_recruit(
    snapshot: &WorldSnapshot,
    config: &AgentConfig,
) -> Result<bool, InvariantError> {
    let me = snapshot.me()?;
    let Some(fief) = snapshot.mine.fiefs.get(&me.location) else {
        return Ok(false); // not on own land
    };
    if fief.recruited_this_season || fief.militia < config.min_recruit_batch {
        return Ok(false);
    }
    // Need an own army here to take the recruits.
    let army_here = snapshot
        .mine
        .armies
        .values()
        .any(|a| a.location == me.location);
    // Recruiting spends the local fief's treasury, not the war chest.
    let cheapest_batch = recruit_price(TroopKind::Peasants) * i64::from(config.min_recruit_batch);
    Ok(army_here && fief.treasury >= cheapest_batch)
}

pub(crate) fn can_attack(
    snapshot: &WorldSnapshot,
    _: &AgentConfig,
) -> Result<bool, InvariantError> {
    let me = snapshot.me()?;
    let Some(army) = snapshot.my_army()? else {
        return Ok(false);
    };
    if !army.maintained || army.location != me.location || army.troops.is_empty() {
        return Ok(false);
    }
    Ok(snapshot.foreign.armies.values().any(|s| {
        s.record.location == me.location && snapshot.relations.is_enemy(s.record.owner)
    }))
}

pub(crate) fn can_lay_siege(
    snapshot: &WorldSnapshot,
    _: &AgentConfig,
) -> Result<bool, InvariantError> {
    let me = snapshot.me()?;
    let Some(army) = snapshot.my_army()? else {
        return Ok(false);
    };
    if !army.maintained || army.location != me.location {
        return Ok(false);
    }
    match snapshot.foreign.fiefs.get(&me.location) {
        None => Ok(false), // own fief or unknown: nothing to besiege
        Some(s) => Ok(s.record.siege.is_none() && !snapshot.relations.is_ally(s.record.owner)),
    }
}

pub(crate) fn can_storm_keep(
    snapshot: &WorldSnapshot,
    _: &AgentConfig,
) -> Result<bool, InvariantError> {
    let Some(army) = snapshot.my_army()? else {
        return Ok(false);
    };
    Ok(snapshot
        .sieges
        .values()
        .any(|s| s.besieger == snapshot.player && s.besieging_army == army.id))
}

pub(crate) fn can_pillage(
    snapshot: &WorldSnapshot,
    _: &AgentConfig,
) -> Result<bool, InvariantError> {
    let me = snapshot.me()?;
    let Some(army) = snapshot.my_army()? else {
        return Ok(false);
    };
    if !army.maintained || army.location != me.location {
        return Ok(false);
    }
    match snapshot.foreign.fiefs.get(&me.location) {
        None => Ok(false),
        Some(s) => Ok(!s.record.pillaged_this_season && !snapshot.relations.is_ally(s.record.owner)),
    }
}

pub(crate) fn can_leave_detachment(
    snapshot: &WorldSnapshot,
    _: &AgentConfig,
) -> Result<bool, InvariantError> {
    let Some(army) = snapshot.my_army()? else {
        return Ok(false);
    };
    if army.troops.is_empty() {
        return Ok(false);
    }
    // Someone of ours must exist to collect it later.
    Ok(snapshot
        .mine
        .characters
        .values()
        .any(|c| c.id != snapshot.me && c.alive))
}

pub(crate) fn can_collect_detachment(
    snapshot: &WorldSnapshot,
    _: &AgentConfig,
) -> Result<bool, InvariantError> {
    let me = snapshot.me()?;
    Ok(snapshot.mine.detachments.values().any(|d| {
        d.recipient == snapshot.me
            && snapshot
                .army(d.army)
                .map(|a| a.location == me.location)
                .unwrap_or(false)
    }))
}

pub(crate) fn can_move(
    snapshot: &WorldSnapshot,
    _: &AgentConfig,
) -> Result<bool, InvariantError> {
    let me = snapshot.me()?;
    if me.in_keep {
        return Ok(false);
    }
    Ok(snapshot
        .travel_costs
        .iter()
        .any(|(dest, cost)| *dest != me.location && *cost <= me.budget))
}

pub(crate) fn can_enter_keep(
    snapshot: &WorldSnapshot,
    _: &AgentConfig,
) -> Result<bool, InvariantError> {
    let me = snapshot.me()?;
    if me.in_keep {
        return Ok(false);
    }
    // Only on own land; a besieged keep admits no-one new.
    match snapshot.mine.fiefs.get(&me.location) {
        None => Ok(false),
        Some(f) => Ok(f.siege.is_none()),
    }
}

pub(crate) fn can_exit_keep(
    snapshot: &WorldSnapshot,
    _: &AgentConfig,
) -> Result<bool, InvariantError> {
    Ok(snapshot.me()?.in_keep)
}

pub(crate) fn can_spy(
    snapshot: &WorldSnapshot,
    _: &AgentConfig,
) -> Result<bool, InvariantError> {
    let me = snapshot.me()?;
    Ok(snapshot.foreign.fiefs.contains_key(&me.location))
}

pub(crate) fn can_hire_retainer(
    snapshot: &WorldSnapshot,
    config: &AgentConfig,
) -> Result<bool, InvariantError> {
    let me = snapshot.me()?;
    if snapshot.war_chest()? < config.hire_fee {
        return Ok(false);
    }
    Ok(snapshot.foreign.characters.values().any(|s| {
        s.record.rank == CharacterRank::Retainer
            && s.record.alive
            && s.record.employer.is_none()
            && s.record.location == me.location
            && !snapshot.tracking.hire_attempted.contains(&s.record.id)
    }))
}

pub(crate) fn can_propose_marriage(
    snapshot: &WorldSnapshot,
    config: &AgentConfig,
) -> Result<bool, InvariantError> {
    let me = snapshot.me()?;
    if me.age < config.marriageable_age || me.spouse.is_some() || me.betrothed.is_some() {
        return Ok(false);
    }
    Ok(snapshot.foreign.characters.values().any(|s| {
        s.record.alive
            && s.record.spouse.is_none()
            && s.record.betrothed.is_none()
            && s.record.age >= config.marriageable_age
            && !snapshot.tracking.proposed_to.contains(&s.record.id)
    }))
}

pub(crate) fn can_transfer_treasury(
    snapshot: &WorldSnapshot,
    _: &AgentConfig,
) -> Result<bool, InvariantError> {
    Ok(snapshot.mine.fiefs.len() >= 2
        && snapshot.mine.fiefs.values().any(|f| f.treasury > 0))
}
