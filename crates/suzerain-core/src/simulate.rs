//! State transition simulator: predicted local effects of the deterministic
//! action subset, applied to an owned clone of the snapshot.
//!
//! Only ever used inside search; never talks to the world service. Actions
//! whose outcome depends on hidden randomness or opponent state (combat,
//! sieges, spying, detachment transfer, storming) have no effect function
//! registered and yield `None` from [`project`].

use suzerain_protocol::{CharacterRank, Command};

use crate::catalog::{recruit_price, CapabilityCatalog, ChargeRule};
use crate::config::AgentConfig;
use crate::error::{AgentError, InvariantError};
use crate::snapshot::WorldSnapshot;

/// Project a command onto a hypothetical copy of `snapshot`.
///
/// Returns `None` when the catalog marks the action as not simulatable.
/// The copy also gets the estimated time cost charged against the acting
/// character's budget, so deeper plies see the budget shrink.
pub fn project(
    catalog: &CapabilityCatalog,
    config: &AgentConfig,
    snapshot: &WorldSnapshot,
    command: &Command,
) -> Result<Option<WorldSnapshot>, AgentError> {
    let traits = catalog.traits(command.kind())?;
    let Some(effect) = traits.effect else {
        return Ok(None);
    };

    let mut copy = snapshot.clone();
    effect(&mut copy, command, config)?;

    let charge = match traits.charge {
        ChargeRule::TravelTable => match command {
            Command::Move { to } => copy.travel_costs.get(to).copied().unwrap_or(traits.max_cost),
            _ => traits.fallback_charge(),
        },
        ChargeRule::EstimateFromMax => traits.fallback_charge(),
    };
    let me = copy.me_mut()?;
    me.budget = me.budget.saturating_sub(charge);

    Ok(Some(copy))
}

// ---- effect functions, registered in the capability catalog ----
//
// Dispatch happens by command kind, so each function sees its own variant.

pub(crate) fn respond_ransom(
    snapshot: &mut WorldSnapshot,
    command: &Command,
    config: &AgentConfig,
) -> Result<(), InvariantError> {
    let Command::RespondRansom { accept } = command else {
        return Ok(());
    };
    if !*accept {
        return Ok(());
    }
    let home = snapshot.home;
    {
        let fief = snapshot
            .mine
            .fiefs
            .get_mut(&home)
            .ok_or(InvariantError::MissingFief(home))?;
        let price = fief.treasury.min(config.ransom_ceiling).max(0);
        fief.treasury -= price;
    }
    snapshot.me_mut()?.captor = None;
    Ok(())
}

pub(crate) fn maintain_army(
    snapshot: &mut WorldSnapshot,
    command: &Command,
    _: &AgentConfig,
) -> Result<(), InvariantError> {
    let Command::MaintainArmy { army } = command else {
        return Ok(());
    };
    let upkeep = {
        let record = snapshot
            .mine
            .armies
            .get_mut(army)
            .ok_or(InvariantError::MissingArmy(*army))?;
        record.maintained = true;
        record.upkeep
    };
    let home = snapshot.home;
    let fief = snapshot
        .mine
        .fiefs
        .get_mut(&home)
        .ok_or(InvariantError::MissingFief(home))?;
    fief.treasury -= upkeep;
    Ok(())
}

pub(crate) fn disband_army(
    snapshot: &mut WorldSnapshot,
    command: &Command,
    _: &AgentConfig,
) -> Result<(), InvariantError> {
    let Command::DisbandArmy { army } = command else {
        return Ok(());
    };
    let removed = snapshot
        .mine
        .armies
        .remove(army)
        .ok_or(InvariantError::MissingArmy(*army))?;
    if let Some(commander) = removed.commander {
        if let Some(c) = snapshot.mine.characters.get_mut(&commander) {
            c.commands = None;
        }
    }
    if let Some(fief) = snapshot.mine.fiefs.get_mut(&removed.location) {
        fief.armies_present.retain(|id| id != army);
    }
    Ok(())
}

pub(crate) fn recruit(
    snapshot: &mut WorldSnapshot,
    command: &Command,
    _: &AgentConfig,
) -> Result<(), InvariantError> {
    let Command::Recruit { fief, kind, count } = command else {
        return Ok(());
    };
    let count = {
        let record = snapshot
            .mine
            .fiefs
            .get_mut(fief)
            .ok_or(InvariantError::MissingFief(*fief))?;
        let count = (*count).min(record.militia);
        record.militia -= count;
        record.treasury -= recruit_price(*kind) * i64::from(count);
        record.recruited_this_season = true;
        count
    };

    // Credit the commanded army at this fief, else the first own army here.
    let target = match snapshot.me()?.commands {
        Some(id) if snapshot.mine.armies.get(&id).map(|a| a.location) == Some(*fief) => Some(id),
        _ => snapshot
            .mine
            .armies
            .values()
            .find(|a| a.location == *fief)
            .map(|a| a.id),
    };
    let target = target.ok_or(InvariantError::MissingArmy(suzerain_protocol::ArmyId::new(0)))?;
    let army = snapshot
        .mine
        .armies
        .get_mut(&target)
        .ok_or(InvariantError::MissingArmy(target))?;
    army.troops = army
        .troops
        .add(&suzerain_protocol::TroopVector::of(*kind, count));
    Ok(())
}

pub(crate) fn travel(
    snapshot: &mut WorldSnapshot,
    command: &Command,
    _: &AgentConfig,
) -> Result<(), InvariantError> {
    let Command::Move { to } = command else {
        return Ok(());
    };
    let (me_id, from, commanded) = {
        let me = snapshot.me()?;
        (me.id, me.location, me.commands)
    };

    snapshot.me_mut()?.location = *to;
    if let Some(fief) = snapshot.mine.fiefs.get_mut(&from) {
        fief.characters_present.retain(|id| *id != me_id);
    }
    if let Some(fief) = snapshot.mine.fiefs.get_mut(to) {
        fief.characters_present.push(me_id);
    }

    // A commanded army marches with its commander.
    if let Some(army_id) = commanded {
        if let Some(army) = snapshot.mine.armies.get_mut(&army_id) {
            if army.location == from {
                army.location = *to;
                if let Some(fief) = snapshot.mine.fiefs.get_mut(&from) {
                    fief.armies_present.retain(|id| *id != army_id);
                }
                if let Some(fief) = snapshot.mine.fiefs.get_mut(to) {
                    fief.armies_present.push(army_id);
                }
            }
        }
    }
    Ok(())
}

pub(crate) fn enter_keep(
    snapshot: &mut WorldSnapshot,
    _: &Command,
    _: &AgentConfig,
) -> Result<(), InvariantError> {
    snapshot.me_mut()?.in_keep = true;
    Ok(())
}

pub(crate) fn exit_keep(
    snapshot: &mut WorldSnapshot,
    _: &Command,
    _: &AgentConfig,
) -> Result<(), InvariantError> {
    snapshot.me_mut()?.in_keep = false;
    Ok(())
}

pub(crate) fn hire_retainer(
    snapshot: &mut WorldSnapshot,
    command: &Command,
    config: &AgentConfig,
) -> Result<(), InvariantError> {
    let Command::HireRetainer { character } = command else {
        return Ok(());
    };
    let sighted = snapshot
        .foreign
        .characters
        .remove(character)
        .ok_or(InvariantError::MissingCharacter(*character))?;

    let mut hired = sighted.record;
    hired.player = snapshot.player;
    hired.rank = CharacterRank::Retainer;
    hired.employer = Some(snapshot.me);
    snapshot.mine.characters.insert(hired.id, hired);
    snapshot.tracking.hire_attempted.insert(*character);

    let home = snapshot.home;
    let fief = snapshot
        .mine
        .fiefs
        .get_mut(&home)
        .ok_or(InvariantError::MissingFief(home))?;
    fief.treasury -= config.hire_fee;
    Ok(())
}

pub(crate) fn transfer_treasury(
    snapshot: &mut WorldSnapshot,
    command: &Command,
    _: &AgentConfig,
) -> Result<(), InvariantError> {
    let Command::TransferTreasury { from, to, amount } = command else {
        return Ok(());
    };
    let moved = {
        let source = snapshot
            .mine
            .fiefs
            .get_mut(from)
            .ok_or(InvariantError::MissingFief(*from))?;
        let moved = (*amount).clamp(0, source.treasury);
        source.treasury -= moved;
        moved
    };
    let sink = snapshot
        .mine
        .fiefs
        .get_mut(to)
        .ok_or(InvariantError::MissingFief(*to))?;
    sink.treasury += moved;
    Ok(())
}
