//! Decision policies. Both variants share one signature: given the current
//! snapshot, return the command to execute next, or `None` when nothing is
//! feasible or worthwhile (which ends the season).

mod rule;
mod search;

use std::collections::BTreeSet;

pub use rule::RulePolicy;
pub use search::SearchPolicy;

use suzerain_protocol::{ActionKind, CharacterRank, Command, TroopKind};

use crate::catalog::{recruit_price, CapabilityCatalog};
use crate::config::{AgentConfig, PolicyKind};
use crate::error::AgentError;
use crate::snapshot::WorldSnapshot;

pub trait Policy {
    fn select_action(
        &self,
        snapshot: &WorldSnapshot,
        catalog: &CapabilityCatalog,
        config: &AgentConfig,
        excluded: &BTreeSet<ActionKind>,
    ) -> Result<Option<Command>, AgentError>;
}

/// Construct the configured policy variant.
pub fn policy_for(config: &AgentConfig) -> Box<dyn Policy> {
    match config.policy {
        PolicyKind::Rules => Box::new(RulePolicy::standard()),
        PolicyKind::Search => Box::new(SearchPolicy),
    }
}

/// Turn a feasible action kind into concrete candidate commands with
/// arguments filled in. Used by the search policy to expand a node; the rule
/// policy picks its own arguments per rule. Candidates are produced in a
/// stable order so that search stays deterministic.
pub(crate) fn candidate_commands(
    snapshot: &WorldSnapshot,
    config: &AgentConfig,
    kind: ActionKind,
) -> Result<Vec<Command>, AgentError> {
    let me = snapshot.me()?;
    let mut out = Vec::new();
    match kind {
        ActionKind::RespondRansom => {
            out.push(Command::RespondRansom {
                accept: snapshot.war_chest()? > 0,
            });
        }
        ActionKind::MaintainArmy => {
            let chest = snapshot.war_chest()?;
            for army in snapshot.mine.armies.values() {
                if !army.maintained && army.upkeep <= chest {
                    out.push(Command::MaintainArmy { army: army.id });
                }
            }
        }
        ActionKind::DisbandArmy => {
            for army in snapshot.mine.armies.values() {
                out.push(Command::DisbandArmy { army: army.id });
            }
        }
        ActionKind::Recruit => {
            if let Some(fief) = snapshot.mine.fiefs.get(&me.location) {
                if let Some((kind, count)) = recruit_pick(fief.militia, fief.treasury, config) {
                    out.push(Command::Recruit {
                        fief: fief.id,
                        kind,
                        count,
                    });
                }
            }
        }
        ActionKind::Move => {
            for (dest, cost) in &snapshot.travel_costs {
                if *dest != me.location && *cost <= me.budget {
                    out.push(Command::Move { to: *dest });
                }
            }
        }
        ActionKind::EnterKeep => out.push(Command::EnterKeep),
        ActionKind::ExitKeep => out.push(Command::ExitKeep),
        ActionKind::HireRetainer => {
            for sighted in snapshot.foreign.characters.values() {
                let c = &sighted.record;
                if c.rank == CharacterRank::Retainer
                    && c.alive
                    && c.employer.is_none()
                    && c.location == me.location
                    && !snapshot.tracking.hire_attempted.contains(&c.id)
                {
                    out.push(Command::HireRetainer { character: c.id });
                }
            }
        }
        ActionKind::TransferTreasury => {
            // One canonical candidate: consolidate the richest non-home fief
            // into the war chest.
            let richest = snapshot
                .mine
                .fiefs
                .values()
                .filter(|f| f.id != snapshot.home && f.treasury > 0)
                .max_by_key(|f| (f.treasury, std::cmp::Reverse(f.id)));
            if let Some(source) = richest {
                out.push(Command::TransferTreasury {
                    from: source.id,
                    to: snapshot.home,
                    amount: source.treasury,
                });
            }
        }
        // Not simulatable: never expanded by search, and the rule policy
        // builds these commands itself.
        ActionKind::Attack
        | ActionKind::LaySiege
        | ActionKind::StormKeep
        | ActionKind::Pillage
        | ActionKind::Spy
        | ActionKind::ProposeMarriage
        | ActionKind::LeaveDetachment
        | ActionKind::CollectDetachment
        | ActionKind::EndSeason => {}
    }
    Ok(out)
}

/// Choose what to recruit: the heaviest kind a full batch of which is
/// affordable, and as many men as militia and treasury allow.
pub(crate) fn recruit_pick(
    militia: u32,
    treasury: i64,
    config: &AgentConfig,
) -> Option<(TroopKind, u32)> {
    if militia < config.min_recruit_batch || treasury <= 0 {
        return None;
    }
    for kind in [
        TroopKind::Knights,
        TroopKind::MenAtArms,
        TroopKind::Archers,
        TroopKind::Crossbowmen,
        TroopKind::Pikemen,
        TroopKind::Peasants,
    ] {
        let price = recruit_price(kind);
        let affordable = (treasury / price) as u32;
        let count = affordable.min(militia);
        if count >= config.min_recruit_batch {
            return Some((kind, count));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use crate::snapshot::test_fixtures::small_world;

    use super::*;

    #[test]
    fn recruit_pick_prefers_heavy_troops_it_can_afford() {
        let config = AgentConfig::default();
        // 200 gold buys 16 knights; militia 40, batch 10 => knights.
        let (kind, count) = recruit_pick(40, 200, &config).unwrap();
        assert_eq!(kind, TroopKind::Knights);
        assert_eq!(count, 16);

        // 40 gold only funds a pikemen batch.
        let (kind, _) = recruit_pick(40, 40, &config).unwrap();
        assert_eq!(kind, TroopKind::Pikemen);

        assert!(recruit_pick(5, 200, &config).is_none());
        assert!(recruit_pick(40, 0, &config).is_none());
    }

    #[test]
    fn move_candidates_skip_current_location() {
        let snapshot = small_world();
        let config = AgentConfig::default();
        let candidates = candidate_commands(&snapshot, &config, ActionKind::Move).unwrap();
        assert_eq!(
            candidates,
            vec![Command::Move {
                to: suzerain_protocol::FiefId::new(2)
            }]
        );
    }
}
