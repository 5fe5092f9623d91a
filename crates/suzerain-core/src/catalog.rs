//! Capability catalog: one registered entry per action kind.
//!
//! Each entry bundles the declared maximum time cost, the legality
//! predicate, and (for the deterministic subset) the simulated local effect.
//! Adding an action kind is a single registration here instead of edits
//! scattered across the feasibility engine, the simulator and the loop.

use std::collections::BTreeMap;

use suzerain_protocol::{ActionKind, Command};

use crate::config::AgentConfig;
use crate::error::{CatalogError, InvariantError};
use crate::snapshot::WorldSnapshot;
use crate::{feasibility, simulate};

/// Legality predicate evaluated against the current snapshot.
pub type Precondition = fn(&WorldSnapshot, &AgentConfig) -> Result<bool, InvariantError>;

/// Predicted local effect, applied to an owned hypothetical snapshot.
/// Absent for actions whose outcome depends on hidden randomness or
/// opponent state; those never appear inside search.
pub type Effect = fn(&mut WorldSnapshot, &Command, &AgentConfig) -> Result<(), InvariantError>;

/// How the accountant charges an action when the service does not report
/// exact consumption.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChargeRule {
    /// Three-quarters of the declared maximum, rounded up.
    EstimateFromMax,
    /// Per-destination travel cost table from the latest observation.
    TravelTable,
}

pub struct ActionTraits {
    pub kind: ActionKind,
    /// Maximum plausible time cost; the universal feasibility gate.
    pub max_cost: u32,
    pub charge: ChargeRule,
    pub precondition: Precondition,
    pub effect: Option<Effect>,
}

impl ActionTraits {
    /// Estimated charge when the service stays silent about consumption.
    pub fn fallback_charge(&self) -> u32 {
        (self.max_cost * 3).div_ceil(4)
    }
}

/// Recruitment price per man. Queried by feasibility, simulation and the
/// rule policy alike.
pub fn recruit_price(kind: suzerain_protocol::TroopKind) -> i64 {
    use suzerain_protocol::TroopKind as T;
    match kind {
        T::Knights => 12,
        T::MenAtArms => 6,
        T::Archers => 5,
        T::Crossbowmen => 5,
        T::Pikemen => 3,
        T::Peasants => 1,
    }
}

pub struct CapabilityCatalog {
    table: BTreeMap<ActionKind, ActionTraits>,
}

impl CapabilityCatalog {
    /// The standard registry covering every [`ActionKind`].
    pub fn standard() -> Self {
        let mut catalog = Self {
            table: BTreeMap::new(),
        };
        use ActionKind as K;
        use ChargeRule::{EstimateFromMax, TravelTable};

        catalog.register(K::RespondRansom, 1, EstimateFromMax, feasibility::can_respond_ransom, Some(simulate::respond_ransom as Effect));
        catalog.register(K::MaintainArmy, 2, EstimateFromMax, feasibility::can_maintain_army, Some(simulate::maintain_army as Effect));
        catalog.register(K::DisbandArmy, 1, EstimateFromMax, feasibility::can_disband_army, Some(simulate::disband_army as Effect));
        catalog.register(K::Recruit, 3, EstimateFromMax, feasibility::can_recruit, Some(simulate::recruit as Effect));
        catalog.register(K::Attack, 4, EstimateFromMax, feasibility::can_attack, None);
        catalog.register(K::LaySiege, 6, EstimateFromMax, feasibility::can_lay_siege, None);
        catalog.register(K::StormKeep, 4, EstimateFromMax, feasibility::can_storm_keep, None);
        catalog.register(K::Pillage, 4, EstimateFromMax, feasibility::can_pillage, None);
        catalog.register(K::LeaveDetachment, 1, EstimateFromMax, feasibility::can_leave_detachment, None);
        catalog.register(K::CollectDetachment, 1, EstimateFromMax, feasibility::can_collect_detachment, None);
        catalog.register(K::Move, 10, TravelTable, feasibility::can_move, Some(simulate::travel as Effect));
        catalog.register(K::EnterKeep, 1, EstimateFromMax, feasibility::can_enter_keep, Some(simulate::enter_keep as Effect));
        catalog.register(K::ExitKeep, 1, EstimateFromMax, feasibility::can_exit_keep, Some(simulate::exit_keep as Effect));
        catalog.register(K::Spy, 5, EstimateFromMax, feasibility::can_spy, None);
        catalog.register(K::HireRetainer, 2, EstimateFromMax, feasibility::can_hire_retainer, Some(simulate::hire_retainer as Effect));
        catalog.register(K::ProposeMarriage, 2, EstimateFromMax, feasibility::can_propose_marriage, None);
        catalog.register(K::TransferTreasury, 1, EstimateFromMax, feasibility::can_transfer_treasury, Some(simulate::transfer_treasury as Effect));
        catalog.register(K::EndSeason, 0, EstimateFromMax, feasibility::always, None);

        catalog
    }

    fn register(
        &mut self,
        kind: ActionKind,
        max_cost: u32,
        charge: ChargeRule,
        precondition: Precondition,
        effect: Option<Effect>,
    ) {
        self.table.insert(
            kind,
            ActionTraits {
                kind,
                max_cost,
                charge,
                precondition,
                effect,
            },
        );
    }

    /// Look up an action kind. A miss is a programming error, surfaced
    /// loudly instead of silently skipped.
    pub fn traits(&self, kind: ActionKind) -> Result<&ActionTraits, CatalogError> {
        self.table.get(&kind).ok_or(CatalogError::UnknownAction(kind))
    }

    /// Registered kinds in stable order.
    pub fn kinds(&self) -> impl Iterator<Item = ActionKind> + '_ {
        self.table.keys().copied()
    }

    /// True when the simulator can model the action, making it eligible for
    /// search expansion.
    pub fn is_simulatable(&self, kind: ActionKind) -> Result<bool, CatalogError> {
        Ok(self.traits(kind)?.effect.is_some())
    }
}
