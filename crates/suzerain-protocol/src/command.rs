use serde::{Deserialize, Serialize};

use crate::{ArmyId, CharacterId, DetachmentId, FiefId, SiegeId, TroopKind, TroopVector};

/// All possible agent→service commands. Fully serializable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    // Army commands
    MaintainArmy { army: ArmyId },
    DisbandArmy { army: ArmyId },
    Recruit { fief: FiefId, kind: TroopKind, count: u32 },
    Attack { army: ArmyId, target: ArmyId },
    LaySiege { army: ArmyId, fief: FiefId },
    StormKeep { siege: SiegeId },
    Pillage { fief: FiefId },
    LeaveDetachment { army: ArmyId, recipient: CharacterId, troops: TroopVector },
    CollectDetachment { detachment: DetachmentId },

    // Character commands
    Move { to: FiefId },
    EnterKeep,
    ExitKeep,
    Spy { fief: FiefId },
    HireRetainer { character: CharacterId },
    ProposeMarriage { to: CharacterId },
    RespondRansom { accept: bool },

    // Economy
    TransferTreasury { from: FiefId, to: FiefId, amount: i64 },

    // Season flow
    EndSeason,
}

/// Fieldless mirror of [`Command`]: the key the capability catalog, the
/// feasibility engine and the exclusion set are all indexed by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    MaintainArmy,
    DisbandArmy,
    Recruit,
    Attack,
    LaySiege,
    StormKeep,
    Pillage,
    LeaveDetachment,
    CollectDetachment,
    Move,
    EnterKeep,
    ExitKeep,
    Spy,
    HireRetainer,
    ProposeMarriage,
    RespondRansom,
    TransferTreasury,
    EndSeason,
}

impl ActionKind {
    /// Every kind, in catalog registration order.
    pub const ALL: [ActionKind; 18] = [
        ActionKind::RespondRansom,
        ActionKind::MaintainArmy,
        ActionKind::DisbandArmy,
        ActionKind::Recruit,
        ActionKind::Attack,
        ActionKind::LaySiege,
        ActionKind::StormKeep,
        ActionKind::Pillage,
        ActionKind::LeaveDetachment,
        ActionKind::CollectDetachment,
        ActionKind::Move,
        ActionKind::EnterKeep,
        ActionKind::ExitKeep,
        ActionKind::Spy,
        ActionKind::HireRetainer,
        ActionKind::ProposeMarriage,
        ActionKind::TransferTreasury,
        ActionKind::EndSeason,
    ];
}

impl Command {
    pub fn kind(&self) -> ActionKind {
        match self {
            Command::MaintainArmy { .. } => ActionKind::MaintainArmy,
            Command::DisbandArmy { .. } => ActionKind::DisbandArmy,
            Command::Recruit { .. } => ActionKind::Recruit,
            Command::Attack { .. } => ActionKind::Attack,
            Command::LaySiege { .. } => ActionKind::LaySiege,
            Command::StormKeep { .. } => ActionKind::StormKeep,
            Command::Pillage { .. } => ActionKind::Pillage,
            Command::LeaveDetachment { .. } => ActionKind::LeaveDetachment,
            Command::CollectDetachment { .. } => ActionKind::CollectDetachment,
            Command::Move { .. } => ActionKind::Move,
            Command::EnterKeep => ActionKind::EnterKeep,
            Command::ExitKeep => ActionKind::ExitKeep,
            Command::Spy { .. } => ActionKind::Spy,
            Command::HireRetainer { .. } => ActionKind::HireRetainer,
            Command::ProposeMarriage { .. } => ActionKind::ProposeMarriage,
            Command::RespondRansom { .. } => ActionKind::RespondRansom,
            Command::TransferTreasury { .. } => ActionKind::TransferTreasury,
            Command::EndSeason => ActionKind::EndSeason,
        }
    }
}
