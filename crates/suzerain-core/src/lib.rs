mod catalog;
mod config;
mod error;
mod eval;
mod feasibility;
pub mod harness;
mod simulate;
mod snapshot;

pub mod agent;
pub mod policy;

pub use crate::agent::{
    ActionLogEntry, BudgetAccountant, CycleContext, LoopState, SeasonReport, SeasonRunner,
    WorldService,
};
pub use crate::catalog::{ActionTraits, CapabilityCatalog, ChargeRule};
pub use crate::config::{AgentConfig, ConfigError, PolicyKind};
pub use crate::error::{AgentError, CatalogError, InvariantError, ServiceError};
pub use crate::eval::evaluate;
pub use crate::feasibility::feasible_actions;
pub use crate::harness::ScriptedWorld;
pub use crate::policy::{policy_for, Policy, RulePolicy, SearchPolicy};
pub use crate::simulate::project;
pub use crate::snapshot::{ForeignCache, Holdings, Relations, SeasonTracking, WorldSnapshot};
