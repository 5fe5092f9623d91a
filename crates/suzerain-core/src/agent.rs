//! Turn loop and budget accountant.
//!
//! Drives the cycle observe → reconcile → decide → execute → update for one
//! season. Single-threaded and synchronous: a cycle completes fully before
//! the next begins, and execution blocks on the world service. The live
//! snapshot has exactly one writer (this loop); search works on clones and
//! never shares state with it.

use std::collections::BTreeSet;

use serde::Serialize;
use suzerain_protocol::{
    ActionKind, CharacterId, Command, CommandOutcome, Observation, Query, StatusCode,
};
use tracing::{debug, info, warn};

use crate::catalog::{CapabilityCatalog, ChargeRule};
use crate::config::AgentConfig;
use crate::error::{AgentError, CatalogError, ServiceError};
use crate::policy::Policy;
use crate::snapshot::WorldSnapshot;

/// The consumed boundary: a request/response command interface plus an
/// observation query. Transport, encoding and authentication are someone
/// else's problem.
pub trait WorldService {
    fn observe(&mut self, query: &Query) -> Result<Observation, ServiceError>;
    fn execute(&mut self, command: &Command) -> Result<CommandOutcome, ServiceError>;
}

/// Turn loop state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Observing,
    Reconciling,
    Deciding,
    Executing,
    SeasonEnded,
}

/// Per-cycle decision context: the "recently failed" exclusion set with its
/// reset points made explicit. Cleared by any successful execution.
#[derive(Clone, Debug, Default)]
pub struct CycleContext {
    pub excluded: BTreeSet<ActionKind>,
}

impl CycleContext {
    fn record_failure(&mut self, kind: ActionKind) {
        self.excluded.insert(kind);
    }

    fn record_success(&mut self) {
        self.excluded.clear();
    }
}

/// Tracks the season time budget consumed by executed actions. The budget is
/// a hard cap enforced before dispatch (by the feasibility gate), never a
/// preemption signal.
#[derive(Clone, Copy, Debug, Default)]
pub struct BudgetAccountant {
    spent: u32,
}

impl BudgetAccountant {
    pub fn spent(&self) -> u32 {
        self.spent
    }

    /// Charge for an executed command: the exact service-reported cost when
    /// present, else the travel table for movement, else ¾ of the declared
    /// maximum.
    pub fn charge(
        &mut self,
        catalog: &CapabilityCatalog,
        snapshot: &WorldSnapshot,
        outcome: &CommandOutcome,
    ) -> Result<u32, CatalogError> {
        let traits = catalog.traits(outcome.command.kind())?;
        let charged = match outcome.cost_reported {
            Some(exact) => exact,
            None => match (traits.charge, &outcome.command) {
                (ChargeRule::TravelTable, Command::Move { to }) => snapshot
                    .travel_costs
                    .get(to)
                    .copied()
                    .unwrap_or(traits.max_cost),
                _ => traits.fallback_charge(),
            },
        };
        self.spent += charged;
        Ok(charged)
    }
}

/// Structured log entry emitted per completed action: the presentation
/// layer's view of what the agent did.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActionLogEntry {
    pub command: Command,
    pub status: StatusCode,
    pub charged: u32,
}

/// Everything that happened during one season run.
#[derive(Clone, Debug, Serialize)]
pub struct SeasonReport {
    pub season: u32,
    pub actions: Vec<ActionLogEntry>,
    pub budget_spent: u32,
}

pub struct SeasonRunner<W: WorldService> {
    world: W,
    policy: Box<dyn Policy>,
    catalog: CapabilityCatalog,
    config: AgentConfig,
    character: CharacterId,

    state: LoopState,
    snapshot: Option<WorldSnapshot>,
    ctx: CycleContext,
    accountant: BudgetAccountant,
    history: Vec<ActionLogEntry>,

    pending_observation: Option<Observation>,
    pending_command: Option<Command>,
}

impl<W: WorldService> SeasonRunner<W> {
    pub fn new(
        world: W,
        policy: Box<dyn Policy>,
        config: AgentConfig,
        character: CharacterId,
    ) -> Self {
        Self {
            world,
            policy,
            catalog: CapabilityCatalog::standard(),
            config,
            character,
            state: LoopState::Observing,
            snapshot: None,
            ctx: CycleContext::default(),
            accountant: BudgetAccountant::default(),
            history: Vec::new(),
            pending_observation: None,
            pending_command: None,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Read-only access to the live snapshot, for display.
    pub fn snapshot(&self) -> Option<&WorldSnapshot> {
        self.snapshot.as_ref()
    }

    /// Advance the state machine by one transition.
    pub fn step(&mut self) -> Result<LoopState, AgentError> {
        match self.state {
            LoopState::Observing => self.step_observe()?,
            LoopState::Reconciling => self.step_reconcile()?,
            LoopState::Deciding => self.step_decide()?,
            LoopState::Executing => self.step_execute()?,
            LoopState::SeasonEnded => {}
        }
        Ok(self.state)
    }

    /// Run the full cycle until the season ends, reporting the action
    /// history taken.
    pub fn run_season(&mut self) -> Result<SeasonReport, AgentError> {
        while self.state != LoopState::SeasonEnded {
            self.step()?;
        }
        Ok(SeasonReport {
            season: self.snapshot.as_ref().map(|s| s.season).unwrap_or(0),
            actions: self.history.clone(),
            budget_spent: self.accountant.spent(),
        })
    }

    /// Reset the per-season ledgers and play the following season. The
    /// reconciled snapshot carries over, so the next observation is merged
    /// into it rather than rebuilt from scratch.
    pub fn run_next_season(&mut self) -> Result<SeasonReport, AgentError> {
        self.state = LoopState::Observing;
        self.ctx = CycleContext::default();
        self.accountant = BudgetAccountant::default();
        self.history.clear();
        self.run_season()
    }

    fn step_observe(&mut self) -> Result<(), AgentError> {
        let query = Query::Overview {
            character: self.character,
        };
        let observation = self.world.observe(&query)?;
        debug!(season = observation.season, "observation received");
        self.pending_observation = Some(observation);
        self.state = LoopState::Reconciling;
        Ok(())
    }

    fn step_reconcile(&mut self) -> Result<(), AgentError> {
        let observation = self
            .pending_observation
            .take()
            .ok_or_else(|| ServiceError::Unavailable("observation lost".into()))?;
        let next = match self.snapshot.take() {
            None => {
                let player = observation.me.player;
                WorldSnapshot::from_observation(player, &observation)?
            }
            Some(previous) => previous.reconcile(&observation)?,
        };
        self.snapshot = Some(next);
        self.state = LoopState::Deciding;
        Ok(())
    }

    fn step_decide(&mut self) -> Result<(), AgentError> {
        let snapshot = self
            .snapshot
            .as_ref()
            .ok_or_else(|| ServiceError::Unavailable("no snapshot to decide on".into()))?;
        match self
            .policy
            .select_action(snapshot, &self.catalog, &self.config, &self.ctx.excluded)?
        {
            Some(command) => {
                self.pending_command = Some(command);
                self.state = LoopState::Executing;
            }
            None => {
                // Nothing feasible or worthwhile: the season is over.
                let _ = self.world.execute(&Command::EndSeason)?;
                info!(
                    actions = self.history.len(),
                    spent = self.accountant.spent(),
                    "season ended"
                );
                self.state = LoopState::SeasonEnded;
            }
        }
        Ok(())
    }

    fn step_execute(&mut self) -> Result<(), AgentError> {
        let command = self
            .pending_command
            .take()
            .ok_or_else(|| ServiceError::Unavailable("command lost".into()))?;
        let outcome = self.world.execute(&command)?;
        let snapshot = self
            .snapshot
            .as_mut()
            .ok_or_else(|| ServiceError::Unavailable("no snapshot during execute".into()))?;
        let charged = self
            .accountant
            .charge(&self.catalog, snapshot, &outcome)?;

        info!(
            command = ?outcome.command,
            status = ?outcome.status,
            charged,
            "action completed"
        );
        self.history.push(ActionLogEntry {
            command: outcome.command.clone(),
            status: outcome.status,
            charged,
        });

        if outcome.status.is_ok() {
            self.ctx.record_success();
            // Charge the estimate locally; the next observation brings the
            // authoritative figure.
            let me = snapshot.me_mut()?;
            me.budget = me.budget.saturating_sub(charged);
            self.after_success(&command)?;
            self.state = LoopState::Observing;
        } else {
            warn!(kind = ?command.kind(), status = ?outcome.status, "action failed");
            self.ctx.record_failure(command.kind());
            self.state = LoopState::Deciding;
        }
        Ok(())
    }

    /// Season tracking updates that must not wait for the next observation.
    fn after_success(&mut self, command: &Command) -> Result<(), AgentError> {
        let snapshot = self
            .snapshot
            .as_mut()
            .ok_or_else(|| ServiceError::Unavailable("no snapshot after success".into()))?;
        match command {
            Command::ProposeMarriage { to } => {
                snapshot.tracking.proposed_to.insert(*to);
            }
            Command::HireRetainer { character } => {
                snapshot.tracking.hire_attempted.insert(*character);
            }
            _ => {}
        }
        Ok(())
    }
}
