//! The auto-fight scheduler.
//!
//! Runs as its own task and drives the executor one step at a time, sleeping
//! between steps so spectators can follow along. Between any two steps the
//! executor is free to apply operator commands.

use std::time::Duration;

use gmconsole_session::application::autofight::{StopReason, TurnPlan};
use tracing::{debug, info, instrument};

use crate::error::AppError;
use crate::executor::SessionHandle;

/// Pauses between auto-fight steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// After each attack.
    pub attack: Duration,
    /// After each turn advance.
    pub turn: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            attack: Duration::from_millis(1_000),
            turn: Duration::from_millis(100),
        }
    }
}

impl Pacing {
    /// No pauses at all.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            attack: Duration::ZERO,
            turn: Duration::ZERO,
        }
    }
}

/// Fights until combat ends, then tells the executor the run is over.
#[instrument(skip_all)]
pub async fn run(session: SessionHandle, pacing: Pacing) {
    match fight(&session, pacing).await {
        Ok(reason) => {
            info!(%reason, "auto-fight finished");
            if session.auto_finished(reason).await.is_err() {
                debug!("executor gone before auto-fight could report");
            }
        }
        Err(e) => debug!(error = %e, "auto-fight abandoned"),
    }
}

async fn fight(session: &SessionHandle, pacing: Pacing) -> Result<StopReason, AppError> {
    loop {
        match session.auto_plan().await? {
            TurnPlan::Stop(reason) => return Ok(reason),
            TurnPlan::Act { occupant, attackers } => {
                debug!(%occupant, attackers = attackers.len(), "auto-fight turn");
                for attacker in attackers {
                    let stop = session.auto_attack(attacker).await?;
                    tokio::time::sleep(pacing.attack).await;
                    if let Some(reason) = stop {
                        return Ok(reason);
                    }
                }
            }
        }
        if let Some(reason) = session.auto_advance().await? {
            return Ok(reason);
        }
        tokio::time::sleep(pacing.turn).await;
    }
}
