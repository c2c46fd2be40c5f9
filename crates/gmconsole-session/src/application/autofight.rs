//! Step logic for automatic battles.
//!
//! The scheduler that paces a fight lives with the runtime; this module only
//! decides, one step at a time, who acts and against whom. Each step is a
//! short synchronous mutation so the owner of the session can interleave
//! other commands between steps.

use std::fmt;

use gmconsole_core::clock::Clock;
use gmconsole_core::error::DomainError;
use gmconsole_dice::{DiceExpr, DiceOracle};

use super::combat::{AttackReport, RollMode, attack};
use crate::domain::character::Character;
use crate::domain::world::World;

/// Chance, in percent, that an NPC looks for a target of another race before
/// falling back to the party.
pub const RACE_BIAS_PERCENT: i32 = 35;

/// Why an automatic battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    NoCombat,
    PartyDown,
    NpcsDown,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoCombat => "no combat in progress",
            Self::PartyDown => "the party has fallen",
            Self::NpcsDown => "all foes are down",
        })
    }
}

/// What the current turn calls for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnPlan {
    Stop(StopReason),
    /// `attackers` act in order; empty when every instance is down.
    Act {
        occupant: String,
        attackers: Vec<String>,
    },
}

/// Outcome of one automatic attack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoAttack {
    Attacked(AttackReport),
    /// The attacker is down.
    Incapacitated(String),
    /// Nobody left to attack.
    NoTarget(String),
}

impl AutoAttack {
    /// Human-readable narration.
    #[must_use]
    pub fn narration(&self) -> String {
        match self {
            Self::Attacked(report) => report.to_string(),
            Self::Incapacitated(name) => format!("{name} is down and cannot act."),
            Self::NoTarget(name) => format!("{name} finds no one to attack."),
        }
    }
}

/// The reason combat cannot go on, if any.
#[must_use]
pub fn stop_reason(world: &World) -> Option<StopReason> {
    if !world.turns.is_active() {
        Some(StopReason::NoCombat)
    } else if world.party_down() {
        Some(StopReason::PartyDown)
    } else if world.npcs_down() {
        Some(StopReason::NpcsDown)
    } else {
        None
    }
}

/// Works out who acts this turn. An NPC turn makes every living instance
/// with the occupant's name attack once; a party turn is one attack.
#[must_use]
pub fn plan_turn(world: &World) -> TurnPlan {
    if let Some(reason) = stop_reason(world) {
        return TurnPlan::Stop(reason);
    }
    let Some(occupant) = world.turn_occupant() else {
        return TurnPlan::Act {
            occupant: world
                .turns
                .current()
                .map(|e| e.name.clone())
                .unwrap_or_default(),
            attackers: Vec::new(),
        };
    };
    let attackers = if occupant.is_party() {
        vec![occupant.key.clone()]
    } else {
        world
            .named(occupant.name())
            .filter(|c| c.is_npc() && c.is_alive())
            .map(|c| c.key.clone())
            .collect()
    };
    TurnPlan::Act {
        occupant: occupant.name().to_owned(),
        attackers,
    }
}

fn pick(oracle: &mut dyn DiceOracle, candidates: Vec<String>) -> Option<String> {
    let index = oracle.pick(candidates.len())?;
    candidates.into_iter().nth(index)
}

fn living_keys<'a>(it: impl Iterator<Item = &'a Character>) -> Vec<String> {
    it.filter(|c| c.is_alive()).map(|c| c.key.clone()).collect()
}

/// Chooses who an NPC attacks: with [`RACE_BIAS_PERCENT`] chance, a living
/// participant of another race; otherwise, or when there is none, a living
/// party member.
fn npc_target(world: &World, oracle: &mut dyn DiceOracle, attacker: &Character) -> Option<String> {
    if oracle.roll(&DiceExpr::D100) <= RACE_BIAS_PERCENT {
        let others = living_keys(
            world
                .roster
                .participants()
                .filter(|c| c.key != attacker.key && c.sheet.race != attacker.sheet.race),
        );
        if !others.is_empty() {
            return pick(oracle, others);
        }
    }
    pick(oracle, living_keys(world.roster.party()))
}

/// Makes `attacker_key` attack with its first attack. Party members pick a
/// random living NPC; NPCs pick per [`npc_target`].
///
/// # Errors
///
/// Returns `EntityNotFound` for an unknown attacker and propagates attack
/// errors (e.g. a character without attacks).
pub fn auto_attack(
    world: &mut World,
    oracle: &mut dyn DiceOracle,
    clock: &dyn Clock,
    attacker_key: &str,
) -> Result<AutoAttack, DomainError> {
    let attacker = world
        .roster
        .get(attacker_key)
        .cloned()
        .ok_or_else(|| DomainError::EntityNotFound(attacker_key.to_owned()))?;
    if !attacker.is_alive() {
        return Ok(AutoAttack::Incapacitated(attacker.name().to_owned()));
    }
    let target = if attacker.is_party() {
        pick(oracle, living_keys(world.roster.npcs()))
    } else {
        npc_target(world, oracle, &attacker)
    };
    let Some(target) = target else {
        return Ok(AutoAttack::NoTarget(attacker.name().to_owned()));
    };
    let report = attack(world, oracle, clock, &attacker.key, 0, &target, RollMode::Normal)?;
    Ok(AutoAttack::Attacked(report))
}

/// Moves to the next turn and reports whether the fight is over.
pub fn advance(world: &mut World) -> Option<StopReason> {
    world.turns.advance();
    stop_reason(world)
}
