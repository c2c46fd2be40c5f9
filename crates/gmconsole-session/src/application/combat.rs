//! Initiative and attack resolution.
//!
//! Every random number comes from the injected [`DiceOracle`], in a fixed
//! order, so tests can script whole fights. An attack always rolls two d20s
//! and then its damage, whether or not the second d20 or the damage is used.

use std::fmt;
use std::str::FromStr;

use gmconsole_core::clock::Clock;
use gmconsole_core::error::DomainError;
use gmconsole_dice::{DiceExpr, DiceOracle};
use tracing::{info, warn};

use crate::domain::character::Character;
use crate::domain::turn_order::TurnEntry;
use crate::domain::world::World;

/// How the d20 is rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollMode {
    #[default]
    Normal,
    /// Keep the higher of two rolls.
    Advantage,
    /// Keep the lower of two rolls.
    Disadvantage,
}

impl RollMode {
    /// Picks the kept roll. Ties keep the second roll.
    #[must_use]
    pub fn keep(self, first: i32, second: i32) -> i32 {
        match self {
            Self::Normal => first,
            Self::Advantage if second >= first => second,
            Self::Disadvantage if second <= first => second,
            Self::Advantage | Self::Disadvantage => first,
        }
    }
}

impl FromStr for RollMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adv" => Ok(Self::Advantage),
            "dis" => Ok(Self::Disadvantage),
            other => Err(DomainError::InvalidArgument(format!(
                "expected adv or dis, got {other}"
            ))),
        }
    }
}

/// Per-character advantage requests given to `combat`, as `key=adv|dis`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvantageSpec {
    entries: Vec<(String, RollMode)>,
}

impl AdvantageSpec {
    /// Parses tokens; malformed ones are logged and ignored.
    #[must_use]
    pub fn parse(tokens: &[String]) -> Self {
        let entries = tokens
            .iter()
            .filter_map(|token| {
                let parsed = token
                    .split_once('=')
                    .and_then(|(key, mode)| mode.parse().ok().map(|m| (key.to_owned(), m)));
                if parsed.is_none() {
                    warn!(token = %token, "ignoring malformed advantage token");
                }
                parsed
            })
            .collect();
        Self { entries }
    }

    /// The mode requested for `character`, matched by its key, its name, or
    /// the key of anything sharing its name.
    fn mode_for(&self, world: &World, character: &Character) -> RollMode {
        self.entries
            .iter()
            .find(|(key, _)| {
                key == &character.key
                    || key == character.name()
                    || world
                        .roster
                        .get(key)
                        .is_some_and(|c| c.name() == character.name())
            })
            .map_or(RollMode::Normal, |(_, mode)| *mode)
    }
}

/// Rolls initiative for every party member and NPC, one roll per display
/// name, and starts combat. Returns the number of entries in the order.
pub fn roll_initiative(world: &mut World, oracle: &mut dyn DiceOracle, spec: &AdvantageSpec) -> usize {
    let mut rolled: Vec<TurnEntry> = Vec::new();
    let participants: Vec<Character> = world.roster.participants().cloned().collect();
    for character in &participants {
        if rolled.iter().any(|e| e.name == character.name()) {
            continue;
        }
        let modifier = character.sheet.initiative;
        let first = oracle.roll(&DiceExpr::D20) + modifier;
        let score = match spec.mode_for(world, character) {
            RollMode::Normal => first,
            mode => mode.keep(first, oracle.roll(&DiceExpr::D20) + modifier),
        };
        rolled.push(TurnEntry {
            name: character.name().to_owned(),
            score,
        });
    }
    world.turns.start(rolled);
    info!(order = ?world.turns.lines(), "initiative rolled");
    world.turns.entries().len()
}

/// How an attack roll came out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    CriticalHit,
    Hit,
    Miss,
    CriticalMiss,
}

impl Verdict {
    /// Natural 20 always hits, natural 1 always misses, otherwise the total
    /// must meet the armour class.
    #[must_use]
    pub fn judge(natural: i32, total: i32, ac: i32) -> Self {
        match natural {
            20 => Self::CriticalHit,
            1 => Self::CriticalMiss,
            _ if total >= ac => Self::Hit,
            _ => Self::Miss,
        }
    }

    #[must_use]
    pub fn lands(self) -> bool {
        matches!(self, Self::CriticalHit | Self::Hit)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CriticalHit => "CRITICAL HIT!",
            Self::Hit => "HIT!",
            Self::Miss => "MISS!",
            Self::CriticalMiss => "CRITICAL MISS!",
        })
    }
}

/// Everything that happened in one attack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackReport {
    pub attacker: String,
    pub attacker_key: String,
    pub target: String,
    pub target_key: String,
    pub weapon: String,
    pub verb: String,
    pub mode: RollMode,
    /// Both d20 results, in roll order.
    pub rolls: (i32, i32),
    /// The kept d20 result.
    pub natural: i32,
    pub to_hit: i32,
    pub ac: i32,
    pub verdict: Verdict,
    pub damage_expr: String,
    /// Damage rolled; applied only when the attack lands.
    pub damage: i32,
    /// The target is an NPC that went down with this attack.
    pub defeated: bool,
}

impl fmt::Display for AttackReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} attacks {} with {}", self.attacker, self.target, self.weapon)?;
        match self.mode {
            RollMode::Normal => writeln!(f)?,
            RollMode::Advantage => writeln!(f, " with advantage ({}, {})", self.rolls.0, self.rolls.1)?,
            RollMode::Disadvantage => {
                writeln!(f, " with disadvantage ({}, {})", self.rolls.0, self.rolls.1)?;
            }
        }
        write!(
            f,
            "Attack roll: 1d20{:+} ({}) vs AC {}: {}",
            self.to_hit,
            self.natural + self.to_hit,
            self.ac,
            self.verdict
        )?;
        if self.verdict.lands() {
            let savagely = if self.verdict == Verdict::CriticalHit {
                "savagely "
            } else {
                ""
            };
            write!(
                f,
                "\n{} {}{} {} for {} damage. Damage roll: {} ({})",
                self.attacker,
                savagely,
                self.verb,
                self.target,
                self.damage,
                self.damage_expr,
                self.damage
            )?;
        }
        if self.defeated {
            write!(f, "\n{} falls!", self.target)?;
        }
        Ok(())
    }
}

/// Resolves one attack and records it in the battle log.
///
/// # Errors
///
/// Returns `EntityNotFound` for an unknown attacker or target and
/// `InvalidArgument` when the attacker has no attack at `attack_index`.
/// Nothing is rolled or changed in either case.
pub fn attack(
    world: &mut World,
    oracle: &mut dyn DiceOracle,
    clock: &dyn Clock,
    attacker: &str,
    attack_index: usize,
    target: &str,
    mode: RollMode,
) -> Result<AttackReport, DomainError> {
    let attacker = world
        .roster
        .find(attacker)
        .cloned()
        .ok_or_else(|| DomainError::EntityNotFound(attacker.to_owned()))?;
    let target = world
        .roster
        .find(target)
        .cloned()
        .ok_or_else(|| DomainError::EntityNotFound(target.to_owned()))?;
    let weapon = attacker
        .sheet
        .attacks
        .get(attack_index)
        .cloned()
        .ok_or_else(|| {
            DomainError::InvalidArgument(format!(
                "{} has no attack {attack_index}",
                attacker.name()
            ))
        })?;

    let rolls = (oracle.roll(&DiceExpr::D20), oracle.roll(&DiceExpr::D20));
    let natural = mode.keep(rolls.0, rolls.1);
    let damage = oracle.roll_str(&weapon.damage).max(0);
    let verdict = Verdict::judge(natural, natural + weapon.to_hit, target.sheet.ac);

    let defeated = if verdict.lands() {
        world.adjust_hp(&target.key, -damage)?.defeated
    } else {
        false
    };

    let report = AttackReport {
        attacker: attacker.name().to_owned(),
        attacker_key: attacker.key.clone(),
        target: target.name().to_owned(),
        target_key: target.key.clone(),
        weapon: weapon.name,
        verb: weapon.verb,
        mode,
        rolls,
        natural,
        to_hit: weapon.to_hit,
        ac: target.sheet.ac,
        verdict,
        damage_expr: weapon.damage,
        damage,
        defeated,
    };
    info!(
        attacker = %report.attacker_key,
        target = %report.target_key,
        natural,
        verdict = %verdict,
        damage = if verdict.lands() { damage } else { 0 },
        "attack resolved"
    );
    world.log_battle(clock.now(), report.to_string());
    Ok(report)
}
