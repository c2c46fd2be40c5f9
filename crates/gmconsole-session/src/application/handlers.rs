//! Operator command handlers.
//!
//! Argument counts are checked by the table before a handler runs, so a
//! handler only validates argument contents.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Write as _;

use gmconsole_core::clock;
use gmconsole_core::command::CommandLine;
use gmconsole_core::error::DomainError;
use gmconsole_dice::DiceExpr;
use tracing::info;

use super::autofight::{self, AutoAttack, TurnPlan};
use super::combat::{self, AdvantageSpec, RollMode};
use super::interpreter::{Arity, CommandSpec, CommandTable, Outcome};
use super::session::Session;
use crate::domain::character::Character;
use crate::domain::tables::level_for_experience;

const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "roll",
        aliases: &["r"],
        arity: Arity::between(1, 2),
        usage: "roll <dice> [twice]",
        handler: roll,
    },
    CommandSpec {
        name: "rollq",
        aliases: &["rq"],
        arity: Arity::exactly(1),
        usage: "rollq <dice>",
        handler: roll_quietly,
    },
    CommandSpec {
        name: "c",
        aliases: &[],
        arity: Arity::exactly(0),
        usage: "c",
        handler: clear_message,
    },
    CommandSpec {
        name: "msg",
        aliases: &[],
        arity: Arity::at_least(0),
        usage: "msg <text...>",
        handler: message,
    },
    CommandSpec {
        name: "autof",
        aliases: &[],
        arity: Arity::exactly(0),
        usage: "autof",
        handler: start_auto_fight,
    },
    CommandSpec {
        name: "ant",
        aliases: &[],
        arity: Arity::exactly(0),
        usage: "ant",
        handler: auto_next_attack,
    },
    CommandSpec {
        name: "nt",
        aliases: &[],
        arity: Arity::exactly(0),
        usage: "nt",
        handler: next_turn,
    },
    CommandSpec {
        name: "pt",
        aliases: &[],
        arity: Arity::exactly(0),
        usage: "pt",
        handler: previous_turn,
    },
    CommandSpec {
        name: "combat",
        aliases: &[],
        arity: Arity::at_least(0),
        usage: "combat [key=adv|dis ...]",
        handler: start_combat,
    },
    CommandSpec {
        name: "endcombat",
        aliases: &[],
        arity: Arity::exactly(0),
        usage: "endcombat",
        handler: end_combat,
    },
    CommandSpec {
        name: "att",
        aliases: &[],
        arity: Arity::between(2, 3),
        usage: "att <key>.<attack> <target> [adv|dis]",
        handler: attack,
    },
    CommandSpec {
        name: "blog",
        aliases: &[],
        arity: Arity::exactly(0),
        usage: "blog",
        handler: battle_log,
    },
    CommandSpec {
        name: "drop",
        aliases: &[],
        arity: Arity::exactly(1),
        usage: "drop <key>",
        handler: drop_npc,
    },
    CommandSpec {
        name: "dropran",
        aliases: &[],
        arity: Arity::exactly(0),
        usage: "dropran",
        handler: drop_random,
    },
    CommandSpec {
        name: "clearnpcs",
        aliases: &[],
        arity: Arity::exactly(0),
        usage: "clearnpcs",
        handler: clear_npcs,
    },
    CommandSpec {
        name: "scene",
        aliases: &["s"],
        arity: Arity::between(0, 1),
        usage: "scene [key]",
        handler: scene,
    },
    CommandSpec {
        name: "place",
        aliases: &["p"],
        arity: Arity::exactly(1),
        usage: "place <key>",
        handler: place,
    },
    CommandSpec {
        name: "v",
        aliases: &[],
        arity: Arity::exactly(1),
        usage: "v <character>",
        handler: view_character,
    },
    CommandSpec {
        name: "vo",
        aliases: &[],
        arity: Arity::exactly(1),
        usage: "vo <object>",
        handler: view_object,
    },
    CommandSpec {
        name: "sethp",
        aliases: &[],
        arity: Arity::exactly(2),
        usage: "sethp <key> <hp>",
        handler: set_hp,
    },
    CommandSpec {
        name: "addhp",
        aliases: &[],
        arity: Arity::exactly(2),
        usage: "addhp <key> <amount>",
        handler: add_hp,
    },
    CommandSpec {
        name: "subhp",
        aliases: &[],
        arity: Arity::exactly(2),
        usage: "subhp <key> <amount>",
        handler: sub_hp,
    },
    CommandSpec {
        name: "t",
        aliases: &[],
        arity: Arity::exactly(0),
        usage: "t",
        handler: toggle_text,
    },
    CommandSpec {
        name: "sp",
        aliases: &[],
        arity: Arity::exactly(0),
        usage: "sp",
        handler: toggle_party,
    },
    CommandSpec {
        name: "snp",
        aliases: &[],
        arity: Arity::exactly(0),
        usage: "snp",
        handler: toggle_npcs,
    },
    CommandSpec {
        name: "smugs",
        aliases: &[],
        arity: Arity::exactly(0),
        usage: "smugs",
        handler: toggle_mugs,
    },
    CommandSpec {
        name: "ls",
        aliases: &[],
        arity: Arity::between(0, 1),
        usage: "ls [places|chars|scenes|objs]",
        handler: list,
    },
    CommandSpec {
        name: "stat",
        aliases: &["status"],
        arity: Arity::exactly(0),
        usage: "stat",
        handler: status,
    },
    CommandSpec {
        name: "reload",
        aliases: &["re"],
        arity: Arity::exactly(0),
        usage: "reload",
        handler: reload,
    },
    CommandSpec {
        name: "reset",
        aliases: &[],
        arity: Arity::exactly(0),
        usage: "reset",
        handler: reset,
    },
];

/// Registers every operator command.
pub fn register_all(table: &mut CommandTable) {
    for spec in COMMANDS {
        table.register(*spec);
    }
}

fn arg<'a>(line: &'a CommandLine, index: usize) -> Result<&'a str, DomainError> {
    line.arg(index)
        .ok_or_else(|| DomainError::InvalidArgument(format!("{} needs argument {}", line.name, index + 1)))
}

fn number(raw: &str) -> Result<i32, DomainError> {
    raw.parse()
        .map_err(|_| DomainError::InvalidNumber(raw.to_owned()))
}

fn require_combat(session: &Session) -> Result<(), DomainError> {
    if session.world.turns.is_active() {
        Ok(())
    } else {
        Err(DomainError::Validation("no combat in progress".to_owned()))
    }
}

// --- dice ---

fn roll(session: &mut Session, line: &CommandLine) -> Result<Outcome, DomainError> {
    let expr = DiceExpr::parse(arg(line, 0)?)?;
    let first = session.roll(&expr);
    let text = if line.args.len() > 1 {
        let second = session.roll(&expr);
        format!("Rolling {expr} twice: {first}, {second}")
    } else {
        format!("Rolling {expr}: {first}")
    };
    Ok(Outcome::Message(text))
}

fn roll_quietly(session: &mut Session, line: &CommandLine) -> Result<Outcome, DomainError> {
    let expr = DiceExpr::parse(arg(line, 0)?)?;
    let total = session.roll(&expr);
    Ok(Outcome::Listing(format!("{expr}: {total}")))
}

// --- messages ---

fn clear_message(_: &mut Session, _: &CommandLine) -> Result<Outcome, DomainError> {
    Ok(Outcome::Refresh)
}

fn message(_: &mut Session, line: &CommandLine) -> Result<Outcome, DomainError> {
    Ok(Outcome::Message(line.raw_args.clone()))
}

// --- combat ---

fn start_combat(session: &mut Session, line: &CommandLine) -> Result<Outcome, DomainError> {
    let spec = AdvantageSpec::parse(&line.args);
    let (world, oracle, _) = session.parts();
    if combat::roll_initiative(world, oracle, &spec) == 0 {
        return Ok(Outcome::Message("Nobody is here to fight.".to_owned()));
    }
    Ok(Outcome::Refresh)
}

fn end_combat(session: &mut Session, _: &CommandLine) -> Result<Outcome, DomainError> {
    session.world.end_combat();
    info!("combat ended");
    Ok(Outcome::Refresh)
}

fn next_turn(session: &mut Session, _: &CommandLine) -> Result<Outcome, DomainError> {
    require_combat(session)?;
    session.world.turns.advance();
    Ok(Outcome::Refresh)
}

fn previous_turn(session: &mut Session, _: &CommandLine) -> Result<Outcome, DomainError> {
    require_combat(session)?;
    session.world.turns.retreat();
    Ok(Outcome::Refresh)
}

/// `att <key>.<attack> <target> [adv|dis]`
fn attack(session: &mut Session, line: &CommandLine) -> Result<Outcome, DomainError> {
    let spec = arg(line, 0)?;
    let (attacker, index) = spec
        .split_once('.')
        .ok_or_else(|| DomainError::InvalidArgument(format!("expected <key>.<attack>, got {spec}")))?;
    let index: usize = index
        .parse()
        .map_err(|_| DomainError::InvalidNumber(index.to_owned()))?;
    let target = arg(line, 1)?;
    let mode = line
        .arg(2)
        .map_or(Ok(RollMode::Normal), |m| m.parse::<RollMode>())?;

    let (world, oracle, clock) = session.parts();
    let report = combat::attack(world, oracle, clock, attacker, index, target, mode)?;
    Ok(Outcome::Battle {
        narration: report.to_string(),
        attacker: report.attacker_key,
        target: report.target_key,
    })
}

fn start_auto_fight(session: &mut Session, _: &CommandLine) -> Result<Outcome, DomainError> {
    require_combat(session)?;
    Ok(Outcome::StartAutoFight)
}

/// One automatic attack by whoever holds the current turn. For an NPC turn
/// only the first living instance attacks.
fn auto_next_attack(session: &mut Session, _: &CommandLine) -> Result<Outcome, DomainError> {
    let (occupant, attackers) = match autofight::plan_turn(&session.world) {
        TurnPlan::Stop(reason) => return Err(DomainError::Validation(reason.to_string())),
        TurnPlan::Act {
            occupant,
            attackers,
        } => (occupant, attackers),
    };
    let Some(first) = attackers.first() else {
        return Ok(Outcome::Message(format!("{occupant} cannot act.")));
    };
    let (world, oracle, clock) = session.parts();
    Ok(match autofight::auto_attack(world, oracle, clock, first)? {
        AutoAttack::Attacked(report) => Outcome::Battle {
            narration: report.to_string(),
            attacker: report.attacker_key,
            target: report.target_key,
        },
        other => Outcome::Message(other.narration()),
    })
}

fn battle_log(session: &mut Session, _: &CommandLine) -> Result<Outcome, DomainError> {
    if session.world.battle_log.is_empty() {
        return Ok(Outcome::Overlay("The battle log is empty.".to_owned()));
    }
    let mut text = String::new();
    for entry in &session.world.battle_log {
        let _ = writeln!(text, "[{}] {}", clock::stamp(entry.at), entry.text);
    }
    Ok(Outcome::Overlay(text.trim_end().to_owned()))
}

// --- npcs ---

fn drop_npc(session: &mut Session, line: &CommandLine) -> Result<Outcome, DomainError> {
    session.world.drop_npc(arg(line, 0)?)?;
    Ok(Outcome::Refresh)
}

fn drop_random(session: &mut Session, _: &CommandLine) -> Result<Outcome, DomainError> {
    let templates: Vec<String> = session
        .world
        .roster
        .templates()
        .map(|c| c.key.clone())
        .collect();
    let key = session
        .pick(templates.len())
        .and_then(|i| templates.get(i))
        .ok_or_else(|| DomainError::Validation("no templates to drop".to_owned()))?;
    session.world.drop_npc(key)?;
    Ok(Outcome::Refresh)
}

fn clear_npcs(session: &mut Session, _: &CommandLine) -> Result<Outcome, DomainError> {
    let removed = session.world.roster.clear_npcs();
    info!(removed, "npcs cleared");
    Ok(Outcome::Refresh)
}

// --- places and scenes ---

fn scene(session: &mut Session, line: &CommandLine) -> Result<Outcome, DomainError> {
    session.world.set_scene(line.arg(0))?;
    Ok(Outcome::Refresh)
}

fn place(session: &mut Session, line: &CommandLine) -> Result<Outcome, DomainError> {
    session.world.set_place(arg(line, 0)?)?;
    Ok(Outcome::Refresh)
}

// --- detail views ---

/// Plain-text character sheet, as shown by `v`.
#[must_use]
pub fn describe_character(c: &Character) -> String {
    let sheet = &c.sheet;
    let kind: Vec<&str> = [&sheet.alignment, &sheet.race, &sheet.class]
        .into_iter()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect();
    let mut text = format!(
        "{} ({})\n{}, level {}\nAC {}  HP {}/{}  Initiative {:+}",
        c.name(),
        c.key,
        kind.join(" "),
        sheet.level,
        sheet.ac,
        c.cur_hp,
        sheet.hp,
        sheet.initiative
    );
    text.push('\n');
    let abilities: Vec<String> = sheet
        .abilities
        .rows()
        .iter()
        .map(|(label, score, modifier)| format!("{label} {score} ({modifier:+})"))
        .collect();
    text.push_str(&abilities.join("  "));
    for (i, a) in sheet.attacks.iter().enumerate() {
        let _ = write!(text, "\n{i}: {} {:+} {}", a.name, a.to_hit, a.damage);
        if !a.damage_type.is_empty() {
            let _ = write!(text, " {}", a.damage_type);
        }
    }
    if !sheet.desc.is_empty() {
        let _ = write!(text, "\n{}", sheet.desc);
    }
    text
}

fn view_character(session: &mut Session, line: &CommandLine) -> Result<Outcome, DomainError> {
    let key = arg(line, 0)?;
    let character = session
        .world
        .roster
        .find(key)
        .ok_or_else(|| DomainError::EntityNotFound(key.to_owned()))?;
    Ok(Outcome::Overlay(describe_character(character)))
}

fn view_object(session: &mut Session, line: &CommandLine) -> Result<Outcome, DomainError> {
    let key = arg(line, 0)?;
    let object = session
        .world
        .content
        .object(key)
        .ok_or_else(|| DomainError::EntityNotFound(format!("object {key}")))?;
    let mut text = format!("{} (weight {})", object.name, object.weight);
    if !object.desc.is_empty() {
        let _ = write!(text, "\n{}", object.desc);
    }
    if !object.contains.is_empty() {
        let _ = write!(text, "\nContains: {}", object.contains.join(", "));
    }
    Ok(Outcome::Overlay(text))
}

// --- hit points ---

fn hp_outcome(session: &Session, defeated: bool, key: &str) -> Outcome {
    match session.world.roster.get(key) {
        Some(c) if defeated => Outcome::Message(format!("{} falls!", c.name())),
        _ => Outcome::Refresh,
    }
}

fn set_hp(session: &mut Session, line: &CommandLine) -> Result<Outcome, DomainError> {
    let hp = number(arg(line, 1)?)?;
    let change = session.world.set_hp(arg(line, 0)?, hp)?;
    Ok(hp_outcome(session, change.defeated, &change.key))
}

fn add_hp(session: &mut Session, line: &CommandLine) -> Result<Outcome, DomainError> {
    let delta = number(arg(line, 1)?)?;
    let change = session.world.adjust_hp(arg(line, 0)?, delta)?;
    Ok(hp_outcome(session, change.defeated, &change.key))
}

fn sub_hp(session: &mut Session, line: &CommandLine) -> Result<Outcome, DomainError> {
    let delta = number(arg(line, 1)?)?;
    let change = session
        .world
        .adjust_hp(arg(line, 0)?, delta.saturating_neg())?;
    Ok(hp_outcome(session, change.defeated, &change.key))
}

// --- view toggles ---

fn toggle_text(session: &mut Session, _: &CommandLine) -> Result<Outcome, DomainError> {
    session.world.view.no_text = !session.world.view.no_text;
    Ok(Outcome::Refresh)
}

fn toggle_party(session: &mut Session, _: &CommandLine) -> Result<Outcome, DomainError> {
    session.world.view.show_party = !session.world.view.show_party;
    Ok(Outcome::Refresh)
}

fn toggle_npcs(session: &mut Session, _: &CommandLine) -> Result<Outcome, DomainError> {
    session.world.view.show_npcs = !session.world.view.show_npcs;
    Ok(Outcome::Refresh)
}

fn toggle_mugs(session: &mut Session, _: &CommandLine) -> Result<Outcome, DomainError> {
    session.world.view.show_mugs = !session.world.view.show_mugs;
    Ok(Outcome::Refresh)
}

// --- listings ---

fn character_line(c: &Character) -> String {
    format!("{}: {} ({}/{})", c.key, c.name(), c.cur_hp, c.sheet.hp)
}

fn list(session: &mut Session, line: &CommandLine) -> Result<Outcome, DomainError> {
    let world = &session.world;
    let lines: Vec<String> = match line.arg(0) {
        None | Some("npcs") => world.roster.npcs().map(character_line).collect(),
        Some("chars") => world.roster.iter().map(character_line).collect(),
        Some("places") => world
            .content
            .places
            .iter()
            .map(|p| format!("{}: {}", p.key, p.name))
            .collect(),
        Some("scenes") => world
            .content
            .scenes
            .iter()
            .map(|s| format!("{}: {}", s.key, s.desc))
            .collect(),
        Some("objs") => world
            .content
            .objects
            .iter()
            .map(|o| format!("{}: {}", o.key, o.name))
            .collect(),
        Some(other) => {
            return Err(DomainError::InvalidArgument(format!(
                "cannot list {other}; expected places, chars, scenes or objs"
            )));
        }
    };
    Ok(Outcome::Listing(lines.join("\n")))
}

fn status(session: &mut Session, _: &CommandLine) -> Result<Outcome, DomainError> {
    let world = &session.world;
    let mut text = String::new();
    let place_name = world
        .content
        .place(&world.place)
        .map_or("", |p| p.name.as_str());
    let _ = writeln!(text, "place: {} {place_name}", world.place);
    let _ = writeln!(text, "scene: {}", world.scene.as_deref().unwrap_or("none"));
    let _ = writeln!(
        text,
        "experience: {} (level {})",
        world.experience,
        level_for_experience(world.experience)
    );
    let standing = world.roster.npcs().filter(|c| c.is_alive()).count();
    let _ = writeln!(
        text,
        "npcs: {} ({standing} standing)",
        world.roster.npcs().count()
    );
    if world.turns.is_active() {
        text.push_str("initiative:");
        for (i, entry) in world.turns.entries().iter().enumerate() {
            let marker = if i + 1 == world.turns.current_index() {
                '>'
            } else {
                ' '
            };
            let _ = write!(text, "\n {marker} {entry}");
        }
    } else {
        text.push_str("initiative: idle");
    }
    Ok(Outcome::Listing(text))
}

// --- content ---

fn reload(session: &mut Session, _: &CommandLine) -> Result<Outcome, DomainError> {
    session.reload()?;
    Ok(Outcome::Refresh)
}

fn reset(session: &mut Session, _: &CommandLine) -> Result<Outcome, DomainError> {
    session.reset()?;
    Ok(Outcome::Refresh)
}

#[cfg(test)]
mod tests {
    use gmconsole_core::command::Origin;

    use super::*;
    use crate::fixtures::session_with_rolls;

    fn run(session: &mut Session, raw: &str) -> Result<Outcome, DomainError> {
        CommandTable::standard().dispatch(session, &CommandLine::parse(raw).unwrap())
    }

    fn exec(session: &mut Session, raw: &str) -> Outcome {
        CommandTable::standard().execute(session, &CommandLine::parse(raw).unwrap(), Origin::Console)
    }

    // --- dice tests ---

    #[test]
    fn test_roll_shows_total() {
        let mut session = session_with_rolls(vec![4]);
        assert_eq!(
            run(&mut session, "roll 1d6+2"),
            Ok(Outcome::Message("Rolling 1d6+2: 6".to_owned()))
        );
    }

    #[test]
    fn test_roll_twice() {
        let mut session = session_with_rolls(vec![3, 17]);
        assert_eq!(
            run(&mut session, "r d20 twice"),
            Ok(Outcome::Message("Rolling 1d20 twice: 3, 17".to_owned()))
        );
    }

    #[test]
    fn test_roll_bad_syntax_is_invalid_dice() {
        let mut session = session_with_rolls(vec![]);
        assert!(matches!(
            run(&mut session, "roll 3x"),
            Err(DomainError::InvalidDice(_))
        ));
    }

    #[test]
    fn test_rollq_is_operator_only() {
        let mut session = session_with_rolls(vec![9]);
        assert_eq!(
            run(&mut session, "rq 1d20"),
            Ok(Outcome::Listing("1d20: 9".to_owned()))
        );
    }

    #[test]
    fn test_msg_keeps_raw_args() {
        let mut session = session_with_rolls(vec![]);
        assert_eq!(
            run(&mut session, "msg  the   door creaks"),
            Ok(Outcome::Message("the door creaks".to_owned()))
        );
    }

    // --- combat tests ---

    #[test]
    fn test_combat_then_turns_wrap() {
        let mut session = session_with_rolls(vec![10, 12, 5]);
        run(&mut session, "drop gob").unwrap();
        run(&mut session, "combat").unwrap();

        assert_eq!(session.world.turns.slot_count(), 4);
        assert_eq!(session.world.turns.current_index(), 1);
        run(&mut session, "nt").unwrap();
        run(&mut session, "nt").unwrap();
        run(&mut session, "nt").unwrap();
        assert_eq!(session.world.turns.current_index(), 1);
        run(&mut session, "pt").unwrap();
        assert_eq!(session.world.turns.current_index(), 1);
    }

    #[test]
    fn test_turns_without_combat_are_rejected() {
        let mut session = session_with_rolls(vec![]);
        assert!(matches!(run(&mut session, "nt"), Err(DomainError::Validation(_))));
        assert!(matches!(run(&mut session, "autof"), Err(DomainError::Validation(_))));
        assert_eq!(session.world.turns.current_index(), 0);
    }

    #[test]
    fn test_endcombat_resets_turn_state() {
        let mut session = session_with_rolls(vec![10, 12, 15, 4, 3]);
        run(&mut session, "combat").unwrap();
        run(&mut session, "att ari.0 bre").unwrap();

        assert_eq!(run(&mut session, "endcombat"), Ok(Outcome::Refresh));

        assert!(session.world.turns.entries().is_empty());
        assert_eq!(session.world.turns.current_index(), 0);
        assert!(session.world.battle_log.is_empty());
    }

    #[test]
    fn test_att_returns_battle_outcome() {
        let mut session = session_with_rolls(vec![15, 4, 3]);
        let gob = session.world.drop_npc("gob").unwrap();

        let outcome = run(&mut session, &format!("att ari.0 {gob}")).unwrap();

        let Outcome::Battle {
            narration,
            attacker,
            target,
        } = outcome
        else {
            panic!("expected a battle");
        };
        assert_eq!(attacker, "ari");
        assert_eq!(target, gob);
        assert!(narration.contains("vs AC 13: HIT!"));
        assert_eq!(session.world.hp(&gob).unwrap(), 2);
    }

    #[test]
    fn test_att_with_disadvantage() {
        let mut session = session_with_rolls(vec![18, 2, 3]);
        let gob = session.world.drop_npc("gob").unwrap();

        run(&mut session, &format!("att ari.0 {gob} dis")).unwrap();

        assert_eq!(session.world.hp(&gob).unwrap(), 7);
    }

    #[test]
    fn test_att_malformed_specs() {
        let mut session = session_with_rolls(vec![]);
        assert!(matches!(
            run(&mut session, "att ari bre"),
            Err(DomainError::InvalidArgument(_))
        ));
        assert_eq!(
            run(&mut session, "att ari.x bre"),
            Err(DomainError::InvalidNumber("x".to_owned()))
        );
        assert!(matches!(
            run(&mut session, "att ari.0 bre sideways"),
            Err(DomainError::InvalidArgument(_))
        ));
        assert!(session.world.battle_log.is_empty());
    }

    #[test]
    fn test_ant_attacks_for_current_occupant() {
        // initiative: Aria 19+1, Bren 1+2, Goblin 1; then pick goblin, d20 15, 2, dmg 4.
        let mut session = session_with_rolls(vec![19, 1, 1, 1, 15, 2, 4]);
        let gob = session.world.drop_npc("gob").unwrap();
        run(&mut session, "combat").unwrap();

        let outcome = run(&mut session, "ant").unwrap();

        assert!(matches!(outcome, Outcome::Battle { ref attacker, .. } if attacker == "ari"));
        assert_eq!(session.world.hp(&gob).unwrap(), 1);
    }

    #[test]
    fn test_ant_without_combat_is_rejected() {
        let mut session = session_with_rolls(vec![]);
        assert_eq!(
            run(&mut session, "ant"),
            Err(DomainError::Validation("no combat in progress".to_owned()))
        );
    }

    #[test]
    fn test_autof_requests_scheduler() {
        let mut session = session_with_rolls(vec![5, 5]);
        run(&mut session, "combat").unwrap();
        assert_eq!(run(&mut session, "autof"), Ok(Outcome::StartAutoFight));
    }

    #[test]
    fn test_blog_lists_stamped_entries() {
        let mut session = session_with_rolls(vec![7, 19, 6]);
        run(&mut session, "att ari.0 ari").unwrap();

        let Ok(Outcome::Overlay(text)) = run(&mut session, "blog") else {
            panic!("expected overlay");
        };
        assert!(text.starts_with("[10:00:00] Aria attacks Aria with Shortsword"));
    }

    // --- npc tests ---

    #[test]
    fn test_drop_missing_key_leaves_npcs_untouched() {
        let mut session = session_with_rolls(vec![]);
        assert_eq!(exec(&mut session, "drop goblin"), Outcome::Unchanged);
        assert_eq!(session.world.roster.npcs().count(), 0);
    }

    #[test]
    fn test_drop_by_name_and_key() {
        let mut session = session_with_rolls(vec![]);
        run(&mut session, "drop gob").unwrap();
        run(&mut session, "drop Goblin").unwrap();
        let keys: Vec<&str> = session.world.roster.npcs().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["gob1", "gob2"]);
    }

    #[test]
    fn test_dropran_picks_a_template() {
        let mut session = session_with_rolls(vec![2]);
        run(&mut session, "dropran").unwrap();
        let names: Vec<&str> = session.world.roster.npcs().map(Character::name).collect();
        assert_eq!(names, vec!["Bat"]);
    }

    #[test]
    fn test_clearnpcs() {
        let mut session = session_with_rolls(vec![]);
        run(&mut session, "s ambush").unwrap();
        run(&mut session, "clearnpcs").unwrap();
        assert_eq!(session.world.roster.npcs().count(), 0);
        assert_eq!(session.world.scene.as_deref(), Some("ambush"));
    }

    // --- place and scene tests ---

    #[test]
    fn test_place_autodrops_and_scene_spawns() {
        let mut session = session_with_rolls(vec![]);
        run(&mut session, "p cave").unwrap();
        assert_eq!(session.world.roster.npcs().count(), 1);
        run(&mut session, "scene ambush").unwrap();
        assert_eq!(session.world.roster.npcs().count(), 2);
        run(&mut session, "scene").unwrap();
        assert!(session.world.scene.is_none());
    }

    #[test]
    fn test_unknown_place_is_not_found() {
        let mut session = session_with_rolls(vec![]);
        assert!(matches!(
            run(&mut session, "place moon"),
            Err(DomainError::EntityNotFound(_))
        ));
    }

    // --- hp tests ---

    #[test]
    fn test_hp_commands() {
        let mut session = session_with_rolls(vec![]);
        run(&mut session, "sethp ari 12").unwrap();
        run(&mut session, "addhp Aria 3").unwrap();
        run(&mut session, "subhp ari 20").unwrap();
        assert_eq!(session.world.hp("ari").unwrap(), -5);
    }

    #[test]
    fn test_hp_bad_number() {
        let mut session = session_with_rolls(vec![]);
        assert_eq!(
            run(&mut session, "sethp ari lots"),
            Err(DomainError::InvalidNumber("lots".to_owned()))
        );
        assert_eq!(session.world.hp("ari").unwrap(), 20);
    }

    #[test]
    fn test_npc_knocked_down_announces_fall() {
        let mut session = session_with_rolls(vec![]);
        let gob = session.world.drop_npc("gob").unwrap();
        assert_eq!(
            run(&mut session, &format!("subhp {gob} 7")),
            Ok(Outcome::Message("Goblin falls!".to_owned()))
        );
        assert_eq!(session.world.experience, 100);
    }

    // --- view tests ---

    #[test]
    fn test_toggles_flip_flags() {
        let mut session = session_with_rolls(vec![]);
        for cmd in ["t", "sp", "snp", "smugs"] {
            run(&mut session, cmd).unwrap();
        }
        let view = session.world.view;
        assert!(view.no_text);
        assert!(!view.show_party);
        assert!(!view.show_npcs);
        assert!(!view.show_mugs);
    }

    #[test]
    fn test_view_character_overlay() {
        let mut session = session_with_rolls(vec![]);
        let Ok(Outcome::Overlay(text)) = run(&mut session, "v ari") else {
            panic!("expected overlay");
        };
        assert!(text.starts_with("Aria (ari)\nHuman Fighter, level 3\n"));
        assert!(text.contains("AC 15  HP 20/20"));
        assert!(text.contains("0: Shortsword +5 1d6+2"));
    }

    #[test]
    fn test_view_object_overlay() {
        let mut session = session_with_rolls(vec![]);
        assert_eq!(
            run(&mut session, "vo chest"),
            Ok(Outcome::Overlay("Iron chest (weight 40)".to_owned()))
        );
        assert!(run(&mut session, "vo sword").is_err());
    }

    // --- listing tests ---

    #[test]
    fn test_ls_defaults_to_npcs() {
        let mut session = session_with_rolls(vec![]);
        run(&mut session, "drop bat").unwrap();
        assert_eq!(
            run(&mut session, "ls"),
            Ok(Outcome::Listing("bat1: Bat (3/3)".to_owned()))
        );
        assert_eq!(
            run(&mut session, "ls places"),
            Ok(Outcome::Listing("cave: Whispering Cave\ntown: Millbrook".to_owned()))
        );
        assert!(run(&mut session, "ls dragons").is_err());
    }

    #[test]
    fn test_stat_marks_current_turn() {
        let mut session = session_with_rolls(vec![10, 12]);
        run(&mut session, "combat").unwrap();

        let Ok(Outcome::Listing(text)) = run(&mut session, "status") else {
            panic!("expected listing");
        };
        assert!(text.contains("place: void"));
        assert!(text.contains("scene: none"));
        assert!(text.contains("> Bren (14)"));
        assert!(text.contains("  Aria (11)"));
    }

    // --- content tests ---

    #[test]
    fn test_reset_restores_everything() {
        let mut session = session_with_rolls(vec![]);
        run(&mut session, "p cave").unwrap();
        run(&mut session, "reset").unwrap();
        assert_eq!(session.world.place, "void");
        assert_eq!(session.world.roster.npcs().count(), 0);
    }

    #[test]
    fn test_reload_keeps_npcs() {
        let mut session = session_with_rolls(vec![]);
        run(&mut session, "drop gob").unwrap();
        run(&mut session, "re").unwrap();
        assert_eq!(session.world.roster.npcs().count(), 1);
    }
}
