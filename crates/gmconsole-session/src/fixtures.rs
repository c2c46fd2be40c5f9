//! Shared content for unit tests.

use gmconsole_dice::LocalOracle;
use gmconsole_test_support::{SequenceRng, fixed_clock};

use crate::application::session::Session;
use crate::domain::character::{Attack, CharacterSheet};
use crate::domain::content::{Content, Object, Place, Placement, Scene};

fn attack(name: &str, to_hit: i32, damage: &str, verb: &str) -> Attack {
    Attack {
        name: name.to_owned(),
        to_hit,
        damage: damage.to_owned(),
        verb: verb.to_owned(),
        ..Attack::default()
    }
}

/// Two party members (Aria, Bren) and two templates (Goblin, Bat).
pub(crate) fn sample_content() -> Content {
    Content {
        places: vec![
            Place {
                key: "cave".to_owned(),
                name: "Whispering Cave".to_owned(),
                desc: "Water drips in the dark.".to_owned(),
                autodrop: vec!["bat".to_owned()],
                ..Place::default()
            },
            Place {
                key: "town".to_owned(),
                name: "Millbrook".to_owned(),
                desc: "A sleepy market town.".to_owned(),
                ..Place::default()
            },
        ],
        scenes: vec![Scene {
            key: "ambush".to_owned(),
            desc: "Goblins leap from the brush.".to_owned(),
            chars: vec!["gob".to_owned(), "gob".to_owned()],
            objects: vec![Placement {
                object: "chest".to_owned(),
                context: " half buried".to_owned(),
            }],
        }],
        objects: vec![
            Object {
                key: "dagger".to_owned(),
                name: "Rusty dagger".to_owned(),
                weight: 1,
                ..Object::default()
            },
            Object {
                key: "chest".to_owned(),
                name: "Iron chest".to_owned(),
                weight: 40,
                ..Object::default()
            },
        ],
        characters: vec![
            CharacterSheet {
                name: "Aria".to_owned(),
                class: "Fighter".to_owned(),
                race: "Human".to_owned(),
                level: 3,
                in_party: true,
                initiative: 1,
                ac: 15,
                hp: 20,
                attacks: vec![
                    attack("Shortsword", 5, "1d6+2", "stabs"),
                    attack("Shortbow", 4, "1d6", "shoots"),
                ],
                player: Some("sam".to_owned()),
                ..CharacterSheet::default()
            },
            CharacterSheet {
                name: "Bren".to_owned(),
                class: "Cleric".to_owned(),
                race: "Dwarf".to_owned(),
                level: 3,
                in_party: true,
                initiative: 2,
                ac: 12,
                hp: 16,
                attacks: vec![attack("Mace", 3, "1d6+1", "smashes")],
                player: Some("kim".to_owned()),
                ..CharacterSheet::default()
            },
            CharacterSheet {
                name: "Goblin".to_owned(),
                race: "Goblin".to_owned(),
                level: 1,
                initiative: 0,
                ac: 13,
                hp: 7,
                attacks: vec![attack("Scimitar", 4, "1d6+2", "slashes")],
                inventory: vec!["dagger".to_owned(), "ghost-item".to_owned()],
                ..CharacterSheet::default()
            },
            CharacterSheet {
                name: "Bat".to_owned(),
                race: "Beast".to_owned(),
                level: 0,
                ac: 12,
                hp: 3,
                attacks: vec![attack("Bite", 0, "1d1", "bites")],
                ..CharacterSheet::default()
            },
        ],
    }
}

/// A session over [`sample_content`] whose dice return `rolls` in order.
pub(crate) fn session_with_rolls(rolls: Vec<u32>) -> Session {
    Session::new(
        Box::new(sample_content()),
        Box::new(LocalOracle::new(SequenceRng::new(rolls))),
        Box::new(fixed_clock()),
    )
    .unwrap()
}
