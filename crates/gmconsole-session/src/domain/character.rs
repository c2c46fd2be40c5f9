//! Characters: party members, templates and spawned NPC instances.

use serde::{Deserialize, Serialize};

use super::tables::ability_modifier;

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Abilities {
    #[serde(alias = "str", alias = "Str")]
    pub strength: i32,
    #[serde(alias = "dex", alias = "Dex")]
    pub dexterity: i32,
    #[serde(alias = "con", alias = "Con")]
    pub constitution: i32,
    #[serde(alias = "int", alias = "Int")]
    pub intelligence: i32,
    #[serde(alias = "wis", alias = "Wis")]
    pub wisdom: i32,
    #[serde(alias = "cha", alias = "Cha")]
    pub charisma: i32,
}

impl Default for Abilities {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
        }
    }
}

impl Abilities {
    /// `(label, score, modifier)` for each ability, in sheet order.
    #[must_use]
    pub fn rows(&self) -> [(&'static str, i32, i32); 6] {
        [
            ("Str", self.strength, ability_modifier(self.strength)),
            ("Dex", self.dexterity, ability_modifier(self.dexterity)),
            ("Con", self.constitution, ability_modifier(self.constitution)),
            ("Int", self.intelligence, ability_modifier(self.intelligence)),
            ("Wis", self.wisdom, ability_modifier(self.wisdom)),
            ("Cha", self.charisma, ability_modifier(self.charisma)),
        ]
    }
}

/// One attack a character can make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attack {
    #[serde(alias = "Name")]
    pub name: String,
    /// Added to the d20 attack roll.
    #[serde(alias = "hitbonus", alias = "Hitbonus")]
    pub to_hit: i32,
    /// Dice expression rolled on a hit.
    #[serde(alias = "damageroll", alias = "Damageroll")]
    pub damage: String,
    /// Narration verb, e.g. "slashes".
    #[serde(alias = "Verb")]
    pub verb: String,
    #[serde(alias = "Range")]
    pub range: String,
    #[serde(alias = "dtype", alias = "Dtype")]
    pub damage_type: String,
}

impl Default for Attack {
    fn default() -> Self {
        Self {
            name: "Unarmed strike".to_owned(),
            to_hit: 0,
            damage: "1d1".to_owned(),
            verb: "hits".to_owned(),
            range: String::new(),
            damage_type: String::new(),
        }
    }
}

/// A character sheet as loaded from content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterSheet {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Class")]
    pub class: String,
    #[serde(alias = "Race")]
    pub race: String,
    /// Character level; doubles as challenge rating for monsters.
    #[serde(alias = "Level")]
    pub level: i32,
    #[serde(alias = "inparty", alias = "InParty")]
    pub in_party: bool,
    #[serde(alias = "Image")]
    pub image: String,
    /// Initiative modifier.
    #[serde(alias = "Initiative")]
    pub initiative: i32,
    #[serde(alias = "AC")]
    pub ac: i32,
    #[serde(alias = "Alignment")]
    pub alignment: String,
    /// Maximum hit points.
    #[serde(alias = "HP")]
    pub hp: i32,
    #[serde(alias = "Desc")]
    pub desc: String,
    #[serde(alias = "Abilities")]
    pub abilities: Abilities,
    #[serde(alias = "Attacks")]
    pub attacks: Vec<Attack>,
    /// Object keys carried; dropped as loot on death.
    #[serde(alias = "Inventory")]
    pub inventory: Vec<String>,
    #[serde(alias = "playername", alias = "Playername")]
    pub player: Option<String>,
}

impl Default for CharacterSheet {
    fn default() -> Self {
        Self {
            name: String::new(),
            class: String::new(),
            race: String::new(),
            level: 1,
            in_party: false,
            image: String::new(),
            initiative: 0,
            ac: 10,
            alignment: String::new(),
            hp: 1,
            desc: String::new(),
            abilities: Abilities::default(),
            attacks: Vec::new(),
            inventory: Vec::new(),
            player: None,
        }
    }
}

/// What part a roster entry plays in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Controlled by a player.
    Party,
    /// Loaded from content; a blueprint for NPC instances.
    Template,
    /// A spawned instance, present in the current place or scene.
    Npc,
}

/// How badly hurt a character is, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wound {
    Unhurt,
    Light,
    Serious,
    Critical,
    Down,
}

impl Wound {
    /// CSS colour used by the renderer; empty when unhurt or down.
    #[must_use]
    pub fn colour(self) -> &'static str {
        match self {
            Self::Light => "green",
            Self::Serious => "yellow",
            Self::Critical => "red",
            Self::Unhurt | Self::Down => "",
        }
    }
}

/// A roster entry: a sheet plus live state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    /// Unique slug, assigned by the roster.
    pub key: String,
    pub role: Role,
    /// Current hit points. May go negative; dead is a state, not a removal.
    pub cur_hp: i32,
    pub sheet: CharacterSheet,
}

impl Character {
    /// Display name (not unique).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.sheet.name
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.cur_hp > 0
    }

    #[must_use]
    pub fn is_party(&self) -> bool {
        self.role == Role::Party
    }

    #[must_use]
    pub fn is_npc(&self) -> bool {
        self.role == Role::Npc
    }

    /// Party members and NPC instances take part in combat; templates do not.
    #[must_use]
    pub fn is_participant(&self) -> bool {
        matches!(self.role, Role::Party | Role::Npc)
    }

    #[must_use]
    pub fn wound(&self) -> Wound {
        if self.cur_hp <= 0 {
            return Wound::Down;
        }
        if self.cur_hp >= self.sheet.hp {
            return Wound::Unhurt;
        }
        // Compare in integer space: cur/hp > 0.8 <=> 5*cur > 4*hp.
        let cur = i64::from(self.cur_hp);
        let max = i64::from(self.sheet.hp.max(1));
        if 5 * cur > 4 * max {
            Wound::Light
        } else if 10 * cur > 3 * max {
            Wound::Serious
        } else {
            Wound::Critical
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_hp(cur_hp: i32, hp: i32) -> Character {
        Character {
            key: "gob".to_owned(),
            role: Role::Npc,
            cur_hp,
            sheet: CharacterSheet {
                name: "Goblin".to_owned(),
                hp,
                ..CharacterSheet::default()
            },
        }
    }

    #[test]
    fn test_wound_bands() {
        assert_eq!(with_hp(10, 10).wound(), Wound::Unhurt);
        assert_eq!(with_hp(9, 10).wound(), Wound::Light);
        assert_eq!(with_hp(8, 10).wound(), Wound::Serious);
        assert_eq!(with_hp(3, 10).wound(), Wound::Critical);
        assert_eq!(with_hp(0, 10).wound(), Wound::Down);
        assert_eq!(with_hp(-4, 10).wound(), Wound::Down);
    }

    #[test]
    fn test_sheet_deserializes_legacy_field_names() {
        let sheet: CharacterSheet = serde_json::from_str(
            r#"{
                "name": "Aria",
                "inparty": true,
                "playername": "sam",
                "hp": 24,
                "abilities": { "str": 16, "dex": 12 },
                "attacks": [ { "name": "Longsword", "hitbonus": 5, "damageroll": "1d8+3", "verb": "slashes" } ]
            }"#,
        )
        .unwrap();

        assert!(sheet.in_party);
        assert_eq!(sheet.player.as_deref(), Some("sam"));
        assert_eq!(sheet.abilities.strength, 16);
        assert_eq!(sheet.abilities.wisdom, 10);
        assert_eq!(sheet.attacks[0].to_hit, 5);
        assert_eq!(sheet.attacks[0].damage, "1d8+3");
        assert_eq!(sheet.ac, 10);
    }

    #[test]
    fn test_sheet_deserializes_capitalized_field_names() {
        let sheet: CharacterSheet = serde_json::from_str(
            r#"{
                "Name": "Bren",
                "Class": "Cleric",
                "Race": "Dwarf",
                "Level": 2,
                "InParty": true,
                "Playername": "kit",
                "Initiative": -1,
                "AC": 18,
                "HP": 17,
                "CurHP": 3,
                "Abilities": { "Str": 14, "Wis": 16 },
                "Attacks": [ { "Name": "Warhammer", "Hitbonus": 4, "Damageroll": "1d8+2", "Verb": "smites", "Dtype": "bludgeoning" } ],
                "Inventory": ["coins"]
            }"#,
        )
        .unwrap();

        assert_eq!(sheet.name, "Bren");
        assert_eq!(sheet.race, "Dwarf");
        assert_eq!(sheet.level, 2);
        assert!(sheet.in_party);
        assert_eq!(sheet.player.as_deref(), Some("kit"));
        assert_eq!(sheet.initiative, -1);
        assert_eq!(sheet.ac, 18);
        assert_eq!(sheet.hp, 17);
        assert_eq!(sheet.abilities.strength, 14);
        assert_eq!(sheet.abilities.wisdom, 16);
        assert_eq!(sheet.attacks[0].name, "Warhammer");
        assert_eq!(sheet.attacks[0].to_hit, 4);
        assert_eq!(sheet.attacks[0].damage_type, "bludgeoning");
        assert_eq!(sheet.inventory, vec!["coins"]);
    }

    #[test]
    fn test_ability_rows_carry_modifiers() {
        let abilities = Abilities {
            strength: 16,
            dexterity: 7,
            ..Abilities::default()
        };
        let rows = abilities.rows();
        assert_eq!(rows[0], ("Str", 16, 3));
        assert_eq!(rows[1], ("Dex", 7, -2));
        assert_eq!(rows[2], ("Con", 10, 0));
    }
}
