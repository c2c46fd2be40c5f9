//! The entity store: every character in the session, keyed by unique slug.

use std::collections::HashMap;

use gmconsole_core::error::DomainError;

use super::character::{Character, CharacterSheet, Role};

/// Ordered store of characters with a key index.
///
/// Store order matters: it breaks initiative ties and picks the first match
/// when looking characters up by display name.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entities: Vec<Character>,
    index: HashMap<String, usize>,
}

impl Roster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a roster from loaded sheets. In-party sheets become party
    /// members, the rest become templates. Everyone starts at full health.
    #[must_use]
    pub fn from_sheets(sheets: Vec<CharacterSheet>) -> Self {
        let mut roster = Self::new();
        for sheet in sheets {
            let role = if sheet.in_party {
                Role::Party
            } else {
                Role::Template
            };
            let cur_hp = sheet.hp;
            roster.insert(sheet, role, cur_hp);
        }
        roster
    }

    /// Rebuilds from fresh sheets while keeping live state from `self`:
    /// party and template health carries over by key, and NPC instances are
    /// re-added (re-keyed only if their key is now taken).
    #[must_use]
    pub fn reloaded(&self, sheets: Vec<CharacterSheet>) -> Self {
        let mut roster = Self::from_sheets(sheets);
        for entity in &mut roster.entities {
            if let Some(previous) = self.get(&entity.key) {
                if previous.name() == entity.name() {
                    entity.cur_hp = previous.cur_hp;
                }
            }
        }
        for npc in self.npcs() {
            let key = if roster.index.contains_key(&npc.key) {
                roster.make_key(npc.name())
            } else {
                npc.key.clone()
            };
            roster.push(Character {
                key,
                ..npc.clone()
            });
        }
        roster
    }

    /// Derives a unique key from a display name: the first three characters,
    /// lower-cased, spaces as `-`, suffixed `1`, `2`, ... on collision.
    #[must_use]
    pub fn make_key(&self, name: &str) -> String {
        let mut prefix: String = name
            .chars()
            .take(3)
            .collect::<String>()
            .to_lowercase()
            .replace(' ', "-");
        if prefix.is_empty() {
            prefix.push('x');
        }
        if !self.index.contains_key(&prefix) {
            return prefix;
        }
        (1_u32..)
            .map(|n| format!("{prefix}{n}"))
            .find(|candidate| !self.index.contains_key(candidate))
            .unwrap_or(prefix)
    }

    fn insert(&mut self, sheet: CharacterSheet, role: Role, cur_hp: i32) -> &Character {
        let key = self.make_key(&sheet.name);
        self.push(Character {
            key,
            role,
            cur_hp,
            sheet,
        })
    }

    fn push(&mut self, character: Character) -> &Character {
        let slot = self.entities.len();
        self.index.insert(character.key.clone(), slot);
        self.entities.push(character);
        &self.entities[slot]
    }

    fn reindex(&mut self) {
        self.index = self
            .entities
            .iter()
            .enumerate()
            .map(|(slot, c)| (c.key.clone(), slot))
            .collect();
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Character> {
        self.index.get(key).map(|&slot| &self.entities[slot])
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Character> {
        self.index.get(key).map(|&slot| &mut self.entities[slot])
    }

    /// Looks up by key, falling back to the first character with that name.
    #[must_use]
    pub fn find(&self, key_or_name: &str) -> Option<&Character> {
        self.get(key_or_name)
            .or_else(|| self.entities.iter().find(|c| c.name() == key_or_name))
    }

    /// Like [`Roster::find`] but returns the key, or `EntityNotFound`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EntityNotFound` when nothing matches.
    pub fn resolve(&self, key_or_name: &str) -> Result<String, DomainError> {
        self.find(key_or_name)
            .map(|c| c.key.clone())
            .ok_or_else(|| DomainError::EntityNotFound(key_or_name.to_owned()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.entities.iter()
    }

    pub fn party(&self) -> impl Iterator<Item = &Character> {
        self.entities.iter().filter(|c| c.is_party())
    }

    pub fn npcs(&self) -> impl Iterator<Item = &Character> {
        self.entities.iter().filter(|c| c.is_npc())
    }

    pub fn templates(&self) -> impl Iterator<Item = &Character> {
        self.entities.iter().filter(|c| c.role == Role::Template)
    }

    /// Party members and NPC instances, in store order.
    pub fn participants(&self) -> impl Iterator<Item = &Character> {
        self.entities.iter().filter(|c| c.is_participant())
    }

    /// Spawns an NPC instance cloned from the template or NPC matching
    /// `key_or_name`. The clone gets a fresh key and full health.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` for an unknown key and `Validation` when the
    /// source is a party member.
    pub fn spawn(&mut self, key_or_name: &str) -> Result<&Character, DomainError> {
        let source = self
            .find(key_or_name)
            .ok_or_else(|| DomainError::EntityNotFound(key_or_name.to_owned()))?;
        if source.is_party() {
            return Err(DomainError::Validation(format!(
                "{} is a party member and cannot be dropped",
                source.name()
            )));
        }
        let sheet = source.sheet.clone();
        let hp = sheet.hp;
        Ok(self.insert(sheet, Role::Npc, hp))
    }

    /// Removes every NPC instance. Returns how many were removed.
    pub fn clear_npcs(&mut self) -> usize {
        let before = self.entities.len();
        self.entities.retain(|c| !c.is_npc());
        let removed = before - self.entities.len();
        if removed > 0 {
            self.reindex();
        }
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
