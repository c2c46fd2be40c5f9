//! The whole mutable session state.

use chrono::{DateTime, Utc};
use gmconsole_core::error::DomainError;
use tracing::{debug, info, warn};

use super::character::Character;
use super::content::{Content, Placement};
use super::roster::Roster;
use super::tables::challenge_xp;
use super::turn_order::TurnOrder;

/// Place the session starts in before the operator picks one.
pub const START_PLACE: &str = "void";

/// What spectators get to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewFlags {
    /// Show only the place image, no text.
    pub no_text: bool,
    pub show_party: bool,
    pub show_npcs: bool,
    /// Show portraits rather than text-only cards.
    pub show_mugs: bool,
}

impl Default for ViewFlags {
    fn default() -> Self {
        Self {
            no_text: false,
            show_party: true,
            show_npcs: true,
            show_mugs: true,
        }
    }
}

/// One line of the battle log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleLogEntry {
    pub at: DateTime<Utc>,
    pub text: String,
}

/// Result of changing a character's hit points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HpChange {
    pub key: String,
    pub before: i32,
    pub after: i32,
    /// Set when an NPC went from standing to down with this change.
    pub defeated: bool,
}

#[derive(Debug, Clone)]
pub struct World {
    pub content: Content,
    pub roster: Roster,
    /// Current place key.
    pub place: String,
    /// Current scene key, if any.
    pub scene: Option<String>,
    pub view: ViewFlags,
    pub turns: TurnOrder,
    pub battle_log: Vec<BattleLogEntry>,
    /// Narration of the most recent attack.
    pub last_battle: Option<String>,
    /// Experience each party member has earned this session.
    pub experience: i32,
}

impl World {
    /// A fresh session over `content`.
    #[must_use]
    pub fn new(mut content: Content) -> Self {
        let roster = Roster::from_sheets(std::mem::take(&mut content.characters));
        Self {
            content,
            roster,
            place: START_PLACE.to_owned(),
            scene: None,
            view: ViewFlags::default(),
            turns: TurnOrder::default(),
            battle_log: Vec::new(),
            last_battle: None,
            experience: 0,
        }
    }

    /// Swaps in freshly loaded content, keeping NPCs, health and all other
    /// session state.
    pub fn reload(&mut self, mut content: Content) {
        self.roster = self
            .roster
            .reloaded(std::mem::take(&mut content.characters));
        self.content = content;
    }

    /// Moves the party: clears NPCs and the scene, then spawns the place's
    /// autodrop templates.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` for an unknown place; nothing changes then.
    pub fn set_place(&mut self, key: &str) -> Result<(), DomainError> {
        let autodrop = self
            .content
            .place(key)
            .map(|p| p.autodrop.clone())
            .ok_or_else(|| DomainError::EntityNotFound(format!("place {key}")))?;
        self.roster.clear_npcs();
        self.scene = None;
        key.clone_into(&mut self.place);
        self.drop_all(&autodrop);
        info!(place = key, npcs = self.roster.npcs().count(), "place changed");
        Ok(())
    }

    /// Starts a scene (or ends the current one with `None`): clears NPCs,
    /// then spawns the scene's characters.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` for an unknown scene; nothing changes then.
    pub fn set_scene(&mut self, key: Option<&str>) -> Result<(), DomainError> {
        let Some(key) = key else {
            self.roster.clear_npcs();
            self.scene = None;
            info!("scene cleared");
            return Ok(());
        };
        let chars = self
            .content
            .scene(key)
            .map(|s| s.chars.clone())
            .ok_or_else(|| DomainError::EntityNotFound(format!("scene {key}")))?;
        self.roster.clear_npcs();
        self.scene = Some(key.to_owned());
        self.drop_all(&chars);
        info!(scene = key, npcs = self.roster.npcs().count(), "scene changed");
        Ok(())
    }

    fn drop_all(&mut self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.roster.spawn(key) {
                warn!(key = %key, error = %e, "autodrop skipped");
            }
        }
    }

    /// Spawns an NPC instance and returns its key.
    ///
    /// # Errors
    ///
    /// Propagates roster errors (unknown key, party member).
    pub fn drop_npc(&mut self, key_or_name: &str) -> Result<String, DomainError> {
        let key = self.roster.spawn(key_or_name)?.key.clone();
        debug!(key = %key, "npc dropped");
        Ok(key)
    }

    /// Current hit points of a character.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` for an unknown key or name.
    pub fn hp(&self, key_or_name: &str) -> Result<i32, DomainError> {
        self.roster
            .find(key_or_name)
            .map(|c| c.cur_hp)
            .ok_or_else(|| DomainError::EntityNotFound(key_or_name.to_owned()))
    }

    /// Sets hit points. An NPC dropping from above zero to zero or below
    /// awards experience and leaves its inventory in the active scene.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` for an unknown key or name.
    pub fn set_hp(&mut self, key_or_name: &str, hp: i32) -> Result<HpChange, DomainError> {
        let key = self.roster.resolve(key_or_name)?;
        let character = self
            .roster
            .get_mut(&key)
            .ok_or_else(|| DomainError::EntityNotFound(key.clone()))?;
        let before = character.cur_hp;
        character.cur_hp = hp;
        let defeated = character.is_npc() && before > 0 && hp <= 0;
        let fallen = character.clone();

        if defeated {
            self.award_experience(fallen.sheet.level);
            self.drop_loot(&fallen);
        }
        Ok(HpChange {
            key,
            before,
            after: hp,
            defeated,
        })
    }

    /// Adds `delta` (negative for damage) to current hit points.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` for an unknown key or name.
    pub fn adjust_hp(&mut self, key_or_name: &str, delta: i32) -> Result<HpChange, DomainError> {
        let current = self.hp(key_or_name)?;
        self.set_hp(key_or_name, current.saturating_add(delta))
    }

    fn award_experience(&mut self, challenge_rating: i32) {
        let party = self.roster.party().count();
        let Ok(party) = i32::try_from(party) else {
            return;
        };
        if party == 0 {
            warn!("npc defeated with no party to share experience");
            return;
        }
        let share = challenge_xp(challenge_rating) / party;
        self.experience += share;
        info!(share, total = self.experience, "experience awarded");
    }

    fn drop_loot(&mut self, fallen: &Character) {
        if fallen.sheet.inventory.is_empty() {
            return;
        }
        let Some(scene_key) = self.scene.clone() else {
            debug!(npc = %fallen.key, "no active scene, loot not placed");
            return;
        };
        let context = format!(" on the corpse of {}", fallen.name());
        let placements: Vec<Placement> = fallen
            .sheet
            .inventory
            .iter()
            .filter(|item| {
                let known = self.content.object(item).is_some();
                if !known {
                    warn!(object = %item, "unknown loot object skipped");
                }
                known
            })
            .map(|item| Placement {
                object: item.clone(),
                context: context.clone(),
            })
            .collect();
        if let Some(scene) = self.content.scene_mut(&scene_key) {
            scene.objects.extend(placements);
        }
    }

    /// The character whose turn it is: a living NPC with the current name if
    /// there is one, else a fallen NPC with that name, else the party member.
    #[must_use]
    pub fn turn_occupant(&self) -> Option<&Character> {
        let name = self.turns.current()?.name.as_str();
        self.named(name)
            .find(|c| c.is_npc() && c.is_alive())
            .or_else(|| self.named(name).find(|c| c.is_npc()))
            .or_else(|| self.named(name).find(|c| c.is_party()))
    }

    /// Participants carrying display name `name`, in store order.
    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Character> + 'a {
        self.roster.participants().filter(move |c| c.name() == name)
    }

    /// True when no party member is standing (including an empty party).
    #[must_use]
    pub fn party_down(&self) -> bool {
        !self.roster.party().any(Character::is_alive)
    }

    /// True when no NPC is standing (including no NPCs at all).
    #[must_use]
    pub fn npcs_down(&self) -> bool {
        !self.roster.npcs().any(Character::is_alive)
    }

    /// Ends combat: clears the order, the pointer and the battle log.
    pub fn end_combat(&mut self) {
        self.turns.clear();
        self.battle_log.clear();
        self.last_battle = None;
    }

    /// Records an attack narration.
    pub fn log_battle(&mut self, at: DateTime<Utc>, text: String) {
        self.last_battle = Some(text.clone());
        self.battle_log.push(BattleLogEntry { at, text });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_content;

    fn world() -> World {
        World::new(sample_content())
    }

    #[test]
    fn test_new_world_starts_in_void_with_default_view() {
        let world = world();
        assert_eq!(world.place, START_PLACE);
        assert!(world.scene.is_none());
        assert_eq!(world.view, ViewFlags::default());
        assert!(!world.turns.is_active());
        assert_eq!(world.roster.party().count(), 2);
    }

    // --- place and scene tests ---

    #[test]
    fn test_set_place_clears_npcs_and_scene_then_autodrops() {
        let mut world = world();
        world.set_scene(Some("ambush")).unwrap();
        assert_eq!(world.roster.npcs().count(), 2);

        world.set_place("cave").unwrap();

        assert_eq!(world.place, "cave");
        assert!(world.scene.is_none());
        let npcs: Vec<&str> = world.roster.npcs().map(Character::name).collect();
        assert_eq!(npcs, vec!["Bat"]);
    }

    #[test]
    fn test_set_place_unknown_changes_nothing() {
        let mut world = world();
        world.drop_npc("gob").unwrap();
        assert!(world.set_place("moon").is_err());
        assert_eq!(world.place, START_PLACE);
        assert_eq!(world.roster.npcs().count(), 1);
    }

    #[test]
    fn test_set_scene_none_clears() {
        let mut world = world();
        world.set_scene(Some("ambush")).unwrap();
        world.set_scene(None).unwrap();
        assert!(world.scene.is_none());
        assert_eq!(world.roster.npcs().count(), 0);
    }

    // --- hp tests ---

    #[test]
    fn test_npc_defeat_awards_experience_once_and_drops_loot() {
        let mut world = world();
        world.set_scene(Some("ambush")).unwrap();
        let gob = world.roster.npcs().next().unwrap().key.clone();

        let change = world.adjust_hp(&gob, -10).unwrap();
        assert!(change.defeated);
        // CR 1 goblin, party of two.
        assert_eq!(world.experience, 100);

        let loot = &world.content.scene("ambush").unwrap().objects;
        assert!(
            loot.iter()
                .any(|p| p.object == "dagger" && p.context == " on the corpse of Goblin")
        );
        assert!(!loot.iter().any(|p| p.object == "ghost-item"));

        let again = world.adjust_hp(&gob, -3).unwrap();
        assert!(!again.defeated);
        assert_eq!(world.experience, 100);
    }

    #[test]
    fn test_party_member_at_zero_is_not_a_defeat() {
        let mut world = world();
        let change = world.set_hp("ari", 0).unwrap();
        assert!(!change.defeated);
        assert_eq!(world.experience, 0);
        assert_eq!(world.hp("ari").unwrap(), 0);
    }

    #[test]
    fn test_defeat_without_scene_places_no_loot() {
        let mut world = world();
        let gob = world.drop_npc("gob").unwrap();
        let before = world.content.clone();
        world.set_hp(&gob, -1).unwrap();
        assert_eq!(world.content, before);
        assert_eq!(world.experience, 100);
    }

    #[test]
    fn test_set_hp_unknown_key() {
        let mut world = world();
        assert_eq!(
            world.set_hp("zzz", 3),
            Err(DomainError::EntityNotFound("zzz".to_owned()))
        );
    }

    #[test]
    fn test_hp_can_go_negative() {
        let mut world = world();
        world.adjust_hp("ari", -100).unwrap();
        assert!(world.hp("ari").unwrap() < 0);
    }

    // --- occupant tests ---

    #[test]
    fn test_turn_occupant_prefers_living_npc() {
        let mut world = world();
        let first = world.drop_npc("gob").unwrap();
        let second = world.drop_npc("gob").unwrap();
        world.set_hp(&first, 0).unwrap();
        world.turns.start(vec![crate::domain::turn_order::TurnEntry {
            name: "Goblin".to_owned(),
            score: 10,
        }]);

        assert_eq!(world.turn_occupant().unwrap().key, second);

        world.set_hp(&second, 0).unwrap();
        assert_eq!(world.turn_occupant().unwrap().key, first);
    }

    #[test]
    fn test_turn_occupant_party_member() {
        let mut world = world();
        world.turns.start(vec![crate::domain::turn_order::TurnEntry {
            name: "Aria".to_owned(),
            score: 10,
        }]);
        assert_eq!(world.turn_occupant().unwrap().key, "ari");
    }

    #[test]
    fn test_down_checks() {
        let mut world = world();
        assert!(world.npcs_down());
        assert!(!world.party_down());
        let gob = world.drop_npc("gob").unwrap();
        assert!(!world.npcs_down());
        world.set_hp(&gob, 0).unwrap();
        assert!(world.npcs_down());
        world.set_hp("ari", 0).unwrap();
        world.set_hp("bre", -2).unwrap();
        assert!(world.party_down());
    }

    #[test]
    fn test_end_combat_clears_log_and_order() {
        let mut world = world();
        world.turns.start(vec![crate::domain::turn_order::TurnEntry {
            name: "Aria".to_owned(),
            score: 3,
        }]);
        world.log_battle(Utc::now(), "Aria attacks".to_owned());

        world.end_combat();

        assert_eq!(world.turns.current_index(), 0);
        assert!(world.turns.entries().is_empty());
        assert!(world.battle_log.is_empty());
        assert!(world.last_battle.is_none());
    }
}
