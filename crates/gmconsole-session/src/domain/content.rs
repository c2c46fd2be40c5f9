//! Static game content: places, scenes, objects and character sheets.

use gmconsole_core::error::DomainError;
use serde::{Deserialize, Serialize};

use super::character::CharacterSheet;

/// A location the party can be in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Place {
    #[serde(alias = "Key")]
    pub key: String,
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Image")]
    pub image: String,
    #[serde(alias = "Desc")]
    pub desc: String,
    /// Template keys spawned as NPCs whenever the party enters.
    #[serde(alias = "Autodrop")]
    pub autodrop: Vec<String>,
}

/// An object placed in a scene, with text describing where it lies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placement {
    #[serde(alias = "objkey", alias = "ObjKey")]
    pub object: String,
    #[serde(alias = "Context")]
    pub context: String,
}

/// A situation within a place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    #[serde(alias = "Key")]
    pub key: String,
    #[serde(alias = "Desc")]
    pub desc: String,
    /// Template keys spawned as NPCs when the scene starts.
    #[serde(alias = "Chars")]
    pub chars: Vec<String>,
    #[serde(alias = "Objects")]
    pub objects: Vec<Placement>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Object {
    #[serde(alias = "Key")]
    pub key: String,
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Image")]
    pub image: String,
    #[serde(alias = "Desc")]
    pub desc: String,
    #[serde(alias = "Contains")]
    pub contains: Vec<String>,
    #[serde(alias = "Weight")]
    pub weight: i32,
}

/// Everything a content source provides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Content {
    pub places: Vec<Place>,
    pub scenes: Vec<Scene>,
    pub objects: Vec<Object>,
    /// Party sheets and templates, in load order.
    pub characters: Vec<CharacterSheet>,
}

impl Content {
    #[must_use]
    pub fn place(&self, key: &str) -> Option<&Place> {
        self.places.iter().find(|p| p.key == key)
    }

    #[must_use]
    pub fn scene(&self, key: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.key == key)
    }

    pub fn scene_mut(&mut self, key: &str) -> Option<&mut Scene> {
        self.scenes.iter_mut().find(|s| s.key == key)
    }

    #[must_use]
    pub fn object(&self, key: &str) -> Option<&Object> {
        self.objects.iter().find(|o| o.key == key)
    }
}

/// Where content comes from. Loaded at startup and on `reload`/`reset`.
pub trait ContentSource: Send + Sync {
    /// Loads a fresh copy of all content.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` when the content cannot be read
    /// or parsed.
    fn load(&self) -> Result<Content, DomainError>;
}

/// In-memory content serves itself.
impl ContentSource for Content {
    fn load(&self) -> Result<Content, DomainError> {
        Ok(self.clone())
    }
}
