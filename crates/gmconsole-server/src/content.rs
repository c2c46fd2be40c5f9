//! Content loaded from a directory of JSON files.
//!
//! Layout:
//!
//! ```text
//! <dir>/places.json        [Place]
//! <dir>/scenes.json        [Scene]
//! <dir>/objects.json       [Object]
//! <dir>/chars.json         [CharacterSheet]   templates (and any fixed party members)
//! <dir>/players/<p>.json   CharacterSheet     one party member per player
//! ```
//!
//! A missing list file counts as empty. A missing player file is an error.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use gmconsole_core::error::DomainError;
use gmconsole_session::domain::character::CharacterSheet;
use gmconsole_session::domain::content::{Content, ContentSource};
use serde::de::DeserializeOwned;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct JsonContentDir {
    root: PathBuf,
    players: Vec<String>,
}

impl JsonContentDir {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, players: Vec<String>) -> Self {
        Self {
            root: root.into(),
            players,
        }
    }

    fn read<T: DeserializeOwned>(path: &Path) -> Result<T, DomainError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DomainError::Infrastructure(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| DomainError::Infrastructure(format!("{}: {e}", path.display())))
    }

    fn read_list<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, DomainError> {
        let path = self.root.join(file);
        match std::fs::metadata(&path) {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "content file absent, using empty list");
                Ok(Vec::new())
            }
            _ => Self::read(&path),
        }
    }

    fn read_player(&self, player: &str) -> Result<CharacterSheet, DomainError> {
        let path = self.root.join("players").join(format!("{player}.json"));
        let mut sheet: CharacterSheet = Self::read(&path)?;
        sheet.in_party = true;
        if sheet.player.is_none() {
            sheet.player = Some(player.to_owned());
        }
        Ok(sheet)
    }

    fn read_all(&self) -> Result<Content, DomainError> {
        let mut characters: Vec<CharacterSheet> = self
            .players
            .iter()
            .map(|p| self.read_player(p))
            .collect::<Result<_, _>>()?;
        characters.extend(self.read_list::<CharacterSheet>("chars.json")?);
        Ok(Content {
            places: self.read_list("places.json")?,
            scenes: self.read_list("scenes.json")?,
            objects: self.read_list("objects.json")?,
            characters,
        })
    }
}

/// Runs blocking file I/O without stalling other tasks on a multi-threaded
/// runtime. Outside a runtime, or on a current-thread one, `f` runs inline.
fn off_runtime<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

impl ContentSource for JsonContentDir {
    fn load(&self) -> Result<Content, DomainError> {
        off_runtime(|| self.read_all())
    }
}
