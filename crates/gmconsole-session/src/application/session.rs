//! The session: world state plus the collaborators that act on it.

use std::fmt;

use gmconsole_core::clock::Clock;
use gmconsole_core::error::DomainError;
use gmconsole_dice::{DiceExpr, DiceOracle};
use tracing::info;

use crate::domain::content::ContentSource;
use crate::domain::world::World;

/// One game session. Exactly one exists per process, owned by whichever task
/// serializes access to it.
pub struct Session {
    pub world: World,
    oracle: Box<dyn DiceOracle>,
    content: Box<dyn ContentSource>,
    clock: Box<dyn Clock>,
}

impl Session {
    /// Loads content and starts a fresh session.
    ///
    /// # Errors
    ///
    /// Returns the content source's error when loading fails.
    pub fn new(
        content: Box<dyn ContentSource>,
        oracle: Box<dyn DiceOracle>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, DomainError> {
        let world = World::new(content.load()?);
        info!(
            characters = world.roster.len(),
            places = world.content.places.len(),
            scenes = world.content.scenes.len(),
            "session loaded"
        );
        Ok(Self {
            world,
            oracle,
            content,
            clock,
        })
    }

    /// Reloads content and throws away all session state.
    ///
    /// # Errors
    ///
    /// Returns the content source's error; the session is untouched then.
    pub fn reset(&mut self) -> Result<(), DomainError> {
        let content = self.content.load()?;
        self.world = World::new(content);
        info!("session reset");
        Ok(())
    }

    /// Reloads content, keeping NPCs, health and combat.
    ///
    /// # Errors
    ///
    /// Returns the content source's error; the session is untouched then.
    pub fn reload(&mut self) -> Result<(), DomainError> {
        let content = self.content.load()?;
        self.world.reload(content);
        info!("content reloaded");
        Ok(())
    }

    pub fn roll(&mut self, expr: &DiceExpr) -> i32 {
        self.oracle.roll(expr)
    }

    pub fn pick(&mut self, len: usize) -> Option<usize> {
        self.oracle.pick(len)
    }

    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Borrows the world, the oracle and the clock at once.
    pub fn parts(&mut self) -> (&mut World, &mut dyn DiceOracle, &dyn Clock) {
        (&mut self.world, self.oracle.as_mut(), self.clock.as_ref())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("place", &self.world.place)
            .field("scene", &self.world.scene)
            .field("characters", &self.world.roster.len())
            .finish_non_exhaustive()
    }
}
