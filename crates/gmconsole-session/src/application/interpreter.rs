//! Command dispatch.
//!
//! Commands are looked up by name (or alias) in a [`CommandTable`]. Each entry
//! declares how many arguments it accepts and a handler that returns an
//! [`Outcome`]. A failing command is logged and becomes
//! [`Outcome::Unchanged`]; the interpreter never aborts.

use std::collections::HashMap;
use std::fmt::Write as _;

use gmconsole_core::command::{Command, CommandLine, Origin};
use gmconsole_core::error::DomainError;
use tracing::{debug, instrument, warn};

use super::handlers;
use super::session::Session;

/// What a command did, for the renderer and the transports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing visible changed; nothing is pushed.
    Unchanged,
    /// State changed; re-render with an empty message.
    Refresh,
    /// Re-render with a message.
    Message(String),
    /// Show a detail overlay instead of the scene.
    Overlay(String),
    /// Show a battle: attacker card, narration, target card.
    Battle {
        narration: String,
        attacker: String,
        target: String,
    },
    /// Operator-only text; printed to the requesting operator, not pushed.
    Listing(String),
    /// Start the auto-fight scheduler.
    StartAutoFight,
}

impl Outcome {
    /// Whether spectators should get a fresh payload.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::Unchanged | Self::Listing(_))
    }
}

/// Signature shared by all command handlers.
pub type Handler = fn(&mut Session, &CommandLine) -> Result<Outcome, DomainError>;

/// Accepted argument count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    #[must_use]
    pub const fn exactly(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    #[must_use]
    pub const fn between(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    #[must_use]
    pub const fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    #[must_use]
    pub fn accepts(self, n: usize) -> bool {
        n >= self.min && self.max.is_none_or(|max| n <= max)
    }

    fn describe(self) -> String {
        match self.max {
            Some(max) if max == self.min => max.to_string(),
            Some(max) => format!("{}-{max}", self.min),
            None => format!("{} or more", self.min),
        }
    }
}

/// One registered command.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub arity: Arity,
    /// One-line usage shown by `help`.
    pub usage: &'static str,
    pub handler: Handler,
}

/// The dispatch table.
#[derive(Debug, Default)]
pub struct CommandTable {
    specs: Vec<CommandSpec>,
    lookup: HashMap<&'static str, usize>,
}

impl CommandTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The table with every operator command registered.
    #[must_use]
    pub fn standard() -> Self {
        let mut table = Self::new();
        handlers::register_all(&mut table);
        table
    }

    /// Adds a command. A name or alias that is already taken keeps its
    /// existing handler; returns `false` if any was.
    pub fn register(&mut self, spec: CommandSpec) -> bool {
        let slot = self.specs.len();
        let mut clean = true;
        for name in std::iter::once(spec.name).chain(spec.aliases.iter().copied()) {
            if self.lookup.contains_key(name) {
                warn!(command = name, "command name already registered");
                clean = false;
            } else {
                self.lookup.insert(name, slot);
            }
        }
        self.specs.push(spec);
        clean
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.lookup.get(name).map(|&slot| &self.specs[slot])
    }

    #[must_use]
    pub fn specs(&self) -> &[CommandSpec] {
        &self.specs
    }

    /// Usage lines for every command, plus `help` itself.
    #[must_use]
    pub fn help(&self) -> String {
        let mut out = String::new();
        for spec in &self.specs {
            let _ = write!(out, "{:<44}", spec.usage);
            if !spec.aliases.is_empty() {
                let _ = write!(out, " (alias: {})", spec.aliases.join(", "));
            }
            out.push('\n');
        }
        out.push_str("help");
        out
    }

    /// Looks up and runs a command.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCommand`, `Arity`, or whatever the handler returns.
    pub fn dispatch(&self, session: &mut Session, line: &CommandLine) -> Result<Outcome, DomainError> {
        if line.name == "help" {
            return Ok(Outcome::Listing(self.help()));
        }
        let spec = self
            .get(&line.name)
            .ok_or_else(|| DomainError::UnknownCommand(line.name.clone()))?;
        if !spec.arity.accepts(line.args.len()) {
            return Err(DomainError::Arity {
                command: line.name.clone(),
                expected: spec.arity.describe(),
                got: line.args.len(),
            });
        }
        (spec.handler)(session, line)
    }

    /// Runs a command, logging and swallowing any error.
    #[instrument(skip_all, fields(command = %line.command_type(), correlation_id = %line.correlation_id(), origin = %origin))]
    pub fn execute(&self, session: &mut Session, line: &CommandLine, origin: Origin) -> Outcome {
        match self.dispatch(session, line) {
            Ok(outcome) => {
                debug!(args = %line.raw_args, "command applied");
                outcome
            }
            Err(e) => {
                warn!(args = %line.raw_args, error = %e, "command rejected");
                Outcome::Unchanged
            }
        }
    }
}
