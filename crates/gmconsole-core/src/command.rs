//! Command abstractions.
//!
//! Every input source (console, telnet session, web form, auto-fight task)
//! produces the same [`CommandLine`] and tags it with an [`Origin`].

use std::fmt;

use uuid::Uuid;

/// Trait that all commands implement.
pub trait Command: Send + Sync + fmt::Debug {
    /// The type name for this command (for logging/routing).
    fn command_type(&self) -> &str;

    /// Correlation ID to trace this command through the system.
    fn correlation_id(&self) -> Uuid;
}

/// Where a command came from. Carried for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The operator's local terminal.
    Console,
    /// An authenticated remote line session.
    Telnet(Uuid),
    /// The web attack form.
    Web,
    /// The auto-fight scheduler.
    AutoFight,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Console => f.write_str("console"),
            Self::Telnet(id) => write!(f, "telnet:{id}"),
            Self::Web => f.write_str("web"),
            Self::AutoFight => f.write_str("auto-fight"),
        }
    }
}

/// A parsed operator command: a name followed by whitespace-separated args.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// First token of the line.
    pub name: String,
    /// Remaining tokens.
    pub args: Vec<String>,
    /// Remaining tokens rejoined with single spaces.
    pub raw_args: String,
    correlation_id: Uuid,
}

impl CommandLine {
    /// Parses one input line. Returns `None` for a blank line.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let name = tokens.next()?.to_owned();
        let args: Vec<String> = tokens.map(str::to_owned).collect();
        let raw_args = args.join(" ");
        Some(Self {
            name,
            args,
            raw_args,
            correlation_id: Uuid::new_v4(),
        })
    }

    /// Returns the argument at `index`, if present.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

impl Command for CommandLine {
    fn command_type(&self) -> &str {
        &self.name
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_name_and_args() {
        let cmd = CommandLine::parse("att aria.0  gob1 adv\n").unwrap();
        assert_eq!(cmd.name, "att");
        assert_eq!(cmd.args, vec!["aria.0", "gob1", "adv"]);
        assert_eq!(cmd.raw_args, "aria.0 gob1 adv");
    }

    #[test]
    fn test_parse_without_args() {
        let cmd = CommandLine::parse("nt").unwrap();
        assert_eq!(cmd.command_type(), "nt");
        assert!(cmd.args.is_empty());
        assert_eq!(cmd.raw_args, "");
        assert_eq!(cmd.arg(0), None);
    }

    #[test]
    fn test_parse_blank_line_returns_none() {
        assert!(CommandLine::parse("   \r\n").is_none());
    }

    #[test]
    fn test_each_parse_gets_fresh_correlation_id() {
        let a = CommandLine::parse("nt").unwrap();
        let b = CommandLine::parse("nt").unwrap();
        assert_ne!(a.correlation_id(), b.correlation_id());
    }

    #[test]
    fn test_origin_display() {
        assert_eq!(Origin::Console.to_string(), "console");
        assert_eq!(Origin::AutoFight.to_string(), "auto-fight");
    }
}
