//! Dice expressions.
//!
//! Supported forms:
//! - `XdY` rolls X dice with Y sides
//! - `XdY+Z` / `XdY-Z` adds or subtracts a flat bonus
//! - `dY` is shorthand for `1dY`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DiceError;

/// Most dice a single expression may roll.
pub const MAX_DICE: u32 = 100;

/// Largest die an expression may name.
pub const MAX_SIDES: u32 = 10_000;

/// A parsed dice expression like `2d6+3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceExpr {
    /// Number of dice to roll.
    pub count: u32,
    /// Sides on each die.
    pub sides: u32,
    /// Flat bonus added after rolling (may be negative).
    pub bonus: i32,
}

impl DiceExpr {
    /// A single twenty-sided die.
    pub const D20: Self = Self::die(20);

    /// A single percentile die.
    pub const D100: Self = Self::die(100);

    /// One die with `sides` faces and no bonus.
    #[must_use]
    pub const fn die(sides: u32) -> Self {
        Self {
            count: 1,
            sides,
            bonus: 0,
        }
    }

    /// Parses an expression.
    ///
    /// # Errors
    ///
    /// Returns `DiceError` when the string is empty, malformed, or names a
    /// count or size outside the supported bounds.
    pub fn parse(input: &str) -> Result<Self, DiceError> {
        let input = input.trim().to_ascii_lowercase();
        if input.is_empty() {
            return Err(DiceError::Empty);
        }

        let (count_str, after_d) = input
            .split_once('d')
            .ok_or_else(|| DiceError::InvalidFormat(format!("missing 'd' in '{input}'")))?;

        let count: u32 = if count_str.is_empty() {
            1
        } else {
            count_str
                .parse()
                .map_err(|_| DiceError::InvalidFormat(format!("invalid dice count '{count_str}'")))?
        };

        let (sides_str, bonus) = match after_d.find(['+', '-']) {
            Some(0) => {
                return Err(DiceError::InvalidFormat(format!(
                    "invalid die size '{after_d}'"
                )));
            }
            Some(pos) => {
                let bonus: i32 = after_d[pos..].parse().map_err(|_| {
                    DiceError::InvalidFormat(format!("invalid bonus '{}'", &after_d[pos..]))
                })?;
                (&after_d[..pos], bonus)
            }
            None => (after_d, 0),
        };

        let sides: u32 = sides_str
            .parse()
            .map_err(|_| DiceError::InvalidFormat(format!("invalid die size '{sides_str}'")))?;

        if count == 0 || count > MAX_DICE {
            return Err(DiceError::InvalidDiceCount {
                max: MAX_DICE,
                got: count,
            });
        }
        if sides == 0 || sides > MAX_SIDES {
            return Err(DiceError::InvalidDieSize {
                max: MAX_SIDES,
                got: sides,
            });
        }

        Ok(Self {
            count,
            sides,
            bonus,
        })
    }
}

impl FromStr for DiceExpr {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.bonus {
            0 => Ok(()),
            b if b > 0 => write!(f, "+{b}"),
            b => write!(f, "{b}"),
        }
    }
}
