//! The dice oracle seam.

use gmconsole_core::rng::DeterministicRng;
use tracing::warn;

use crate::expr::DiceExpr;

/// Resolves dice expressions to integers.
///
/// Implementations must never fail: when their backend is unavailable they
/// return a safe default (`0`) and log a warning, so combat keeps going.
pub trait DiceOracle: Send {
    /// Rolls `expr` and returns the total, bonus included.
    fn roll(&mut self, expr: &DiceExpr) -> i32;

    /// Parses and rolls `expr`. An unparsable expression yields `0`.
    fn roll_str(&mut self, expr: &str) -> i32 {
        match DiceExpr::parse(expr) {
            Ok(parsed) => self.roll(&parsed),
            Err(e) => {
                warn!(expr, error = %e, "unparsable dice expression, rolling 0");
                0
            }
        }
    }

    /// Picks a uniformly random index in `0..len` by rolling a `len`-sided die.
    ///
    /// Returns `None` for an empty range. A degraded roll (0) clamps to index 0.
    fn pick(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let sides = u32::try_from(len).unwrap_or(u32::MAX);
        let roll = self.roll(&DiceExpr::die(sides));
        let index = usize::try_from(roll.saturating_sub(1)).unwrap_or(0);
        Some(index.min(len - 1))
    }
}

/// Sums `faces` plus `bonus`, saturating at the `i32` bounds.
pub(crate) fn total(faces: impl IntoIterator<Item = u32>, bonus: i32) -> i32 {
    let sum: i64 = faces.into_iter().map(i64::from).sum::<i64>() + i64::from(bonus);
    i32::try_from(sum).unwrap_or(if sum < 0 { i32::MIN } else { i32::MAX })
}

/// Oracle backed by a local [`DeterministicRng`].
pub struct LocalOracle {
    rng: Box<dyn DeterministicRng>,
}

impl LocalOracle {
    /// Wraps an RNG.
    #[must_use]
    pub fn new(rng: impl DeterministicRng + 'static) -> Self {
        Self { rng: Box::new(rng) }
    }
}

impl std::fmt::Debug for LocalOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalOracle").finish_non_exhaustive()
    }
}

impl DiceOracle for LocalOracle {
    fn roll(&mut self, expr: &DiceExpr) -> i32 {
        let rng = &mut self.rng;
        total(
            (0..expr.count).map(|_| rng.next_u32_range(1, expr.sides)),
            expr.bonus,
        )
    }
}
