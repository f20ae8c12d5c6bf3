use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::notation::{DiceNotation, ParseError};
use crate::Dice;

/// Rerolls allowed for `Low`/`High` before falling back to the boundary value.
pub const MAX_REROLLS: u32 = 100;

/// How a dice notation is turned into a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollStrategy {
    /// Roll every die.
    #[default]
    Random,
    /// No roll; the expected total, halves rounded up.
    Average,
    /// No roll; every die shows 1.
    Minimum,
    /// No roll; every die shows its highest face.
    Maximum,
    /// Reroll until the total is strictly below the mean.
    Low,
    /// Reroll until the total is strictly above the mean.
    High,
}

impl RollStrategy {
    pub const ALL: [RollStrategy; 6] = [
        RollStrategy::Random,
        RollStrategy::Average,
        RollStrategy::Minimum,
        RollStrategy::Maximum,
        RollStrategy::Low,
        RollStrategy::High,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RollStrategy::Random => "random",
            RollStrategy::Average => "average",
            RollStrategy::Minimum => "minimum",
            RollStrategy::Maximum => "maximum",
            RollStrategy::Low => "low",
            RollStrategy::High => "high",
        }
    }
}

impl fmt::Display for RollStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RollStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "random" => Ok(RollStrategy::Random),
            "average" | "avg" => Ok(RollStrategy::Average),
            "minimum" | "min" => Ok(RollStrategy::Minimum),
            "maximum" | "max" => Ok(RollStrategy::Maximum),
            "low" => Ok(RollStrategy::Low),
            "high" => Ok(RollStrategy::High),
            other => Err(format!("unknown roll strategy '{}'", other)),
        }
    }
}

impl DiceNotation {
    /// Resolve with the default reroll bound.
    pub fn resolve(&self, strategy: RollStrategy, dice: &mut Dice) -> i32 {
        self.resolve_bounded(strategy, dice, MAX_REROLLS)
    }

    /// Resolve under `strategy`. `Low` and `High` try at most `max_rerolls`
    /// random rolls, then return the minimum or maximum total respectively.
    pub fn resolve_bounded(&self, strategy: RollStrategy, dice: &mut Dice, max_rerolls: u32) -> i32 {
        let total = match strategy {
            RollStrategy::Random => self.roll(dice),
            RollStrategy::Average => self.average_total(),
            RollStrategy::Minimum => self.min_total(),
            RollStrategy::Maximum => self.max_total(),
            RollStrategy::Low => self.reroll_until(dice, max_rerolls, |doubled, mean| doubled < mean)
                .unwrap_or_else(|| self.fallback(strategy, self.min_total(), max_rerolls)),
            RollStrategy::High => self.reroll_until(dice, max_rerolls, |doubled, mean| doubled > mean)
                .unwrap_or_else(|| self.fallback(strategy, self.max_total(), max_rerolls)),
        };
        debug!(notation = %self, %strategy, total, "resolved dice");
        total
    }

    fn roll(&self, dice: &mut Dice) -> i32 {
        (dice.roll_sum(self.count(), self.sides()) + self.modifier() as i64) as i32
    }

    fn reroll_until(&self, dice: &mut Dice, max_rerolls: u32, accept: impl Fn(i64, i64) -> bool) -> Option<i32> {
        // A single-sided die always lands on the mean.
        if self.sides() == 1 {
            return None;
        }
        let mean = self.doubled_mean();
        (0..max_rerolls)
            .map(|_| self.roll(dice))
            .find(|&total| accept(2 * total as i64, mean))
    }

    fn fallback(&self, strategy: RollStrategy, boundary: i32, max_rerolls: u32) -> i32 {
        if self.sides() == 1 {
            debug!(notation = %self, %strategy, boundary, "mean is unreachable; using boundary");
        } else {
            warn!(notation = %self, %strategy, max_rerolls, boundary, "reroll limit reached; using boundary");
        }
        boundary
    }
}

/// Parse `notation` and resolve it under `strategy`.
pub fn resolve(notation: &str, strategy: RollStrategy, dice: &mut Dice) -> Result<i32, ParseError> {
    Ok(DiceNotation::parse(notation)?.resolve(strategy, dice))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_strategies() {
        let mut dice = Dice::from_seed(1);
        assert_eq!(resolve("2d6+1", RollStrategy::Maximum, &mut dice), Ok(13));
        assert_eq!(resolve("1d20", RollStrategy::Minimum, &mut dice), Ok(1));
        assert_eq!(resolve("2d6+1", RollStrategy::Average, &mut dice), Ok(8));
        assert_eq!(resolve("1d8", RollStrategy::Average, &mut dice), Ok(5));
    }

    #[test]
    fn parse_errors_surface() {
        let mut dice = Dice::from_seed(1);
        assert!(matches!(
            resolve("two dee six", RollStrategy::Random, &mut dice),
            Err(ParseError::Malformed(_))
        ));
    }

    #[test]
    fn low_rerolls_until_below_mean() {
        // 1d6 has mean 3.5: 6 and 4 are rejected, 3 is kept.
        let mut dice = Dice::from_scripted(vec![6, 4, 3]);
        assert_eq!(resolve("1d6", RollStrategy::Low, &mut dice), Ok(3));
    }

    #[test]
    fn high_rerolls_until_above_mean() {
        let mut dice = Dice::from_scripted(vec![1, 3, 4]);
        assert_eq!(resolve("1d6", RollStrategy::High, &mut dice), Ok(4));
    }

    #[test]
    fn low_compares_against_the_unrounded_mean() {
        // 2d6 mean is exactly 7; a 7 is not strictly below it.
        let mut dice = Dice::from_scripted(vec![3, 4, 2, 4]);
        assert_eq!(resolve("2d6", RollStrategy::Low, &mut dice), Ok(6));
    }

    #[test]
    fn unreachable_mean_falls_back_without_rolling() {
        let mut dice = Dice::from_seed(3);
        assert_eq!(resolve("1d1", RollStrategy::Low, &mut dice), Ok(1));
        assert_eq!(resolve("4d1+2", RollStrategy::High, &mut dice), Ok(6));
    }

    #[test]
    fn exhausted_rerolls_fall_back_to_boundary() {
        let n = DiceNotation::parse("1d20").unwrap();
        let mut always_high = Dice::from_scripted(vec![20]);
        assert_eq!(n.resolve_bounded(RollStrategy::Low, &mut always_high, 5), 1);
        let mut always_low = Dice::from_scripted(vec![1]);
        assert_eq!(n.resolve_bounded(RollStrategy::High, &mut always_low, 5), 20);
        assert_eq!(n.resolve_bounded(RollStrategy::High, &mut always_low, 0), 20);
    }

    #[test]
    fn strategy_names_round_trip() {
        for strategy in RollStrategy::ALL {
            assert_eq!(strategy.as_str().parse::<RollStrategy>(), Ok(strategy));
            let json = serde_json::to_string(&strategy).unwrap();
            assert_eq!(json, format!("\"{}\"", strategy));
        }
        assert_eq!("MAX".parse::<RollStrategy>(), Ok(RollStrategy::Maximum));
        assert!("lucky".parse::<RollStrategy>().is_err());
    }
}
