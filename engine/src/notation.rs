//! Dice notation of the form `NdM[+-]K`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Upper bound on the number of dice in one notation.
pub const MAX_DICE: u32 = 999;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty dice notation")]
    Empty,
    #[error("invalid dice notation (expected NdM[+-]K): {0}")]
    Malformed(String),
    #[error("dice count must be at least 1: {0}")]
    ZeroDice(String),
    #[error("dice must have at least 1 side: {0}")]
    ZeroSides(String),
    #[error("at most {max} dice may be rolled, got {count}")]
    TooManyDice { count: u32, max: u32 },
    #[error("dice notation totals do not fit an i32: {0}")]
    OutOfRange(String),
}

/// A parsed `NdM[+-]K`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiceNotation {
    count: u32,
    sides: u32,
    modifier: i32,
}

impl DiceNotation {
    pub fn new(count: u32, sides: u32, modifier: i32) -> Result<Self, ParseError> {
        let shown = || Self { count, sides, modifier }.to_string();
        if count == 0 {
            return Err(ParseError::ZeroDice(shown()));
        }
        if sides == 0 {
            return Err(ParseError::ZeroSides(shown()));
        }
        if count > MAX_DICE {
            return Err(ParseError::TooManyDice { count, max: MAX_DICE });
        }
        let low = count as i64 + modifier as i64;
        let high = count as i64 * sides as i64 + modifier as i64;
        if i32::try_from(low).is_err() || i32::try_from(high).is_err() {
            return Err(ParseError::OutOfRange(shown()));
        }
        Ok(Self { count, sides, modifier })
    }

    pub fn parse(src: &str) -> Result<Self, ParseError> {
        let compact: String = src
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if compact.is_empty() {
            return Err(ParseError::Empty);
        }
        let malformed = || ParseError::Malformed(src.trim().to_string());

        let (count_str, rest) = compact.split_once('d').ok_or_else(malformed)?;
        let (sides_str, modifier) = match rest.find(['+', '-']) {
            Some(pos) => {
                let (sides, signed) = rest.split_at(pos);
                let magnitude = &signed[1..];
                if magnitude.is_empty() || !magnitude.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(malformed());
                }
                // Parse with the sign attached so i32::MIN stays representable.
                let modifier: i32 = signed.parse().map_err(|_| ParseError::OutOfRange(src.trim().to_string()))?;
                (sides, modifier)
            }
            None => (rest, 0),
        };

        let count = if count_str.is_empty() { 1 } else { parse_digits(count_str).ok_or_else(malformed)? };
        let sides = parse_digits(sides_str).ok_or_else(malformed)?;
        Self::new(count, sides, modifier)
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn sides(&self) -> u32 {
        self.sides
    }

    pub fn modifier(&self) -> i32 {
        self.modifier
    }

    /// Every die showing 1.
    pub fn min_total(&self) -> i32 {
        (self.count as i64 + self.modifier as i64) as i32
    }

    /// Every die showing its highest face.
    pub fn max_total(&self) -> i32 {
        (self.count as i64 * self.sides as i64 + self.modifier as i64) as i32
    }

    /// Expected total, halves rounded up.
    pub fn average_total(&self) -> i32 {
        let doubled_dice = self.count as i64 * (self.sides as i64 + 1);
        ((doubled_dice + 1).div_euclid(2) + self.modifier as i64) as i32
    }

    /// Twice the exact expected total. Integral, so strict comparisons against
    /// the unrounded mean stay exact.
    pub(crate) fn doubled_mean(&self) -> i64 {
        self.count as i64 * (self.sides as i64 + 1) + 2 * self.modifier as i64
    }
}

fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for DiceNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.modifier {
            0 => Ok(()),
            m => write!(f, "{:+}", m),
        }
    }
}

impl FromStr for DiceNotation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DiceNotation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DiceNotation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(src: &str) -> (u32, u32, i32) {
        let n = DiceNotation::parse(src).unwrap();
        (n.count(), n.sides(), n.modifier())
    }

    #[test]
    fn parses_plain_and_signed_forms() {
        assert_eq!(parts("2d6+1"), (2, 6, 1));
        assert_eq!(parts("1d20"), (1, 20, 0));
        assert_eq!(parts("3d4-2"), (3, 4, -2));
        assert_eq!(parts(" 2D8 + 3 "), (2, 8, 3));
        assert_eq!(parts("d20"), (1, 20, 0));
        assert_eq!(parts("1d1"), (1, 1, 0));
    }

    #[test]
    fn rejects_bad_grammar() {
        assert_eq!(DiceNotation::parse(""), Err(ParseError::Empty));
        assert_eq!(DiceNotation::parse("   "), Err(ParseError::Empty));
        for bad in ["20", "2d", "2x6", "d", "2d6+", "2d6++1", "2d6+1d4", "-2d6", "2d6+x", "2dd6"] {
            assert!(
                matches!(DiceNotation::parse(bad), Err(ParseError::Malformed(_))),
                "{bad} should be malformed"
            );
        }
    }

    #[test]
    fn rejects_zero_dice_and_sides() {
        assert!(matches!(DiceNotation::parse("0d6"), Err(ParseError::ZeroDice(_))));
        assert!(matches!(DiceNotation::parse("2d0"), Err(ParseError::ZeroSides(_))));
    }

    #[test]
    fn rejects_totals_outside_i32() {
        assert_eq!(
            DiceNotation::parse("1000d6"),
            Err(ParseError::TooManyDice { count: 1000, max: MAX_DICE })
        );
        assert!(matches!(DiceNotation::parse("999d4294967295"), Err(ParseError::OutOfRange(_))));
        assert!(matches!(DiceNotation::parse("1d6+2147483647"), Err(ParseError::OutOfRange(_))));
        assert!(matches!(DiceNotation::parse("1d6+99999999999"), Err(ParseError::OutOfRange(_))));
    }

    #[test]
    fn totals() {
        let n = DiceNotation::parse("2d6+1").unwrap();
        assert_eq!(n.min_total(), 3);
        assert_eq!(n.max_total(), 13);
        assert_eq!(n.average_total(), 8);

        // 1d6 averages 3.5, which rounds up.
        assert_eq!(DiceNotation::parse("1d6").unwrap().average_total(), 4);
        assert_eq!(DiceNotation::parse("1d6-4").unwrap().average_total(), 0);
        assert_eq!(DiceNotation::parse("1d4-5").unwrap().average_total(), -2);
    }

    #[test]
    fn display_is_canonical() {
        assert_eq!(DiceNotation::parse(" 2D6 + 01 ").unwrap().to_string(), "2d6+1");
        assert_eq!(DiceNotation::parse("d8-0").unwrap().to_string(), "1d8");
        assert_eq!(DiceNotation::parse("3d4-2").unwrap().to_string(), "3d4-2");
    }

    #[test]
    fn serde_uses_the_string_form() {
        let n: DiceNotation = serde_json::from_str("\"4d10+2\"").unwrap();
        assert_eq!(serde_json::to_string(&n).unwrap(), "\"4d10+2\"");
        assert!(serde_json::from_str::<DiceNotation>("\"4x10\"").is_err());
    }
}
