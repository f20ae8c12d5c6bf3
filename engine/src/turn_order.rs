//! Turn entries and the comparator that puts them in initiative order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::notation::DiceNotation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundTrigger {
    StartOfRound,
    EndOfRound,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerEntity {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub initiative: Option<i32>,
    #[serde(default)]
    pub concentration: bool,
    /// 0 (none) through 6 (dead).
    #[serde(default)]
    pub exhaustion_level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonsterEntity {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub initiative: Option<i32>,
    /// Added to the d20 when initiative is rolled.
    #[serde(default)]
    pub initiative_bonus: i32,
    #[serde(default)]
    pub hit_dice: Option<DiceNotation>,
    #[serde(default)]
    pub current_hp: i32,
    #[serde(default)]
    pub max_hp: i32,
    #[serde(default)]
    pub temporary_hp: i32,
    #[serde(default)]
    pub concentration: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundMarker {
    pub trigger: RoundTrigger,
    #[serde(default)]
    pub description: Option<String>,
}

/// Fires when play reaches its initiative count.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reminder {
    pub description: String,
    #[serde(default)]
    pub initiative: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEntry {
    Player(PlayerEntity),
    Monster(MonsterEntity),
    RoundMarker(RoundMarker),
    Reminder(Reminder),
}

impl TurnEntry {
    pub fn player(name: impl Into<String>, initiative: Option<i32>) -> Self {
        TurnEntry::Player(PlayerEntity { name: name.into(), initiative, ..Default::default() })
    }

    pub fn monster(name: impl Into<String>, initiative: Option<i32>) -> Self {
        TurnEntry::Monster(MonsterEntity { name: name.into(), initiative, ..Default::default() })
    }

    pub fn round_marker(trigger: RoundTrigger) -> Self {
        TurnEntry::RoundMarker(RoundMarker { trigger, description: None })
    }

    pub fn reminder(description: impl Into<String>, initiative: Option<i32>) -> Self {
        TurnEntry::Reminder(Reminder { description: description.into(), initiative })
    }

    pub fn initiative(&self) -> Option<i32> {
        match self {
            TurnEntry::Player(p) => p.initiative,
            TurnEntry::Monster(m) => m.initiative,
            TurnEntry::RoundMarker(_) => None,
            TurnEntry::Reminder(r) => r.initiative,
        }
    }

    pub fn round_trigger(&self) -> Option<RoundTrigger> {
        match self {
            TurnEntry::RoundMarker(marker) => Some(marker.trigger),
            _ => None,
        }
    }

    /// Display label for turn-order listings.
    pub fn label(&self) -> String {
        match self {
            TurnEntry::Player(p) => p.name.clone(),
            TurnEntry::Monster(m) => m.name.clone(),
            TurnEntry::RoundMarker(marker) => match (&marker.description, marker.trigger) {
                (Some(d), _) => d.clone(),
                (None, RoundTrigger::StartOfRound) => "Start of round".to_string(),
                (None, RoundTrigger::EndOfRound) => "End of round".to_string(),
            },
            TurnEntry::Reminder(r) => r.description.clone(),
        }
    }
}

/// Initiative order for one round. `Less` means `a` acts first.
///
/// Start-of-round markers lead, end-of-round markers trail, and everything
/// else is ordered by descending initiative with a missing score counted as 0.
/// Ties compare `Equal`, so callers must use a stable sort.
pub fn compare_entries(a: &TurnEntry, b: &TurnEntry) -> Ordering {
    use RoundTrigger::*;

    match (a.round_trigger(), b.round_trigger()) {
        (Some(x), Some(y)) => match (x, y) {
            (StartOfRound, EndOfRound) => Ordering::Less,
            (EndOfRound, StartOfRound) => Ordering::Greater,
            _ => Ordering::Equal,
        },
        (Some(StartOfRound), None) => Ordering::Less,
        (Some(EndOfRound), None) => Ordering::Greater,
        (None, Some(StartOfRound)) => Ordering::Greater,
        (None, Some(EndOfRound)) => Ordering::Less,
        (None, None) => {
            let a_init = a.initiative().unwrap_or(0);
            let b_init = b.initiative().unwrap_or(0);
            b_init.cmp(&a_init)
        }
    }
}

/// Stable sort into initiative order.
pub fn sort_turn_order(entries: &mut [TurnEntry]) {
    entries.sort_by(compare_entries);
    debug!(entries = entries.len(), "sorted turn order");
}
