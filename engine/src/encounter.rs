use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::notation::{DiceNotation, ParseError};
use crate::strategy::RollStrategy;
use crate::turn_order::{compare_entries, MonsterEntity, TurnEntry};
use crate::Dice;

fn first_round() -> u32 {
    1
}

/// The combatants and markers of one fight, in turn order once sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encounter {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default = "first_round")]
    pub round: u32,
    /// Index into `entities` of the entry whose turn it is.
    #[serde(default)]
    pub active: Option<usize>,
    #[serde(default)]
    pub entities: Vec<TurnEntry>,
}

impl Default for Encounter {
    fn default() -> Self {
        Self::new("")
    }
}

impl Encounter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: None, name: name.into(), round: first_round(), active: None, entities: Vec::new() }
    }

    pub fn add(&mut self, entry: TurnEntry) {
        self.entities.push(entry);
    }

    pub fn active_entry(&self) -> Option<&TurnEntry> {
        self.active.and_then(|idx| self.entities.get(idx))
    }

    pub fn monsters(&self) -> impl Iterator<Item = &MonsterEntity> {
        self.entities.iter().filter_map(|e| match e {
            TurnEntry::Monster(m) => Some(m),
            _ => None,
        })
    }

    pub fn monsters_mut(&mut self) -> impl Iterator<Item = &mut MonsterEntity> {
        self.entities.iter_mut().filter_map(|e| match e {
            TurnEntry::Monster(m) => Some(m),
            _ => None,
        })
    }

    /// Roll initiative for every monster that has none. Returns how many were rolled.
    ///
    /// Nothing is changed when any of those monsters has an unusable bonus.
    pub fn roll_monster_initiative(
        &mut self,
        dice: &mut Dice,
        strategy: RollStrategy,
        max_rerolls: u32,
    ) -> Result<usize, ParseError> {
        let notations = self
            .monsters()
            .filter(|m| m.initiative.is_none())
            .map(MonsterEntity::initiative_notation)
            .collect::<Result<Vec<_>, _>>()?;
        let rolled = notations.len();
        for (monster, notation) in self.monsters_mut().filter(|m| m.initiative.is_none()).zip(notations) {
            monster.set_initiative(notation, dice, strategy, max_rerolls);
        }
        Ok(rolled)
    }

    /// Roll hit points for every monster with hit dice. Returns how many were rolled.
    pub fn roll_monster_hit_points(&mut self, dice: &mut Dice, strategy: RollStrategy, max_rerolls: u32) -> usize {
        let mut rolled = 0;
        for monster in self.monsters_mut() {
            if monster.roll_hit_points(dice, strategy, max_rerolls).is_some() {
                rolled += 1;
            }
        }
        rolled
    }

    /// Stable sort into initiative order; the active entry keeps its turn.
    pub fn sort_turn_order(&mut self) {
        let mut order: Vec<usize> = (0..self.entities.len()).collect();
        order.sort_by(|&a, &b| compare_entries(&self.entities[a], &self.entities[b]));

        self.active = self.active.and_then(|old| order.iter().position(|&idx| idx == old));

        let mut slots: Vec<Option<TurnEntry>> = std::mem::take(&mut self.entities).into_iter().map(Some).collect();
        self.entities = order.into_iter().filter_map(|idx| slots[idx].take()).collect();
        debug!(encounter = %self.name, entities = self.entities.len(), "sorted encounter");
    }

    /// Pass the turn to the next entry, starting a new round after the last.
    /// An active index past the end counts as no active entry.
    pub fn next_turn(&mut self) -> Option<&TurnEntry> {
        let len = self.entities.len();
        if len == 0 {
            self.active = None;
            return None;
        }
        let next = match self.active.filter(|&idx| idx < len) {
            None => 0,
            Some(idx) if idx + 1 < len => idx + 1,
            Some(_) => {
                self.round += 1;
                debug!(encounter = %self.name, round = self.round, "new round");
                0
            }
        };
        self.active = Some(next);
        self.entities.get(next)
    }
}

impl MonsterEntity {
    /// The notation initiative is rolled with: `1d20` plus the bonus.
    pub fn initiative_notation(&self) -> Result<DiceNotation, ParseError> {
        DiceNotation::new(1, 20, self.initiative_bonus)
    }

    pub fn roll_initiative(&mut self, dice: &mut Dice, strategy: RollStrategy, max_rerolls: u32) -> Result<i32, ParseError> {
        let notation = self.initiative_notation()?;
        Ok(self.set_initiative(notation, dice, strategy, max_rerolls))
    }

    fn set_initiative(&mut self, notation: DiceNotation, dice: &mut Dice, strategy: RollStrategy, max_rerolls: u32) -> i32 {
        let initiative = notation.resolve_bounded(strategy, dice, max_rerolls);
        debug!(monster = %self.name, %notation, %strategy, initiative, "rolled initiative");
        self.initiative = Some(initiative);
        initiative
    }

    /// Set max and current hit points from the hit dice, at least 1.
    /// Returns `None` when the monster has no hit dice.
    pub fn roll_hit_points(&mut self, dice: &mut Dice, strategy: RollStrategy, max_rerolls: u32) -> Option<i32> {
        let notation = self.hit_dice?;
        let hp = notation.resolve_bounded(strategy, dice, max_rerolls).max(1);
        debug!(monster = %self.name, %notation, %strategy, hp, "rolled hit points");
        self.max_hp = hp;
        self.current_hp = hp;
        Some(hp)
    }

    /// Temporary hit points absorb damage first. Returns the hit points left.
    pub fn apply_damage(&mut self, amount: i32) -> i32 {
        let amount = amount.max(0);
        let absorbed = amount.min(self.temporary_hp.max(0));
        self.temporary_hp -= absorbed;
        self.current_hp = (self.current_hp - (amount - absorbed)).max(0);
        self.current_hp
    }

    /// Never lowers hit points already above the maximum.
    pub fn heal(&mut self, amount: i32) -> i32 {
        if amount > 0 && self.current_hp < self.max_hp {
            self.current_hp = self.current_hp.saturating_add(amount).min(self.max_hp);
        }
        self.current_hp
    }

    pub fn is_down(&self) -> bool {
        self.current_hp <= 0
    }
}
