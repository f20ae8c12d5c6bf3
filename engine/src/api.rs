use std::fs;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::content::builtin_encounters;
use crate::encounter::Encounter;
use crate::strategy::{RollStrategy, MAX_REROLLS};
use crate::turn_order::TurnEntry;
use crate::{DiceNotation, Dice};

fn default_samples() -> u32 {
    1
}

fn default_max_rerolls() -> u32 {
    MAX_REROLLS
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RollConfig {
    pub notation: String,
    #[serde(default)]
    pub strategy: RollStrategy,
    #[serde(default = "default_samples")]
    pub samples: u32,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_max_rerolls")]
    pub max_rerolls: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RollSummary {
    pub notation: String,
    pub strategy: RollStrategy,
    pub samples: u32,
    pub rolls: Vec<i32>,
    pub min: i32,
    pub max: i32,
    pub mean: f64,
    pub median: f64,
    pub theoretical_min: i32,
    pub theoretical_average: i32,
    pub theoretical_max: i32,
    pub log: Vec<String>,
}

/// Resolve `cfg.notation` `cfg.samples` times from `cfg.seed`.
pub fn roll_many(cfg: RollConfig) -> Result<RollSummary> {
    if cfg.samples == 0 {
        bail!("samples must be at least 1");
    }
    let notation = DiceNotation::parse(&cfg.notation)
        .with_context(|| format!("invalid dice notation: {}", cfg.notation))?;

    let mut dice = Dice::from_seed(cfg.seed);
    let mut log = Vec::with_capacity(cfg.samples as usize);
    let rolls: Vec<i32> = (1..=cfg.samples)
        .map(|i| {
            let total = notation.resolve_bounded(cfg.strategy, &mut dice, cfg.max_rerolls);
            log.push(format!("[ROLL] #{} {} ({}) = {}", i, notation, cfg.strategy, total));
            total
        })
        .collect();

    let mut sorted = rolls.clone();
    sorted.sort_unstable();
    let n = sorted.len();
    let median = if n % 2 == 1 {
        sorted[n / 2] as f64
    } else {
        (sorted[n / 2 - 1] as f64 + sorted[n / 2] as f64) / 2.0
    };
    let mean = sorted.iter().map(|&r| r as f64).sum::<f64>() / n as f64;

    Ok(RollSummary {
        notation: notation.to_string(),
        strategy: cfg.strategy,
        samples: cfg.samples,
        min: sorted[0],
        max: sorted[n - 1],
        mean,
        median,
        theoretical_min: notation.min_total(),
        theoretical_average: notation.average_total(),
        theoretical_max: notation.max_total(),
        rolls,
        log,
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TurnOrderConfig {
    /// Name of a built-in encounter; takes precedence over `encounter_path`.
    #[serde(default)]
    pub encounter_id: Option<String>,
    #[serde(default)]
    pub encounter_path: Option<String>,
    /// Strategy for monsters without initiative; `None` leaves them unrolled.
    #[serde(default)]
    pub initiative_strategy: Option<RollStrategy>,
    /// Strategy for monster hit points from hit dice; `None` keeps stored values.
    #[serde(default)]
    pub hit_point_strategy: Option<RollStrategy>,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_max_rerolls")]
    pub max_rerolls: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TurnOrderResult {
    pub encounter: Encounter,
    pub order: Vec<String>,
    pub log: Vec<String>,
}

/// Load an encounter, roll what was asked for, and sort it into turn order.
pub fn turn_order(cfg: TurnOrderConfig) -> Result<TurnOrderResult> {
    let encounter = load_encounter(&cfg)?;
    order_encounter(encounter, &cfg)
}

fn load_encounter(cfg: &TurnOrderConfig) -> Result<Encounter> {
    let (text, source) = match (&cfg.encounter_id, &cfg.encounter_path) {
        (Some(id), _) => {
            let text = builtin_encounters()
                .get(id.as_str())
                .copied()
                .ok_or_else(|| anyhow::anyhow!("built-in encounter '{}' not found", id))?;
            (text.to_string(), id.clone())
        }
        (None, Some(path)) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read encounter JSON: {}", path))?;
            (text, path.clone())
        }
        (None, None) => bail!("either encounter_id or encounter_path is required"),
    };
    serde_json::from_str(&text).with_context(|| format!("failed to parse encounter JSON: {}", source))
}

/// Same as [`turn_order`] for an encounter already in memory.
pub fn order_encounter(mut encounter: Encounter, cfg: &TurnOrderConfig) -> Result<TurnOrderResult> {
    if cfg.initiative_strategy.is_some() {
        for monster in encounter.monsters().filter(|m| m.initiative.is_none()) {
            monster
                .initiative_notation()
                .with_context(|| format!("cannot roll initiative for {}", monster.name))?;
        }
    }

    let mut log = Vec::new();
    let mut dice = Dice::from_seed(cfg.seed);

    if let Some(strategy) = cfg.hit_point_strategy {
        for monster in encounter.monsters_mut() {
            if let Some(hp) = monster.roll_hit_points(&mut dice, strategy, cfg.max_rerolls) {
                log.push(format!("[HP][{}] {} ({}) → {}", monster.name, fmt_hit_dice(monster.hit_dice), strategy, hp));
            }
        }
    }

    if let Some(strategy) = cfg.initiative_strategy {
        for monster in encounter.monsters_mut().filter(|m| m.initiative.is_none()) {
            let init = monster
                .roll_initiative(&mut dice, strategy, cfg.max_rerolls)
                .with_context(|| format!("cannot roll initiative for {}", monster.name))?;
            log.push(format!("[INIT][{}] 1d20{:+} ({}) → {}", monster.name, monster.initiative_bonus, strategy, init));
        }
    }

    encounter.sort_turn_order();
    let order: Vec<String> = encounter.entities.iter().map(order_line).collect();
    for (i, line) in order.iter().enumerate() {
        log.push(format!("[ORDER] {}. {}", i + 1, line));
    }

    Ok(TurnOrderResult { encounter, order, log })
}

fn fmt_hit_dice(dice: Option<DiceNotation>) -> String {
    dice.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

/// One line of a rendered turn order, e.g. `Goblin (monster, init 14)`.
pub fn order_line(entry: &TurnEntry) -> String {
    let kind = match entry {
        TurnEntry::Player(_) => "player",
        TurnEntry::Monster(_) => "monster",
        TurnEntry::RoundMarker(_) => "round",
        TurnEntry::Reminder(_) => "reminder",
    };
    match entry {
        TurnEntry::RoundMarker(_) => format!("{} ({})", entry.label(), kind),
        _ => match entry.initiative() {
            Some(init) => format!("{} ({}, init {})", entry.label(), kind, init),
            None => format!("{} ({}, init -)", entry.label(), kind),
        },
    }
}
