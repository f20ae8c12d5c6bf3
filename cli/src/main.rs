use clap::{Parser, Subcommand, ValueEnum};
use engine::api::{self, RollConfig, TurnOrderConfig};
use engine::config::TrackerConfig;
use engine::{DiceNotation, RollStrategy};
use initiative_cli::{io, logging};
use std::path::PathBuf;

#[derive(Copy, Clone, ValueEnum)]
enum Strategy {
    Random,
    Average,
    Minimum,
    Maximum,
    Low,
    High,
}

#[derive(Subcommand)]
enum Cmd {
    /// Resolve a dice notation (e.g. 2d6+1) under a roll strategy
    Roll {
        /// Dice notation NdM[+-]K
        notation: String,
        /// Roll strategy (defaults to the configured one)
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,
        /// RNG seed for determinism (defaults to the configured one, else entropy)
        #[arg(long)]
        seed: Option<u64>,
        /// Number of rolls
        #[arg(long, default_value_t = 1)]
        times: u32,
    },
    /// Show the minimum, average and maximum totals of a notation
    Range {
        /// Dice notation NdM[+-]K
        notation: String,
    },
    /// Sort an encounter into turn order
    Order {
        /// Encounter JSON file
        #[arg(long, conflicts_with = "builtin")]
        file: Option<PathBuf>,
        /// Name of a built-in encounter
        #[arg(long)]
        builtin: Option<String>,
        /// Roll initiative for monsters that have none
        #[arg(long, value_enum)]
        initiative: Option<Strategy>,
        /// Roll monster hit points from their hit dice
        #[arg(long, value_enum)]
        hp: Option<Strategy>,
        /// RNG seed for determinism (defaults to the configured one, else entropy)
        #[arg(long)]
        seed: Option<u64>,
        /// Print the sorted encounter as JSON instead of a list
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Also print the roll log
        #[arg(long, default_value_t = false)]
        verbose: bool,
    },
    /// Roll a notation many times and summarize the results
    Summary {
        /// Dice notation NdM[+-]K
        notation: String,
        /// Roll strategy (defaults to the configured one)
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,
        /// Number of samples
        #[arg(long, default_value_t = 1000)]
        samples: u32,
        /// RNG seed for determinism (defaults to the configured one, else entropy)
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Parser)]
#[command(name = "initiative")]
#[command(about = "Encounter tracker dice and turn-order harness")]
struct Cli {
    /// Tracker config file (JSON, or YAML with a .yaml/.yml extension)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Cmd,
}

fn to_strategy(s: Strategy) -> RollStrategy {
    match s {
        Strategy::Random => RollStrategy::Random,
        Strategy::Average => RollStrategy::Average,
        Strategy::Minimum => RollStrategy::Minimum,
        Strategy::Maximum => RollStrategy::Maximum,
        Strategy::Low => RollStrategy::Low,
        Strategy::High => RollStrategy::High,
    }
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();
    let cfg = match cli.config.as_ref() {
        Some(path) => TrackerConfig::load(path)?,
        None => TrackerConfig::default(),
    };

    match cli.cmd {
        Cmd::Roll {
            notation,
            strategy,
            seed,
            times,
        } => {
            let notation: DiceNotation = parse_notation(&notation)?;
            let strategy = strategy.map(to_strategy).unwrap_or(cfg.dice.default_strategy);
            let mut dice = cfg.dice.dice(seed);
            for _ in 0..times {
                println!("{}", notation.resolve_bounded(strategy, &mut dice, cfg.dice.max_rerolls));
            }
        }
        Cmd::Range { notation } => {
            let notation = parse_notation(&notation)?;
            println!(
                "{}: min={} average={} max={}",
                notation,
                notation.min_total(),
                notation.average_total(),
                notation.max_total()
            );
        }
        Cmd::Order {
            file,
            builtin,
            initiative,
            hp,
            seed,
            json,
            verbose,
        } => {
            let order_cfg = TurnOrderConfig {
                encounter_id: builtin,
                encounter_path: None,
                initiative_strategy: initiative.map(to_strategy),
                hit_point_strategy: hp.map(to_strategy),
                seed: cfg.dice.seed_or(seed),
                max_rerolls: cfg.dice.max_rerolls,
            };
            let res = match file {
                Some(path) => api::order_encounter(io::read_encounter_auto(&path)?, &order_cfg)?,
                None if order_cfg.encounter_id.is_some() => api::turn_order(order_cfg)?,
                None => anyhow::bail!("pass --file or --builtin"),
            };
            if verbose {
                for line in res.log.iter().filter(|l| !l.starts_with("[ORDER]")) {
                    eprintln!("{}", line);
                }
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&res.encounter)?);
            } else {
                for (i, line) in res.order.iter().enumerate() {
                    println!("{}. {}", i + 1, line);
                }
            }
        }
        Cmd::Summary {
            notation,
            strategy,
            samples,
            seed,
        } => {
            let strategy = strategy.map(to_strategy).unwrap_or(cfg.dice.default_strategy);
            let summary = api::roll_many(RollConfig {
                notation,
                strategy,
                samples,
                seed: cfg.dice.seed_or(seed),
                max_rerolls: cfg.dice.max_rerolls,
            })?;
            println!("summary {} ({})", summary.notation, summary.strategy);
            println!("---------------------");
            println!("samples:   {}", summary.samples);
            println!("min:       {}", summary.min);
            println!("max:       {}", summary.max);
            println!("mean:      {:.2}", summary.mean);
            println!("median:    {:.1}", summary.median);
            println!(
                "range:     {}..={} (average {})",
                summary.theoretical_min, summary.theoretical_max, summary.theoretical_average
            );
        }
    }
    Ok(())
}

fn parse_notation(src: &str) -> anyhow::Result<DiceNotation> {
    DiceNotation::parse(src).map_err(|e| anyhow::anyhow!("invalid dice notation '{}': {}", src, e))
}
