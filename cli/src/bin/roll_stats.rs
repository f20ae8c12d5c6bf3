use clap::Parser;
use engine::{Dice, DiceNotation, RollStrategy, MAX_REROLLS};
use initiative_cli::logging;

#[derive(Parser)]
#[command(name = "roll-stats")]
#[command(about = "Monte Carlo sim: compare roll strategies for one dice notation")]
struct Args {
    /// Dice notation NdM[+-]K
    notation: String,

    /// Number of trials per strategy
    #[arg(long, default_value_t = 1000)]
    trials: u32,

    /// Rerolls allowed for the low/high strategies
    #[arg(long, default_value_t = MAX_REROLLS)]
    max_rerolls: u32,

    /// RNG base seed (strategy i uses seed+i)
    #[arg(long, default_value_t = 12345)]
    seed: u64,
}

struct Stats {
    min: i32,
    max: i32,
    mean: f64,
    median: f64,
}

fn stats(mut totals: Vec<i32>) -> Option<Stats> {
    if totals.is_empty() {
        return None;
    }
    totals.sort_unstable();
    let n = totals.len();
    let median = if n % 2 == 1 {
        totals[n / 2] as f64
    } else {
        (totals[n / 2 - 1] as f64 + totals[n / 2] as f64) / 2.0
    };
    let mean = totals.iter().map(|&t| t as i64).sum::<i64>() as f64 / n as f64;
    Some(Stats {
        min: totals[0],
        max: totals[n - 1],
        mean,
        median,
    })
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let args = Args::parse();
    let notation = DiceNotation::parse(&args.notation)
        .map_err(|e| anyhow::anyhow!("invalid dice notation '{}': {}", args.notation, e))?;
    if args.trials == 0 {
        anyhow::bail!("--trials must be at least 1");
    }

    println!("roll-stats results");
    println!("------------------");
    println!("notation:           {}", notation);
    println!("trials:             {}", args.trials);
    println!(
        "range:              {}..={} (average {})",
        notation.min_total(),
        notation.max_total(),
        notation.average_total()
    );
    println!();
    println!("{:<10} {:>8} {:>8} {:>8} {:>8}", "strategy", "min", "mean", "median", "max");

    for (i, strategy) in RollStrategy::ALL.into_iter().enumerate() {
        let mut dice = Dice::from_seed(args.seed.wrapping_add(i as u64));
        let totals: Vec<i32> = (0..args.trials)
            .map(|_| notation.resolve_bounded(strategy, &mut dice, args.max_rerolls))
            .collect();
        if let Some(s) = stats(totals) {
            println!(
                "{:<10} {:>8} {:>8.2} {:>8.1} {:>8}",
                strategy.as_str(),
                s.min,
                s.mean,
                s.median,
                s.max
            );
        }
    }

    Ok(())
}
