use tracing::warn;
use tracing_subscriber::filter::LevelFilter;

/// Environment variable holding the max log level (`trace` .. `error`, `off`).
pub const LOG_ENV: &str = "INITIATIVE_LOG";

const DEFAULT_LEVEL: LevelFilter = LevelFilter::WARN;

/// Install a stderr fmt subscriber. Safe to call more than once.
pub fn init() {
    let (level, rejected) = match std::env::var(LOG_ENV) {
        Ok(raw) => match raw.trim().parse::<LevelFilter>() {
            Ok(level) => (level, None),
            Err(err) => (DEFAULT_LEVEL, Some((raw, err.to_string()))),
        },
        Err(_) => (DEFAULT_LEVEL, None),
    };

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    if let Some((raw, err)) = rejected {
        warn!("ignoring {}={:?}: {}", LOG_ENV, raw, err);
    }
}
