// ============================================================================
// scenecut-cli/src/logging.rs
// ============================================================================
//
// LOGGING UTILITIES: Logger setup and time-based identifiers
//
// The CLI logs through the standard `log` facade with `env_logger` as the
// backend. Library crates only emit records; this module decides how they
// look on the terminal.
//
// KEY COMPONENTS:
// - init_logging: Colored, timestamped env_logger output on stderr
// - get_timestamp / generate_job_id: Identifiers for plan files and runs
//
// USAGE:
// - default: info and above
// - --verbose: debug and above
// - RUST_LOG still filters per module when set

use log::LevelFilter;
use owo_colors::OwoColorize;
use std::io::Write;

/// Initializes the global logger.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    init_with_level(level);
}

fn init_with_level(level: LevelFilter) {
    let _ = env_logger::Builder::new()
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            let level_str = match record.level() {
                log::Level::Error => "ERROR",
                log::Level::Warn => "WARN ",
                log::Level::Info => "INFO ",
                log::Level::Debug => "DEBUG",
                log::Level::Trace => "TRACE",
            };
            let level_colored = match record.level() {
                log::Level::Error => level_str.bright_red().to_string(),
                log::Level::Warn => level_str.yellow().to_string(),
                log::Level::Info => level_str.green().to_string(),
                log::Level::Debug => level_str.blue().to_string(),
                log::Level::Trace => level_str.magenta().to_string(),
            };
            writeln!(
                buf,
                "{} {} {}",
                timestamp.to_string().white(),
                level_colored,
                record.args()
            )
        })
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Returns a run identifier of the form `YYYYmmddHHMMSS_<8 hex digits>`.
///
/// # Example
/// ```
/// let id = scenecut_cli::logging::generate_job_id();
/// assert_eq!(id.len(), 23);
/// ```
pub fn generate_job_id() -> String {
    let suffix: u32 = rand::random();
    format!(
        "{}_{:08x}",
        chrono::Local::now().format("%Y%m%d%H%M%S"),
        suffix
    )
}
