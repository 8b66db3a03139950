//! Process-wide logging on top of `log4rs`.
//!
//! Everything goes to the console. With a log directory configured, the root logger also writes
//! a size-rolled `app.log`, and the `userbase::audit` target is routed to its own `audit.log`.

use crate::types::DocumentId;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

pub const AUDIT_TARGET: &str = "userbase::audit";

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_RETENTION: u32 = 7;

/// Maps `error|warn|info|debug|trace` (any case) to a filter; anything else is `Info`.
#[must_use]
pub fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn rolling(dir: &Path, stem: &str, keep: u32) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    let roller = FixedWindowRoller::builder()
        .build(&format!("{}", dir.join(format!("{stem}.{{}}.log")).display()), keep)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    Ok(RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(dir.join(format!("{stem}.log")), Box::new(policy))?)
}

/// Builds the logging configuration without installing it.
///
/// # Errors
/// Fails when the log directory cannot be created or an appender cannot open its file.
pub fn build_config(
    dir: Option<&Path>,
    level: &str,
    retention: Option<u32>,
) -> Result<Config, Box<dyn std::error::Error>> {
    let lvl = parse_level(level);
    let keep = retention.unwrap_or(DEFAULT_RETENTION);
    let console = ConsoleAppender::builder().encoder(Box::new(PatternEncoder::new(PATTERN))).build();
    let mut builder = Config::builder().appender(Appender::builder().build("console", Box::new(console)));
    let mut root = Root::builder().appender("console");

    if let Some(dir) = dir {
        std::fs::create_dir_all(dir)?;
        builder = builder
            .appender(Appender::builder().build("app", Box::new(rolling(dir, "app", keep)?)))
            .appender(Appender::builder().build("audit", Box::new(rolling(dir, "audit", keep)?)))
            .logger(Logger::builder().appender("audit").additive(false).build(AUDIT_TARGET, LevelFilter::Info));
        root = root.appender("app");
    }

    Ok(builder.build(root.build(lvl))?)
}

/// Installs the process logger. Only the first successful call takes effect.
///
/// # Errors
/// See [`build_config`]; also fails if a logger is already installed.
pub fn configure_logging(
    dir: Option<&Path>,
    level: &str,
    retention: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(dir, level, retention)?;
    log4rs::init_config(config)?;
    Ok(())
}

/// One audit line per mutation.
pub fn audit(op: &str, collection: &str, id: &DocumentId) {
    log::info!(target: AUDIT_TARGET, "op={op} collection={collection} id={id}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names() {
        assert_eq!(parse_level("DEBUG"), LevelFilter::Debug);
        assert_eq!(parse_level(" warn "), LevelFilter::Warn);
        assert_eq!(parse_level("verbose"), LevelFilter::Info);
    }

    #[test]
    fn file_config_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("logs");
        build_config(Some(&dir), "info", Some(2)).unwrap();
        assert!(dir.is_dir());
        build_config(None, "trace", None).unwrap();
    }
}
