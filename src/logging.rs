use std::str::FromStr;

use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};

use crate::config::Config;
use crate::eval::Decision;

/// Route `log` records to the configured decision log file.
///
/// Best-effort: any failure leaves logging disabled, since logging must
/// never block the hook. Returns whether a logger was installed.
pub fn init(config: &Config) -> bool {
    if !config.logging.enabled {
        return false;
    }
    let Some(level) = effective_level(&config.logging.level) else {
        return false;
    };

    let path = config.log_path();
    if let Some(dir) = path.parent()
        && std::fs::create_dir_all(dir).is_err()
    {
        return false;
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
    else {
        return false;
    };

    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();
    WriteLogger::init(level, log_config, file).is_ok()
}

/// Resolve the configured level name. `off` disables the log; anything
/// quieter than `info` is raised to `info` so decision lines are always kept.
fn effective_level(name: &str) -> Option<LevelFilter> {
    let level = LevelFilter::from_str(name).unwrap_or(LevelFilter::Info);
    if level == LevelFilter::Off {
        return None;
    }
    Some(level.max(LevelFilter::Info))
}

/// Record one evaluated command.
pub fn log_decision(command: &str, decision: &Decision) {
    log::info!("{}", format_decision(command, decision));
}

/// Single tab-separated line: decision, rule, command, reason.
fn format_decision(command: &str, decision: &Decision) -> String {
    // Compact single-line command for the log
    let cmd_truncated: String = command
        .chars()
        .take(200)
        .collect::<String>()
        .replace('\n', "; ");
    format!(
        "{decision}\t{rule}\t{cmd}\t{reason}",
        decision = decision.as_str(),
        rule = decision.rule().unwrap_or("-"),
        cmd = cmd_truncated,
        reason = decision.reason().unwrap_or("-"),
    )
}
