use colored::{ColoredString, Colorize};
use env_logger::Builder;
use log::{Level, LevelFilter, Record};
use std::io::Write;

use crate::utils::config::PackagePaths;

/// Colors for report lines (render/benchmark summaries, validation results).
pub struct Colors;

impl Colors {
    pub const OK: &'static str = "green";
    pub const BAD: &'static str = "red";
    pub const INFO: &'static str = "cyan";
    pub const NOTE: &'static str = "yellow";

    pub fn colorize(color: &str, text: &str) -> ColoredString {
        text.color(color)
    }
}

/// `[pseudofarm]` prefix, plus level and target for warnings and errors.
fn prefix(record: &Record) -> String {
    let name = PackagePaths::get().pkg_name().cyan();
    let level = match record.level() {
        Level::Error => "ERROR".red(),
        Level::Warn => "WARN".yellow(),
        _ => return format!("[{name}]"),
    };
    format!("[{name} {level} {}]", record.target().white())
}

/// Install the terminal logger: this crate at Info (Debug when `verbose`), dependencies at Warn.
/// `RUST_LOG` still applies on top. A logger installed earlier is left in place.
pub fn setup_logging(verbose: bool) {
    let ours = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = Builder::from_default_env()
        .filter_level(LevelFilter::Warn)
        .filter_module(PackagePaths::get().pkg_name(), ours)
        .format(|buf, record| writeln!(buf, "{} {}", prefix(record), record.args()))
        .try_init();
}
