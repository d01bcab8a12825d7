//! Logging infrastructure.
//!
//! Structured logging via the `log` facade with an `env_logger` backend.
//! The effective level comes from (in priority order):
//!
//! 1. the `RUST_LOG` environment variable, if set;
//! 2. the `--verbose` CLI flag (debug level);
//! 3. the default: warnings and errors only.
//!
//! Step tracing (per-file reconciliation decisions, phase boundaries) is
//! emitted at debug/trace level, so a default run stays quiet unless
//! something goes wrong. The `log` facade is the sink abstraction: tests or
//! embedders can install any logger they like instead of calling [`init`].

use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Initialize the logging subsystem from the CLI verbosity flag.
///
/// Call once at startup before any logging. Repeated calls (as happens
/// across tests) are a no-op.
pub fn init(verbose: bool) {
    let mut builder = Builder::new();
    if env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else {
        builder.filter_level(level_for(verbose));
    }
    builder.format(|buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);
        writeln!(buf, "{style}{level:<5}{style:#} {}", record.args())
    });
    // A second init attempt returns Err; that only occurs in test binaries.
    let _ = builder.try_init();
}

/// Map the verbosity flag to a log level: verbose → debug, default → warn.
fn level_for(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}
