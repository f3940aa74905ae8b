// ============================================================================
// kun-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: env_logger Initialization
//
// kun-core reports through the `log` facade. The CLI installs env_logger as
// the backend, writing to stderr so stdout stays clean for `probe --json`.
//
// USAGE:
// - default: info and above
// - --verbose: debug output, including every raw ffmpeg line
// - RUST_LOG overrides both, e.g. RUST_LOG=kun_core=trace

use env_logger::{Builder, Env};
use std::io::Write;

/// Default filter when RUST_LOG is not set.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

/// Installs the global logger. Safe to call once per process.
pub fn init_logging(verbose: bool) {
    Builder::from_env(Env::default().default_filter_or(default_filter(verbose)))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
