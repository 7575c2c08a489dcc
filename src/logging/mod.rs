//! Structured logging setup.
//!
//! The core never prints to stdout/stderr directly; it only emits
//! `tracing` events. This module wires a single global subscriber per
//! process: human-readable compact output to stderr when attached to a
//! terminal, newline-delimited JSON otherwise (or when explicitly
//! requested), with verbosity controlled by `-v`/`-q` flags layered under
//! `RUST_LOG`.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::error::Result;

/// Initialize the global `tracing` subscriber.
///
/// `verbose` and `quiet` are the CLI's repeated `-v`/`-q` counts; `force_json`
/// overrides terminal detection (used by `--json`).
pub fn init_logging(verbose: u8, quiet: u8, force_json: Option<bool>) -> Result<()> {
    let default_directive = match (quiet, verbose) {
        (q, _) if q >= 2 => "off",
        (1, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let use_json = force_json.unwrap_or_else(|| !std::io::stderr().is_terminal());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(std::io::stderr);

    let result = if use_json {
        subscriber.json().try_init()
    } else {
        subscriber.compact().try_init()
    };

    // A subscriber may already be installed (e.g. repeated init in tests);
    // that is not an error condition worth surfacing to the caller.
    let _ = result;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_does_not_panic() {
        let _ = init_logging(0, 0, Some(false));
    }
}
