//! Interpreter diagnostics through `tracing`.
//!
//! These events describe what the interpreter itself is doing (options it
//! resolved, loops it skipped, settings it could not read). The debug-mode
//! trace table is a different thing: it shows the Brainfuck program's state
//! and is asked for with `--debug`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Route interpreter events to stderr, keeping stdout for program output.
///
/// `RUST_LOG` picks the level; without it only warnings such as an
/// unreadable `bf.toml` are shown.
///
/// ```bash
/// RUST_LOG=bf_tape=trace bf --program "+[-]"
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // Tests may install a subscriber first; that one stays.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
