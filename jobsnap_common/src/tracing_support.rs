//! Support for tracing execution of a program.

use tracing_subscriber::{
    fmt::{format::FmtSpan, Subscriber},
    prelude::*,
    EnvFilter,
};

/// The filter we use when `RUST_LOG` is unset or invalid. At this level a
/// normal run, including the failures we report to the user, logs nothing.
pub const DEFAULT_FILTER: &str = "warn";

/// Set up the `tracing` library, writing to standard error so that log output
/// never gets mixed into the tables we print on standard output.
pub fn initialize_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    Subscriber::builder()
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(filter)
        .finish()
        .init();
}
