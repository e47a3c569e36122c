//! Tracing setup for the CLI.
//!
//! Progress lines are plain `println!`; this subscriber only carries the
//! diagnostic detail behind `-v`, written to stderr.

use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LEVEL: &str = "warn";

/// Filter directive for a `-v` count. `RUST_LOG` wins when set.
pub fn filter_for(verbose: u8) -> String {
    let level = match verbose {
        0 => DEFAULT_LEVEL,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("proton_pack={level}")
}

pub fn init(verbose: u8) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_for(verbose)));

    if tracing::subscriber::set_global_default(
        fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .finish(),
    )
    .is_err()
    {
        // Already installed; happens when tests call init twice.
    }
}
