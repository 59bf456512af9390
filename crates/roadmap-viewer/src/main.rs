//! Roadmap Viewer - command-line driver for the roadmap engine
//!
//! Builds a synthetic street grid, then replays a scripted pan/zoom session and logs
//! what the engine produces for each step. Set `RUST_LOG=debug` to see every redraw.

mod session;
mod settings;

use clap::Parser;
use settings::Settings;
use std::process::ExitCode;

/// Initialize the `tracing` subscriber
///
/// `RUST_LOG` wins when set; otherwise debug builds log our crates at debug level.
fn setup_logging() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    let default_filter = if cfg!(debug_assertions) {
        "info,roadmap_lib=debug,roadmap_viewer=debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(filter))
        .init();
}

fn main() -> ExitCode {
    setup_logging();
    tracing::info!(
        "{} v{} starting",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let settings = Settings::parse();
    tracing::debug!("Settings: {:?}", settings);

    let result = {
        #[cfg(feature = "profiling")]
        profiling::scope!("viewer::session");

        session::run(&settings)
    };
    profiling::finish_frame!();

    match result {
        Ok(report) => {
            tracing::info!(
                "Session finished: {} frames, {} reveal regions, {} lines",
                report.frames,
                report.reveal_regions,
                report.lines
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Session failed: {e}");
            ExitCode::FAILURE
        }
    }
}
