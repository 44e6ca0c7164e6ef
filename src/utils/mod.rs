//! Utility functions and helpers

use std::time::Duration;

/// Logging utilities
pub struct Logger;

impl Logger {
    /// Initialize logger with specified level. `RUST_LOG` still applies.
    pub fn init(level: log::LevelFilter) {
        let _ = env_logger::Builder::new()
            .filter_level(level)
            .parse_default_env()
            .format_timestamp_secs()
            .try_init();
    }

    /// Map a `-v` count to a level filter
    pub fn level_for_verbosity(verbosity: u8) -> log::LevelFilter {
        match verbosity {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    /// Log scan completion
    pub fn log_scan_complete(duration: Duration, devices: usize, locations: usize) {
        log::info!(
            "Discovery completed in {:.2}s - {} devices, {} UPNP locations",
            duration.as_secs_f64(),
            devices,
            locations
        );
    }
}
