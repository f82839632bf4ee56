//! Host log output.
//!
//! Installs a `tracing_subscriber` formatter on stderr and bridges the
//! crate's `log` records into it.  `RUST_LOG` narrows what is printed;
//! otherwise [`log::max_level`] is the only gate, so the `logl` verb and
//! the stored log level keep working after start-up.  ESP-IDF builds use
//! `esp_idf_logger` instead.

use log::LevelFilter;
use tracing_subscriber::EnvFilter;

pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Install the global subscriber and set the `log` level.
///
/// Fails if a subscriber or logger is already installed.
pub fn init(level: LevelFilter) -> Result<(), InitError> {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing_subscriber::filter::LevelFilter::TRACE.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()?;
    log::set_max_level(level);
    Ok(())
}
