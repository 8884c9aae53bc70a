//! Error types for the device binary.

use primejar_core::config::ConfigError;
use primejar_core::engine::EngineError;
use primejar_observer::startup::StartupError;

/// Errors that can occur while bringing the device up.
///
/// Once startup succeeds, nothing is fatal; these only cover the wiring
/// phase before the jar goes unattended.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Configuration could not be loaded.
    #[error("config error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// The step engine could not be constructed.
    #[error("engine error: {source}")]
    Engine {
        /// The underlying engine error.
        #[from]
        source: EngineError,
    },

    /// The network surface could not be spawned.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying startup error.
        #[from]
        source: StartupError,
    },
}
