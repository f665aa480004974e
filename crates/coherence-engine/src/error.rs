//! Error types for the field engine binary.
//!
//! [`EngineError`] wraps every failure mode of engine startup and shutdown
//! so that `main` can propagate with `?`.

/// Top-level error for the field engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: coherence_core::ConfigError,
    },

    /// The core rejected an operation.
    #[error("core error: {source}")]
    Core {
        /// The underlying core error.
        #[from]
        source: coherence_core::CoreError,
    },

    /// An emitter could not be started.
    #[error("emitter error: {source}")]
    Emitter {
        /// The underlying emitter error.
        #[from]
        source: coherence_core::EmitterError,
    },

    /// Waiting for the shutdown signal failed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
