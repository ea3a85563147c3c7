//! CLI-specific error types and exit code mapping

use satprobe_core::error::SatprobeError;
use satprobe_harness::HarnessError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The target server did not answer the status probe.
    #[error("server not reachable: {0}")]
    ServerUnavailable(String),

    /// At least one scenario failed.
    #[error("{failed} of {total} scenarios failed")]
    ScenariosFailed { failed: usize, total: usize },

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from satprobe-core.
    #[error("{0}")]
    Core(#[from] SatprobeError),

    /// Harness error outside of a scenario (client setup, shared fixtures).
    #[error("{0}")]
    Harness(#[from] HarnessError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                              |
    /// |------|--------------------------------------|
    /// | 0    | Success                              |
    /// | 1    | General / command error              |
    /// | 2    | Configuration error                  |
    /// | 3    | Server unreachable                   |
    /// | 4    | One or more scenarios failed         |
    /// | 10   | IO error                             |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(SatprobeError::Config(_)) => 2,
            Self::ServerUnavailable(_) => 3,
            Self::ScenariosFailed { .. } => 4,
            Self::Io(_) | Self::Core(SatprobeError::Io(_)) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) | Self::Harness(_) => 1,
        }
    }
}
