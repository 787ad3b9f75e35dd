//! Error handling module for raidgrow
//!
//! Provides the error taxonomy used by every workflow. Configuration, topology
//! and layout errors are raised before any external action mutates the host;
//! step errors are raised at the point an external command fails.

use thiserror::Error;

/// Main error type for raidgrow
#[derive(Error, Debug)]
pub enum RaidError {
    /// Invalid or missing operator parameters
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The existing array's state could not be determined
    #[error("Topology error: {0}")]
    Topology(String),

    /// Unrecognized layout for the requested or discovered level
    #[error("Layout error: {0}")]
    Layout(String),

    /// An external command failed and was not marked tolerable
    #[error("Command did not complete successfully: {command}: {reason}")]
    StepExecution { command: String, reason: String },

    /// A shutdown signal arrived before the step could be issued
    #[error("Interrupted before running: {command}")]
    Interrupted { command: String },

    /// Workflow state machine violation
    #[error("Stage transition error: {0}")]
    StageTransition(String),

    /// IO errors (status files, spawning tools)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for raidgrow operations
pub type Result<T> = std::result::Result<T, RaidError>;

impl RaidError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a topology error
    pub fn topology(msg: impl Into<String>) -> Self {
        Self::Topology(msg.into())
    }

    /// Create a layout error
    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }

    /// Create a step execution error
    pub fn step(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StepExecution {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// True for failures detected while validating operator input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Process exit code for this error.
    ///
    /// | Error | Code |
    /// |-------|------|
    /// | Configuration | 1 |
    /// | Topology, Layout | 2 |
    /// | everything raised while running steps | 3 |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 1,
            Self::Topology(_) | Self::Layout(_) => 2,
            Self::StepExecution { .. }
            | Self::Interrupted { .. }
            | Self::StageTransition(_)
            | Self::Io(_) => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RaidError::config("volume group must be specified");
        assert_eq!(
            err.to_string(),
            "Configuration error: volume group must be specified"
        );

        let err = RaidError::step("mdadm --stop /dev/md0", "exit code 1");
        assert_eq!(
            err.to_string(),
            "Command did not complete successfully: mdadm --stop /dev/md0: exit code 1"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "mdstat missing");
        let err: RaidError = io_err.into();
        assert!(matches!(err, RaidError::Io(_)));
    }

    #[test]
    fn test_exit_codes_separate_validation_from_runtime() {
        assert_eq!(RaidError::config("x").exit_code(), 1);
        assert_eq!(RaidError::topology("x").exit_code(), 2);
        assert_eq!(RaidError::layout("x").exit_code(), 2);
        assert_eq!(RaidError::step("cmd", "x").exit_code(), 3);

        assert!(RaidError::config("x").is_validation());
        assert!(!RaidError::step("cmd", "x").is_validation());
    }
}
