use crate::spec::Spec;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    /// A search or resolve operation matched nothing. Carries the stage that
    /// failed to match when it is known, so callers can report which part of
    /// a path came up empty.
    #[error("element not found{}", not_found_suffix(.spec))]
    ElementNotFound { spec: Option<Spec> },

    #[error("Platform-specific error: {0}")]
    PlatformError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),
}

impl AutomationError {
    /// Whether this is the recoverable not-found case that fallback paths
    /// are allowed to absorb.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AutomationError::ElementNotFound { .. })
    }
}

fn not_found_suffix(spec: &Option<Spec>) -> String {
    match spec {
        Some(spec) => format!(" for {spec}"),
        None => String::new(),
    }
}
