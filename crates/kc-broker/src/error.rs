//! Identity broker error types.
//!
//! ## NIST 800-53 Rev5: SI-10 (Information Input Validation)
//!
//! Values asserted by an external identity provider are validated before they
//! reach the user record. A rejected value aborts the brokering flow and is
//! reported with enough context to be logged by the caller.

use thiserror::Error;

/// Errors that can occur while mapping brokered identities.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// An asserted attribute value failed the configured pattern.
    #[error("regex didn't match during IDP brokering for attribute: {value}, with regex {pattern}")]
    RegexMismatch {
        /// The offending value.
        value: String,
        /// The configured pattern, as written by the administrator.
        pattern: String,
    },

    /// The configured pattern does not compile.
    #[error("invalid attribute value regex {pattern:?}: {source}")]
    InvalidRegex {
        /// The configured pattern.
        pattern: String,
        /// Underlying compile error.
        #[source]
        source: regex::Error,
    },

    /// The mapper model is malformed.
    #[error("mapper configuration error: {0}")]
    Configuration(String),

    /// No mapper is registered under the requested provider ID.
    #[error("unknown identity provider mapper: {0}")]
    UnknownMapper(String),
}

impl BrokerError {
    /// Creates a regex mismatch error.
    #[must_use]
    pub fn regex_mismatch(value: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::RegexMismatch {
            value: value.into(),
            pattern: pattern.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Checks if this error was caused by mapper configuration.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRegex { .. } | Self::Configuration(_) | Self::UnknownMapper(_)
        )
    }

    /// Checks if this error was caused by an asserted value.
    #[must_use]
    pub const fn is_validation_error(&self) -> bool {
        matches!(self, Self::RegexMismatch { .. })
    }
}

/// Result type for broker operations.
pub type BrokerResult<T> = Result<T, BrokerError>;
