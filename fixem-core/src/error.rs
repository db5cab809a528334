//! Shared error type for the FixEm workspace.

use thiserror::Error;

/// Errors produced anywhere in the FixEm core: wire codec, order store,
/// scenario engine, session handler, or certification validator.
#[derive(Debug, Error)]
pub enum FixemError {
    /// A required tag was missing from an inbound message.
    #[error("missing required tag {tag}")]
    MissingTag {
        /// The tag number that was absent.
        tag: u32,
    },

    /// A tag's value failed to parse as the expected type.
    #[error("invalid value for tag {tag}: {reason}")]
    InvalidValue {
        /// The offending tag number.
        tag: u32,
        /// Human-readable reason.
        reason: String,
    },

    /// Business-level rejection: duplicate ClOrdID, unknown order, etc.
    #[error("business reject: {0}")]
    BusinessReject(String),

    /// Session-level rejection (35=3).
    #[error("session reject: tag {tag}, reason {reason_code}: {text}")]
    SessionReject {
        /// Offending tag (371).
        tag: u32,
        /// SessionRejectReason code (373).
        reason_code: u32,
        /// Free-text explanation (58).
        text: String,
    },

    /// The order store has no record for the requested ClOrdID.
    #[error("unknown order: {0}")]
    UnknownOrder(String),

    /// A ClOrdID is already present in the order store.
    #[error("duplicate ClOrdID: {0}")]
    DuplicateClOrdId(String),

    /// Scenario engine encountered an unsupported or malformed step.
    #[error("scenario error: {0}")]
    Scenario(String),

    /// Configuration is missing a required block.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transport-level I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, FixemError>;
