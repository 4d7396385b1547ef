//! Error types for directive transport

use thiserror::Error;

/// Errors raised by feedback and directive transports
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectiveError {
    /// The receiving side of the transport is gone
    #[error("transport closed: {0}")]
    TransportClosed(String),

    /// Any other transport failure
    #[error("transport failure: {0}")]
    Transport(String),
}
