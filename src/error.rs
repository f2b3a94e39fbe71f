//! Typed error hierarchy for the Channel Access protocol engine.
//!
//! All fallible operations return `Result<T, CaError>`. No panics on
//! invalid input — every error is typed and carries the context a caller
//! needs to log and decide (the offending command, the role, a snapshot
//! of the relevant state).

use thiserror::Error;

/// The top-level error type for the CA protocol engine.
#[derive(Debug, Error)]
pub enum CaError {
    /// The host attempted to send a command illegal in the current state.
    /// The command is rejected; the connection is left unchanged.
    #[error("{0}")]
    Local(#[from] LocalProtocolError),

    /// Received bytes violate the protocol: unknown command, illegal
    /// transition, or malformed framing. The host should close the
    /// connection.
    #[error("{0}")]
    Remote(#[from] RemoteProtocolError),

    /// An argument was out of bounds (priority, name length, role).
    #[error("{0}")]
    Value(#[from] CaprotoValueError),

    /// A reference to an unknown cid/sid/ioid/subscriptionid.
    #[error("{0}")]
    Key(#[from] CaprotoKeyError),

    /// The peer returned a protocol-level `ERROR_RESPONSE`.
    #[error("{0}")]
    ErrorResponse(#[from] ErrorResponseReceived),
}

/// The host tried to send a command that is illegal given the current
/// state of the circuit or channel.
#[derive(Debug, Error)]
#[error("local protocol error{}: {message}", command.map(|c| format!(" ({c})")).unwrap_or_default())]
pub struct LocalProtocolError {
    /// Name of the command that was rejected, if known.
    pub command: Option<&'static str>,
    /// Human-readable explanation, including the state that rejected it.
    pub message: String,
}

impl LocalProtocolError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            command: None,
            message: message.into(),
        }
    }

    pub fn for_command(command: &'static str, message: impl Into<String>) -> Self {
        Self {
            command: Some(command),
            message: message.into(),
        }
    }
}

/// Received bytes violate the protocol.
#[derive(Debug, Error)]
#[error("remote protocol error: {message}")]
pub struct RemoteProtocolError {
    pub message: String,
}

impl RemoteProtocolError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// An argument supplied by the host was out of bounds.
#[derive(Debug, Error)]
#[error("invalid value for {field}: {message}")]
pub struct CaprotoValueError {
    pub field: &'static str,
    pub message: String,
}

impl CaprotoValueError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// A reference to an id that is not currently live.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CaprotoKeyError {
    #[error("unknown cid: {0}")]
    UnknownCid(u32),
    #[error("unknown sid: {0}")]
    UnknownSid(u32),
    #[error("unknown ioid: {0}")]
    UnknownIoid(u32),
    #[error("unknown subscriptionid: {0}")]
    UnknownSubscriptionId(u32),
    #[error("unknown search id: {0}")]
    UnknownSearchId(u32),
}

/// The peer sent a protocol-level `ERROR_RESPONSE`. Routine: the circuit
/// remains usable, but the associated ioid (if any) has been released.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("error response (status {status_code:#x}): {message}")]
pub struct ErrorResponseReceived {
    pub status_code: u32,
    pub message: String,
    /// The ioid that was released as a result, if this error was
    /// correlated to an in-flight request.
    pub ioid: Option<u32>,
}

impl From<crate::state::CircuitStateError> for CaError {
    fn from(e: crate::state::CircuitStateError) -> Self {
        match e {
            crate::state::CircuitStateError::Local(e) => CaError::Local(e),
            crate::state::CircuitStateError::Remote(e) => CaError::Remote(e),
        }
    }
}

impl From<crate::state::ChannelStateError> for CaError {
    fn from(e: crate::state::ChannelStateError) -> Self {
        match e {
            crate::state::ChannelStateError::Local(e) => CaError::Local(e),
            crate::state::ChannelStateError::Remote(e) => CaError::Remote(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_error_display_includes_command() {
        let e = LocalProtocolError::for_command("ReadNotifyRequest", "circuit not connected");
        assert!(e.to_string().contains("ReadNotifyRequest"));
        assert!(e.to_string().contains("circuit not connected"));
    }

    #[test]
    fn local_error_display_without_command() {
        let e = LocalProtocolError::new("bad priority");
        assert_eq!(e.to_string(), "local protocol error: bad priority");
    }

    #[test]
    fn key_error_variants_display() {
        let e = CaprotoKeyError::UnknownCid(42);
        assert!(e.to_string().contains("42"));
    }

    #[test]
    fn error_response_display() {
        let e = ErrorResponseReceived {
            status_code: 0xa,
            message: "ECA_TIMEOUT".into(),
            ioid: Some(7),
        };
        assert!(e.to_string().contains("ECA_TIMEOUT"));
    }

    #[test]
    fn ca_error_from_conversions() {
        let e: CaError = LocalProtocolError::new("x").into();
        assert!(matches!(e, CaError::Local(_)));
        let e: CaError = CaprotoKeyError::UnknownIoid(1).into();
        assert!(matches!(e, CaError::Key(_)));
    }
}
