//! Error types for the call bridge.

use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// The kind of a bridge error, as reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No engine has been initialized yet.
    NotInitialized,
    /// Engine construction failed.
    Init,
    /// A join was rejected (re-entrancy or engine failure).
    Call,
    Hangup,
    Mic,
    Speaker,
    Interrupt,
    VoiceInterrupt,
    VoiceSwitch,
    Camera,
    AgentType,
    /// Command arguments were missing or malformed.
    InvalidArgument,
    /// The command name is not known to this bridge.
    NotImplemented,
}

impl ErrorKind {
    /// Returns the host-facing error code.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotInitialized => "NOT_INITIALIZED",
            ErrorKind::Init => "INIT_ERROR",
            ErrorKind::Call => "CALL_ERROR",
            ErrorKind::Hangup => "HANGUP_ERROR",
            ErrorKind::Mic => "MIC_ERROR",
            ErrorKind::Speaker => "SPEAKER_ERROR",
            ErrorKind::Interrupt => "INTERRUPT_ERROR",
            ErrorKind::VoiceInterrupt => "VOICE_INTERRUPT_ERROR",
            ErrorKind::VoiceSwitch => "VOICE_SWITCH_ERROR",
            ErrorKind::Camera => "CAMERA_ERROR",
            ErrorKind::AgentType => "AGENT_TYPE_ERROR",
            ErrorKind::InvalidArgument => "INVALID_ARGUMENTS",
            ErrorKind::NotImplemented => "NOT_IMPLEMENTED",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Error returned to the host for a failed command.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind}: {message}")]
pub struct BridgeError {
    /// Error kind.
    #[serde(rename = "code")]
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Diagnostic detail from the engine, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl BridgeError {
    /// Creates a new error without details.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Attaches diagnostic details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Wraps an engine failure under the given kind.
    pub fn from_engine(kind: ErrorKind, message: impl Into<String>, err: &EngineError) -> Self {
        Self::new(kind, message).with_details(err.to_string())
    }

    pub fn not_initialized() -> Self {
        Self::new(ErrorKind::NotInitialized, "AI call engine not initialized")
    }

    pub fn not_implemented(command: &str) -> Self {
        Self::new(
            ErrorKind::NotImplemented,
            format!("command not implemented: {}", command),
        )
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    /// Serializes the error into the host channel representation.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Failure reported by an underlying engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("engine construction failed: {0}")]
    Construction(String),
    #[error("engine rejected request ({code}): {message}")]
    Rejected { code: i32, message: String },
    #[error("engine released")]
    Released,
    #[error("engine panicked: {0}")]
    Panicked(String),
}

/// Error type for outbound channel operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("channel closed")]
    Closed,
}
