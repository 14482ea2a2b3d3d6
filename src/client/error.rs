// ABOUTME: Session error type shared by the client, the connection layer and the test server
// ABOUTME: Wraps I/O, codec and text failures and carries SMPP status codes from responses

use crate::codec::CodecError;
use crate::datatypes::{CommandId, CommandStatus};
use crate::pdutext::TextError;
use std::io;
use thiserror::Error;

/// Errors returned by session operations
#[derive(Debug, Error)]
pub enum SmppError {
    /// I/O error during network operations (connection, read, write)
    #[error("Connection error: {0}")]
    Connection(#[from] io::Error),

    /// A PDU could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Message text could not be represented in the chosen coding
    #[error("Text error: {0}")]
    Text(#[from] TextError),

    /// The peer answered with a non-zero command_status
    #[error("Response status: {0}")]
    Status(CommandStatus),

    /// No response within the configured timeout
    #[error("Operation timeout")]
    Timeout,

    /// The session has no bound connection
    #[error("Session is not bound")]
    NotBound,

    /// The connection went away while the request was in flight
    #[error("Not connected")]
    NotConnected,

    /// Too many requests are waiting for responses
    #[error("Maximum window size reached")]
    MaxWindowSize,

    /// The peer stopped answering enquire_link
    #[error("Enquire link response timeout")]
    EnquireLinkTimeout,

    /// The bind was answered with some other PDU
    #[error("Bind answered with {0}")]
    BindWrongResponse(CommandId),

    /// Unexpected PDU received (wrong response type for request)
    #[error("Unexpected PDU: expected {expected}, got {actual}")]
    UnexpectedPdu { expected: CommandId, actual: CommandId },

    /// Connection closed unexpectedly
    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    /// TLS setup or handshake failed
    #[error("TLS error: {0}")]
    Tls(String),

    /// Data validation error (invalid message length, malformed addresses, etc.)
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias for SMPP operations
pub type SmppResult<T> = Result<T, SmppError>;

impl SmppError {
    /// True when the error came from the peer's command_status.
    pub fn status(&self) -> Option<CommandStatus> {
        match self {
            SmppError::Status(status) => Some(*status),
            _ => None,
        }
    }
}
