//! Error kinds the core distinguishes (spec.md §7).
//!
//! Every connection-facing operation returns `Result<T>` using this enum.
//! `ServerError` does not itself decide whether a connection is torn down —
//! that policy lives in `net::connection`, which matches on the variant.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Bad VarInt, bad UTF-8, length out of range.
    #[error("malformed packet data: {0}")]
    Malformed(String),

    /// A frame's declared length exceeds the 2 MiB cap.
    #[error("frame too large: {0} bytes")]
    FrameTooLarge(usize),

    /// EOF while a frame was only partially read.
    #[error("short frame: connection closed mid-frame")]
    ShortFrame,

    /// Wrong packet ID for the current phase, or an unknown next-state.
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// Online-mode verify-token mismatch, bad RSA decrypt, or identity
    /// endpoint rejection.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// No keep-alive-serverbound arrived within the timeout window.
    #[error("keep-alive timed out")]
    KeepAliveTimeout,

    /// EOF, peer close, or a parent cancellation — torn down silently.
    #[error("connection canceled")]
    IoCanceled,

    /// A persistence load or save failed. Never terminates a connection.
    #[error("storage error: {0}")]
    StorageError(String),

    /// The world generator delegate panicked or returned an error.
    #[error("generator error: {0}")]
    GeneratorError(String),
}

impl From<std::io::Error> for ServerError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::UnexpectedEof => ServerError::IoCanceled,
            _ => ServerError::Malformed(e.to_string()),
        }
    }
}
