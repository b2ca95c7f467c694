//! # Error Types
//!
//! Errors are split by the layer that detects them:
//!
//! | Type | Raised by | When |
//! |------|-----------|------|
//! | [`EncodingError`] | protocol, render, job | before any byte reaches a port |
//! | [`PortError`] | [`crate::transport::Port`] implementations | raw port I/O |
//! | [`TransportError`] | [`crate::transport::session`] | open / write / status steps |
//! | [`PrintError`] | [`crate::print`] | the whole print lifecycle |
//! | [`Error`] | CLI and loaders | everything above plus files and JSON |

use std::time::Duration;

use thiserror::Error;

use crate::transport::session::Stage;

/// Rejections raised while turning primitives into command bytes.
///
/// Nothing is emitted when one of these is returned: every encoder validates
/// its input before writing the first byte.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// Payload length does not fit the command's length field
    #[error("{kind} payload is {len} bytes, limit is {max}")]
    PayloadTooLarge {
        kind: &'static str,
        len: usize,
        max: usize,
    },

    /// Width class outside the eight device steps
    #[error("invalid width class {0} (expected 0..=7)")]
    InvalidWidthClass(u8),

    /// Image is wider than the device even after scaling
    #[error("image is {width} dots wide, device maximum is {max}")]
    ImageTooWide { width: u32, max: u16 },

    /// Image height does not fit the raster header
    #[error("image is {height} dots tall, which the raster header cannot describe")]
    ImageTooTall { height: u32 },

    /// Image has no pixels
    #[error("image has zero width or height")]
    EmptyImage,

    /// Unknown model class name
    #[error("unsupported printer model '{0}'")]
    UnsupportedModel(String),

    /// QR correction level the model does not support
    #[error("correction level {0} is not supported by {1}")]
    UnsupportedCorrectionLevel(char, &'static str),

    /// Trailing action needs hardware the model does not have
    #[error("{action} is not supported by {model}")]
    UnsupportedAction {
        action: &'static str,
        model: &'static str,
    },

    /// Text contains characters the selected double-byte charset cannot represent
    #[error("text cannot be represented in {charset}")]
    UnmappableText { charset: &'static str },

    /// Raster header does not describe the data that follows it
    #[error("raster header describes {expected} bytes but {actual} were produced")]
    RasterSizeMismatch { expected: usize, actual: usize },
}

/// Errors reported by a [`crate::transport::Port`] implementation.
#[derive(Debug, Error)]
pub enum PortError {
    /// The operation did not finish within its timeout
    #[error("operation timed out")]
    TimedOut,

    /// The handle was already closed
    #[error("port is closed")]
    Closed,

    /// The device answered with something unexpected
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Underlying OS error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the transport session, one per lifecycle step.
///
/// Timeouts are kept apart from I/O failures so a caller can tell an
/// unreachable device from one that rejected data.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to open port {address}: {source}")]
    PortOpen {
        address: String,
        #[source]
        source: PortError,
    },

    #[error("opening port {address} timed out after {timeout:?}")]
    OpenTimeout { address: String, timeout: Duration },

    #[error("write of {len} bytes timed out after {timeout:?}")]
    WriteTimeout { timeout: Duration, len: usize },

    #[error("write failed: {source}")]
    PortWrite {
        #[source]
        source: PortError,
    },

    /// A status or identification exchange failed
    #[error("device query failed during {stage}: {source}")]
    StatusQuery {
        stage: Stage,
        #[source]
        source: PortError,
    },

    #[error("device query timed out during {stage} after {timeout:?}")]
    StatusTimeout { stage: Stage, timeout: Duration },

    /// The session is not in the `Open` state
    #[error("session is not open")]
    NotOpen,
}

impl TransportError {
    /// True for any of the timeout kinds.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::OpenTimeout { .. } | Self::WriteTimeout { .. } | Self::StatusTimeout { .. }
        )
    }
}

/// Errors surfaced by [`crate::print::print_job`] and the job composer.
#[derive(Debug, Error)]
pub enum PrintError {
    /// A primitive (or trailing action) failed to encode
    #[error("element {index} failed to encode: {source}")]
    Encoding {
        index: usize,
        #[source]
        source: EncodingError,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Pre-flight found the device unable to print; nothing was written
    #[error("device not ready (paper empty: {paper_empty}, cover open: {cover_open})")]
    DeviceNotReady {
        paper_empty: bool,
        cover_open: bool,
        status: crate::transport::DeviceStatus,
    },

    /// The caller cancelled the job at a safe point. `sent` is true when the
    /// write had already completed.
    #[error("print cancelled before {stage}; job sent: {sent}")]
    Cancelled { stage: Stage, sent: bool },
}

impl PrintError {
    /// True when the job bytes reached the device before the error.
    pub fn job_sent(&self) -> bool {
        match self {
            Self::Cancelled { sent, .. } => *sent,
            Self::Transport(
                TransportError::StatusQuery { stage, .. }
                | TransportError::StatusTimeout { stage, .. },
            ) => *stage == Stage::FinalStatus,
            _ => false,
        }
    }
}

/// Crate-level error used by the CLI and file loaders.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Print(#[from] PrintError),

    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Invalid job document: {0}")]
    Job(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
