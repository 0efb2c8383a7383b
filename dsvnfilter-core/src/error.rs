//! Error taxonomy for the dump-stream filter.
//!
//! Modeled on `dsvn-core`'s `StorageError`: one `thiserror` enum, variants
//! named after the failure site rather than grouped by severity, with
//! `#[from] std::io::Error` for the sink side.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("unexpected end of input at byte {position}")]
    Eof { position: u64 },

    #[error("truncated stream at byte {position}: {message}")]
    TruncatedBody { position: u64, message: String },

    #[error("malformed header at byte {position}: {message}")]
    MalformedHeader { position: u64, message: String },

    #[error("unexpected record at byte {position}: {message}")]
    UnexpectedRecord { position: u64, message: String },

    #[error("unsupported dump format version {version}")]
    UnsupportedFormatVersion { version: u32 },

    #[error(
        "untangle source r{src_rev}:{src_path} not found (triggered by r{triggering_rev}:{triggering_path})"
    )]
    MissingUntangleSource {
        src_rev: u64,
        src_path: String,
        triggering_rev: u64,
        triggering_path: String,
    },

    #[error("repository probe failed for r{rev}:{path}: {message}")]
    ProbeError { rev: u64, path: String, message: String },

    #[error(
        "copyfrom-rev {input_rev} was dropped by renumbering and has no output revision (referenced by {path})"
    )]
    InvalidCopyfromRev { input_rev: u64, path: String },

    #[error("invalid configuration: {0}")]
    ConfigError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FilterError>;
