use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    /// 制御端末 (/dev/tty) が開けない
    #[error("no controlling terminal available: {0}")]
    TerminalUnavailable(#[source] io::Error),

    #[error("failed to configure terminal ({call}): {source}")]
    TerminalConfig {
        call: &'static str,
        #[source]
        source: nix::Error,
    },

    #[error("failed to read from terminal: {0}")]
    TerminalRead(#[source] io::Error),

    #[error("{0}: binary input is not supported")]
    BinaryInput(String),

    #[error("failed to read {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {target}: {source}")]
    Save {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Usage(String),
}

pub type Result<T> = std::result::Result<T, EditorError>;
