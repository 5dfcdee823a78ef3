use thiserror::Error;

/// Top-level error type for build-time (fatal) failures.
///
/// Query-time lookup failures (unknown stop/bus/distance, unreachable route) are
/// represented as `Option`/`Result` at the API boundary and turned into the
/// `{request_id, error_message: "not found"}` response shape by the CLI layer —
/// they never reach this enum.
#[derive(Error, Debug)]
pub enum Error {
    #[error("usage: {0}")]
    Usage(String),

    #[error("failed to decode request document: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unknown stop: {0}")]
    UnknownStop(String),

    #[error("unknown bus: {0}")]
    UnknownBus(String),

    #[error("unknown distance from {0} to {1}")]
    UnknownDistance(String, String),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    #[error("archive internally inconsistent: {0}")]
    ArchiveInconsistent(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Bincode(#[from] bincode::Error),
}
