use thiserror::Error;

/// Messages name paths relative to the library root; they end up in client responses.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("cannot list {path:?}: {source}")]
    NotFound {
        path: String,
        source: std::io::Error,
    },

    #[error("cannot read metadata of {path:?}")]
    Metadata {
        path: String,
        source: anyhow::Error,
    },

    #[error("invalid library path {0:?}")]
    InvalidPath(String),

    #[error("no playable file or cover image in {0:?}")]
    NoPlayableFile(String),
}
