use std::path::PathBuf;

/// Construction-time failures. Per-lookup conditions (tokenization failure, time
/// cutoff, unsupported collector combination) are never represented here; they are
/// reported as flags on the lookup result instead (see `engine::LookupResult`).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transducer file not found: {path}")]
    NotFound { path: PathBuf, #[source] source: std::io::Error },

    #[error("malformed transducer header: {reason}")]
    BadHeader { reason: String },
}

impl Error {
    pub(crate) fn bad_header<S: Into<String>>(reason: S) -> Error {
        Error::BadHeader { reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
