#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A record's date/time fields do not form a valid UTC instant.
    #[error("invalid timestamp on line {line}: {value:?}")]
    Timestamp { line: usize, value: String },

    /// A numeric field on a qualifying record could not be parsed.
    #[error("invalid value for field {field} on line {line}: {value:?}")]
    Field {
        line: usize,
        field: usize,
        value: String,
    },

    #[error("unknown satellite: {0}")]
    UnknownSatellite(String),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[cfg(feature = "download")]
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
