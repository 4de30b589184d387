//! Error types for the blog store.

/// Error from store operations.
///
/// Not-found lookups are `Ok(None)`, never an error; these variants cover
/// infrastructure failures and structurally impossible result shapes.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database query or connection error.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// HTTP request failed while fetching the database image (network error,
    /// timeout, etc).
    #[error("database image fetch failed")]
    Http(#[from] ureq::Error),

    /// Remote endpoint returned an error status for the image fetch.
    #[error("database image fetch failed: HTTP {status} - {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body (may contain error details).
        body: String,
    },

    /// I/O error while materializing the database image.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// A query that structurally requires a row returned none.
    #[error("malformed result: {0}")]
    MalformedResult(&'static str),
}

/// Convenience result alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
