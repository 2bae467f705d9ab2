use thiserror::Error;

/// Every way a submission can fail. All of them are shown to the user as a
/// plain message and leave the session ready for the next query.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Empty or whitespace-only query; no request was made.
    #[error("{0}")]
    Validation(String),

    /// The service answered with a non-success status.
    #[error("{0}")]
    Service(String),

    /// The request never produced a usable response.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Another submission on the same client has not finished yet.
    #[error("A research query is already in progress")]
    InFlight,
}

