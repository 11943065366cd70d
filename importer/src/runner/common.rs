use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to fetch the index: {0}")]
    Index(#[source] FetchError),
    #[error("{0} cannot be used as a base URL")]
    BaseUrl(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("operation canceled")]
    Canceled,
}

/// The failure of a single request
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("unexpected status: {0}")]
    Status(StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("failed to decode the response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response is missing the '{0}' field")]
    MissingField(&'static str),
}

impl FetchError {
    /// The status code returned by the server, if it answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status(status) => Some(*status),
            Self::Http(err) => err.status(),
            Self::Decode(_) | Self::MissingField(_) => None,
        }
    }

    /// Check if the request went through, but the content wasn't usable.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::MissingField(_))
    }
}
