use thiserror::Error;

/// Errors raised while talking to the slide server.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Network, connection or timeout failure
    #[error("Request failed: {0}")]
    Request(String),

    /// Server answered with a JSON `error` field
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Server answered with a non-2xx status and no usable error body
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response payload could not be interpreted
    #[error("Invalid response: {0}")]
    Decode(String),

    /// Endpoint URL could not be built from the configured base URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Message suitable for the status line.
    ///
    /// Prefers the server-supplied `error` field and falls back to the
    /// full error description otherwise.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Request(err.to_string())
    }
}

/// Errors surfaced by the load orchestrator.
///
/// The `*Failure` variants come from a fetch that was issued and failed.
/// The remaining variants are rejections: the call was refused before any
/// fetch was issued and no state was touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewerError {
    /// The file list could not be loaded
    #[error("Failed to load file list: {0}")]
    ListFailure(String),

    /// Slide metadata could not be loaded
    #[error("Failed to load slide info: {0}")]
    MetadataFailure(String),

    /// Thumbnail could not be fetched or decoded
    #[error("Failed to load thumbnail: {0}")]
    ThumbnailFailure(String),

    /// Region could not be fetched or decoded
    #[error("Failed to load region: {0}")]
    RegionFailure(String),

    /// Save request failed
    #[error("Failed to save: {0}")]
    SaveFailure(String),

    /// Another operation is in flight
    #[error("Another operation is in progress")]
    Busy,

    /// The operation needs a loaded file
    #[error("No file is loaded")]
    NoFileLoaded,

    /// The operation needs an actionable selection
    #[error("No selection to apply")]
    NoSelection,

    /// The selection maps to an empty level-0 rectangle
    #[error("Selection maps to an empty region")]
    EmptySelection,

    /// The view changed while the response was in flight; it was discarded
    #[error("Response discarded: the view changed while loading")]
    Superseded,
}

impl ViewerError {
    /// Whether the call was refused without issuing a fetch.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ViewerError::Busy
                | ViewerError::NoFileLoaded
                | ViewerError::NoSelection
                | ViewerError::EmptySelection
        )
    }
}
