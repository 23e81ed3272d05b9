//! Error taxonomy for app lookups.

use crate::renderer::BrowserError;

/// Every way a lookup can fail.
///
/// The display text is what HTTP callers see, so it stays short and free of
/// internal identifiers.
#[derive(thiserror::Error, Debug)]
pub enum KatsiniError {
    /// A required identifier was missing; raised before any network work.
    #[error("{0}")]
    InvalidInput(String),

    #[error("app not found")]
    AppNotFound,

    /// The call deadline expired while the browser was working.
    #[error("failed to load page: timeout while extracting data")]
    PageLoadTimeout,

    /// A selector or path never resolved, usually an upstream layout change.
    #[error("failed to extract app data: {0}")]
    ExtractionFailed(#[source] BrowserError),

    /// A field was read but came back empty.
    #[error("failed to extract app data: {0} is empty")]
    MissingField(&'static str),

    #[error("failed to parse date {input:?} as {format}")]
    DateParse { input: String, format: &'static str },

    #[error("failed to start browser session: {0}")]
    SessionCreationFailed(#[source] BrowserError),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The API answered with a non-success status or an embedded error code.
    #[error("upstream error {code}: {message}")]
    Upstream { code: i64, message: String },

    #[error("failed to get app: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl KatsiniError {
    /// Stable machine-readable name of the category.
    pub fn kind(&self) -> &'static str {
        match self {
            KatsiniError::InvalidInput(_) => "invalid_input",
            KatsiniError::AppNotFound => "app_not_found",
            KatsiniError::PageLoadTimeout => "page_load_timeout",
            KatsiniError::ExtractionFailed(_) | KatsiniError::MissingField(_) => {
                "extraction_failed"
            }
            KatsiniError::DateParse { .. } => "date_parse_error",
            KatsiniError::SessionCreationFailed(_) => "session_creation_failed",
            KatsiniError::AuthFailed(_) => "auth_failed",
            KatsiniError::Upstream { .. } | KatsiniError::Http(_) | KatsiniError::Decode(_) => {
                "upstream_error"
            }
        }
    }

    /// True when the caller asked for something that does not exist or
    /// forgot an identifier.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            KatsiniError::InvalidInput(_) | KatsiniError::AppNotFound
        )
    }
}

pub type KatsiniResult<T> = Result<T, KatsiniError>;
