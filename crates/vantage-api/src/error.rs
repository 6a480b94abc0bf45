use reqwest::StatusCode;

/// Upstream bodies are cut to this many characters when displayed.
const BODY_PREVIEW: usize = 200;

/// Every failure the library crates can raise.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // registry & url
    #[error("Unknown {kind}: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("Missing required parameters: {0:?}")]
    MissingParameter(Vec<String>),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    // upstream
    #[error("Upstream responded {status}: {}", preview(.body))]
    Upstream { status: StatusCode, body: String },

    // aggregation
    #[error("Malformed record at index {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    // conversions
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn provider(name: &str) -> Self {
        Error::NotFound {
            kind: "provider",
            name: name.to_string(),
        }
    }

    pub(crate) fn function(provider: &str, name: &str) -> Self {
        Error::NotFound {
            kind: "function",
            name: format!("{name} for provider {provider}"),
        }
    }

    pub(crate) fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Error::MalformedRecord {
            index,
            reason: reason.into(),
        }
    }

    /// The HTTP status attached to the error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Upstream { status, .. } => Some(*status),
            Error::Http(e) => e.status(),
            _ => None,
        }
    }
}

fn preview(body: &str) -> String {
    match body.char_indices().nth(BODY_PREVIEW) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
