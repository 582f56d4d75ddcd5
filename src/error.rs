use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubtransError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Subtitle format error: {0}")]
    Subtitle(String),
}

/// Failure of a single translation request.
///
/// These never abort a batch or a job: the item keeps its source text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    #[error("endpoint unreachable: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("response has no choices[0].message.content")]
    MissingContent,

    #[error("translation is empty after clean-up")]
    EmptyTranslation,
}

impl From<reqwest::Error> for InferenceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            InferenceError::Timeout
        } else if e.is_decode() {
            InferenceError::MalformedResponse(e.to_string())
        } else {
            InferenceError::Network(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, SubtransError>;
