//! Input acquisition errors
//!
//! Markup irregularities are never errors; only obtaining the markup can fail.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HtmlError {
    /// The byte stream could not be read
    #[error("failed to read html source: {0}")]
    Io(#[from] std::io::Error),

    /// A caller-supplied charset label is not a known encoding
    #[error("unknown character encoding: {0}")]
    UnknownEncoding(String),
}

impl HtmlError {
    /// Short machine-readable reason, used for `{:error, reason}` host replies
    pub fn reason(&self) -> &'static str {
        match self {
            HtmlError::Io(_) => "io_error",
            HtmlError::UnknownEncoding(_) => "unknown_encoding",
        }
    }
}
