use std::path::PathBuf;

use tdc_core::{SchemaError, TemplateError};
use thiserror::Error;

/// Anything that can go wrong talking to the service or preparing a call.
///
/// None of these are fatal: the caller shows [`ClientError::user_message`]
/// and keeps its previous query and results.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Server { status: u16, message: Option<String> },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Config(String),

    #[error("Please select a report type")]
    MissingReportType,
}

impl ClientError {
    /// The service's own message when it sent one, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Server {
                message: Some(message),
                ..
            } => message.clone(),
            Self::MissingReportType => self.to_string(),
            _ => fallback.to_string(),
        }
    }
}
