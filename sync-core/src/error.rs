use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("Record {record_id} is missing required fields: {}", .fields.join(", "))]
    MissingData {
        record_id: String,
        fields: Vec<&'static str>,
    },

    #[error("Discount grid resolution failed: {0}")]
    DiscountResolution(String),

    #[error("{service} request failed with status {status}: {body}")]
    ExternalService {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl AppError {
    /// Build an `ExternalService` error from a non-success response, consuming its body.
    pub async fn from_response(service: &'static str, response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        AppError::ExternalService {
            service,
            status,
            body,
        }
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::ExternalService { status, .. } => Some(*status),
            AppError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
