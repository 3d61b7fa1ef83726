use crate::provider_client::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Missing required '{0}' argument")]
    MissingArgument(&'static str),
    /// The provider answered, but not with the data the template needs. Usually wrong credentials.
    #[error("403")]
    Forbidden,
    #[error("{0}")]
    Request(String),
    #[error("Invalid template arguments: {0}")]
    InvalidArguments(String),
    #[error("None of the selected charts are part of the template")]
    NoChartsSelected,
    #[error("Unknown template '{0}'")]
    UnknownProvider(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// A body that is not JSON is treated like one without the expected data.
impl From<ProviderError> for TemplateError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Decode { .. } => TemplateError::Forbidden,
            other => TemplateError::Request(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for TemplateError {
    fn from(err: serde_json::Error) -> Self {
        TemplateError::InvalidArguments(err.to_string())
    }
}
