use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cb_core::TemplateError;
use tracing::{event, Level};

#[derive(Debug)]
pub struct ApiError(pub TemplateError);

impl From<TemplateError> for ApiError {
    fn from(err: TemplateError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            TemplateError::MissingArgument(_)
            | TemplateError::Request(_)
            | TemplateError::InvalidArguments(_)
            | TemplateError::NoChartsSelected => StatusCode::BAD_REQUEST,
            TemplateError::Forbidden => StatusCode::FORBIDDEN,
            TemplateError::UnknownProvider(_) => StatusCode::NOT_FOUND,
            TemplateError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self.0 {
            TemplateError::Store(err) => {
                event!(Level::ERROR, "Store error: {:?}", err);
                (status, "Internal server error".to_string()).into_response()
            }
            other => (status, other.to_string()).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError(TemplateError::MissingArgument("website")).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError(TemplateError::Request("401 - Unauthorized".to_string())).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError(TemplateError::Forbidden).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError(TemplateError::UnknownProvider("x".to_string())).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError(TemplateError::Store(anyhow::anyhow!("pool timed out"))).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
