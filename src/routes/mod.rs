// Route exports
pub mod admin;
pub mod items;
pub mod properties;

use crate::core::{SearchEngine, SearchError};
use crate::models::ErrorResponse;
use actix_web::{error, http::StatusCode, web, HttpRequest, HttpResponse, ResponseError};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: SearchEngine,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(admin::configure)
            .configure(items::configure)
            .configure(properties::configure),
    );
}

impl ResponseError for SearchError {
    fn status_code(&self) -> StatusCode {
        match self {
            SearchError::UnknownFacet(_)
            | SearchError::InvalidBucketIndex { .. }
            | SearchError::NoFilterSpecified
            | SearchError::InvalidPagination { .. }
            | SearchError::EmptyPolygon
            | SearchError::Validation(_) => StatusCode::BAD_REQUEST,
            SearchError::ItemNotFound(_) | SearchError::PropertyNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            SearchError::OutOfRange { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            SearchError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::info!("Rejected request: {}", self);
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}

/// JSON error response for payload errors raised by extractors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Query error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle malformed path segments such as a non-numeric id
pub fn handle_path_error(err: error::PathError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Path error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_path".to_string(),
        message: format!("Invalid path: {}", err),
        status_code: 400,
    }
    .into()
}

/// Register the extractor error handlers on an app or scope
pub fn configure_extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(16 * 1024 * 1024)
            .error_handler(handle_json_payload_error),
    )
    .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
    .app_data(web::PathConfig::default().error_handler(handle_path_error));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::StoreError;

    #[test]
    fn test_search_error_status_codes() {
        assert_eq!(SearchError::NoFilterSpecified.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(SearchError::EmptyPolygon.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(SearchError::ItemNotFound(1).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            SearchError::OutOfRange { facet: "price".to_string(), value: -5 }.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            SearchError::StoreUnavailable(StoreError::Unavailable("down".to_string())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
