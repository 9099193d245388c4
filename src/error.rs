use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to get database connection: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("Failed to create database pool: {0}")]
    CreatePool(#[from] deadpool_postgres::CreatePoolError),

    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// Failure reported by a store that is not backed by Postgres.
    #[error("Upstream error: {0}")]
    Upstream(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Internal details stay in the log, not in the response body.
        let message = match self {
            Error::NotFound(msg) | Error::BadRequest(msg) => msg.clone(),
            Error::Pool(_) | Error::CreatePool(_) => {
                "Failed to get database connection".to_string()
            }
            _ => "An error occurred while querying the database".to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let err = Error::NotFound("Tool 'missing' not found".to_string());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Tool 'missing' not found");
    }

    #[test]
    fn test_bad_request_maps_to_400() {
        let err = Error::BadRequest("Search query cannot be empty".to_string());
        assert_eq!(err.error_response().status(), 400);
    }

    #[test]
    fn test_upstream_maps_to_500() {
        let err = Error::Upstream("connection reset".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("connection reset"));
    }
}
