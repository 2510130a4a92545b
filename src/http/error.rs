use rouille::Response;
use serde_json::json;

use crate::library::error::LibraryError;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
    /// The request was fine but there is nothing to return
    Empty(String),
}

impl From<LibraryError> for ApiError {
    fn from(err: LibraryError) -> Self {
        log::warn!("{err}");
        match err {
            LibraryError::NotFound { .. } => ApiError::NotFound(err.to_string()),

            LibraryError::InvalidPath(_) => ApiError::BadRequest(err.to_string()),

            LibraryError::NoPlayableFile(_) => ApiError::Empty(err.to_string()),

            LibraryError::Metadata { .. } => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        log::error!("failed to serialize response: {err}");
        ApiError::Internal("internal server error".into())
    }
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::BadRequest(_) => 400,
            ApiError::Internal(_) => 500,
            ApiError::Empty(_) => 200,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Internal(msg)
            | ApiError::Empty(msg) => msg,
        }
    }

    pub fn into_response(self) -> Response {
        Response::json(&json!({
            "ok": false,
            "status": "error",
            "error": self.message(),
        }))
        .with_status_code(self.status_code())
    }
}
