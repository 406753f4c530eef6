use crate::models::{
    AuthorNameEmptyError, CreateAuthorError, IsbnError, StoreError, UpdateAuthorError,
    UpdateBookError, UpsertBookError,
};
use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

#[derive(Debug)]
pub struct ApiSuccess<T: Serialize>(StatusCode, Json<ApiResponse<T>>);

impl<T: Serialize> ApiSuccess<T> {
    pub const fn new(status: StatusCode, data: T) -> Self {
        Self(status, Json(ApiResponse::new(status, data)))
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> axum::response::Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    status_code: u16,
    data: T,
}

impl<T: Serialize> ApiResponse<T> {
    const fn new(status: StatusCode, data: T) -> Self {
        Self {
            status_code: status.as_u16(),
            data,
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    InternalServerError(String),
    BadRequest(String),
    NotFound(String),
    UnprocessableEntity(String),
}

impl ApiError {
    fn internal(cause: &anyhow::Error) -> Self {
        tracing::error!("{cause:?}");
        Self::InternalServerError("Internal server error".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, msg) = match self {
            Self::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        };
        (status, Json(ApiResponse::new(status, msg))).into_response()
    }
}

impl From<AuthorNameEmptyError> for ApiError {
    fn from(err: AuthorNameEmptyError) -> Self {
        Self::UnprocessableEntity(err.to_string())
    }
}

impl From<IsbnError> for ApiError {
    fn from(err: IsbnError) -> Self {
        Self::UnprocessableEntity(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::internal(&err.0)
    }
}

impl From<CreateAuthorError> for ApiError {
    fn from(err: CreateAuthorError) -> Self {
        match err {
            CreateAuthorError::InvalidInput { .. } => Self::BadRequest(err.to_string()),
            CreateAuthorError::Other(cause) => Self::internal(&cause),
        }
    }
}

impl From<UpdateAuthorError> for ApiError {
    fn from(err: UpdateAuthorError) -> Self {
        match err {
            UpdateAuthorError::NotFound { .. } => Self::BadRequest(err.to_string()),
            UpdateAuthorError::Other(cause) => Self::internal(&cause),
        }
    }
}

impl From<UpsertBookError> for ApiError {
    fn from(err: UpsertBookError) -> Self {
        match err {
            UpsertBookError::AuthorNotFound { .. } => Self::BadRequest(err.to_string()),
            UpsertBookError::InvalidAuthor => {
                Self::InternalServerError("Internal server error".to_string())
            }
            UpsertBookError::Other(cause) => Self::internal(&cause),
        }
    }
}

impl From<UpdateBookError> for ApiError {
    fn from(err: UpdateBookError) -> Self {
        match err {
            UpdateBookError::NotFound { .. } => Self::BadRequest(err.to_string()),
            UpdateBookError::Other(cause) => Self::internal(&cause),
        }
    }
}
