use crate::http::AppState;
use crate::http::response::{ApiError, ApiSuccess};
use crate::models::{Author, AuthorName, AuthorNameEmptyError, AuthorUpdateRequest};
use crate::store::Store;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Body of author create and full update. A client supplied `id` is rejected on create
/// and ignored on update.
#[derive(Debug, Deserialize)]
pub struct AuthorHttpRequest {
    id: Option<i64>,
    name: String,
    age: i32,
    description: String,
    image: String,
}

impl TryFrom<AuthorHttpRequest> for Author {
    type Error = AuthorNameEmptyError;

    fn try_from(value: AuthorHttpRequest) -> Result<Self, Self::Error> {
        let name = AuthorName::new(&value.name)?;
        Ok(Self::new(
            value.id,
            name,
            value.age,
            value.description,
            value.image,
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthorUpdateHttpRequest {
    name: Option<String>,
    age: Option<i32>,
    description: Option<String>,
    image: Option<String>,
}

impl TryFrom<AuthorUpdateHttpRequest> for AuthorUpdateRequest {
    type Error = AuthorNameEmptyError;

    fn try_from(value: AuthorUpdateHttpRequest) -> Result<Self, Self::Error> {
        let mut req = Self::new();
        if let Some(name) = value.name {
            req.set_name(AuthorName::new(&name)?);
        }
        if let Some(age) = value.age {
            req.set_age(age);
        }
        if let Some(description) = value.description {
            req.set_description(description);
        }
        if let Some(image) = value.image {
            req.set_image(image);
        }
        Ok(req)
    }
}

#[derive(Debug, Serialize)]
pub struct AuthorHttpResponse {
    id: Option<i64>,
    name: String,
    age: i32,
    description: String,
    image: String,
}

impl From<Author> for AuthorHttpResponse {
    fn from(value: Author) -> Self {
        Self {
            id: value.id(),
            name: value.name().to_string(),
            age: value.age(),
            description: value.description().to_string(),
            image: value.image().to_string(),
        }
    }
}

pub async fn create_author<S: Store>(
    State(state): State<AppState<S>>,
    Json(body): Json<AuthorHttpRequest>,
) -> Result<ApiSuccess<AuthorHttpResponse>, ApiError> {
    let author = Author::try_from(body)?;
    state
        .authors
        .create(author)
        .await
        .map_err(ApiError::from)
        .map(|author| ApiSuccess::new(StatusCode::CREATED, author.into()))
}

pub async fn list_authors<S: Store>(
    State(state): State<AppState<S>>,
) -> Result<ApiSuccess<Vec<AuthorHttpResponse>>, ApiError> {
    let authors = state.authors.list().await?;
    let body = authors.into_iter().map(AuthorHttpResponse::from).collect();
    Ok(ApiSuccess::new(StatusCode::OK, body))
}

pub async fn get_author<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
) -> Result<ApiSuccess<AuthorHttpResponse>, ApiError> {
    state
        .authors
        .get(id)
        .await?
        .map(|author| ApiSuccess::new(StatusCode::OK, author.into()))
        .ok_or_else(|| ApiError::NotFound(format!("Author with id \"{id}\" does not exist")))
}

pub async fn full_update_author<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
    Json(body): Json<AuthorHttpRequest>,
) -> Result<ApiSuccess<AuthorHttpResponse>, ApiError> {
    let author = Author::try_from(body)?;
    state
        .authors
        .full_update(id, author)
        .await
        .map_err(ApiError::from)
        .map(|author| ApiSuccess::new(StatusCode::OK, author.into()))
}

pub async fn partial_update_author<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
    Json(body): Json<AuthorUpdateHttpRequest>,
) -> Result<ApiSuccess<AuthorHttpResponse>, ApiError> {
    let req = AuthorUpdateRequest::try_from(body)?;
    state
        .authors
        .partial_update(id, &req)
        .await
        .map_err(ApiError::from)
        .map(|author| ApiSuccess::new(StatusCode::OK, author.into()))
}

pub async fn delete_author<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.authors.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
