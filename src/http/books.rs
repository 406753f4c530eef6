use crate::http::AppState;
use crate::http::response::{ApiError, ApiSuccess};
use crate::models::{Book, BookSummary, BookUpdateRequest, Isbn};
use crate::store::Store;
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Owner reference inside a book body. Only the id is read; any other author
/// fields, such as the name and image of a book response, are ignored.
#[derive(Debug, Deserialize)]
pub struct AuthorSummaryHttpRequest {
    id: i64,
}

#[derive(Debug, Deserialize)]
pub struct BookHttpRequest {
    title: String,
    description: String,
    image: String,
    author: AuthorSummaryHttpRequest,
}

impl From<BookHttpRequest> for BookSummary {
    fn from(value: BookHttpRequest) -> Self {
        Self::new(value.title, value.description, value.image, value.author.id)
    }
}

#[derive(Debug, Deserialize)]
pub struct BookUpdateHttpRequest {
    title: Option<String>,
    description: Option<String>,
    image: Option<String>,
}

impl From<BookUpdateHttpRequest> for BookUpdateRequest {
    fn from(value: BookUpdateHttpRequest) -> Self {
        let mut req = Self::new();
        if let Some(title) = value.title {
            req.set_title(title);
        }
        if let Some(description) = value.description {
            req.set_description(description);
        }
        if let Some(image) = value.image {
            req.set_image(image);
        }
        req
    }
}

#[derive(Debug, Deserialize)]
pub struct ListBooksQuery {
    author: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AuthorSummaryHttpResponse {
    id: i64,
    name: String,
    image: String,
}

#[derive(Debug, Serialize)]
pub struct BookHttpResponse {
    isbn: String,
    title: String,
    description: String,
    image: String,
    author: AuthorSummaryHttpResponse,
}

impl TryFrom<Book> for BookHttpResponse {
    type Error = ApiError;

    fn try_from(value: Book) -> Result<Self, Self::Error> {
        let author = value.author();
        let Some(id) = author.id() else {
            tracing::error!(isbn = %value.isbn(), "book author has no id");
            return Err(ApiError::InternalServerError(
                "Internal server error".to_string(),
            ));
        };

        Ok(Self {
            author: AuthorSummaryHttpResponse {
                id,
                name: author.name().to_string(),
                image: author.image().to_string(),
            },
            isbn: value.isbn().to_string(),
            title: value.title().to_string(),
            description: value.description().to_string(),
            image: value.image().to_string(),
        })
    }
}

pub async fn create_or_update_book<S: Store>(
    State(state): State<AppState<S>>,
    Path(isbn): Path<String>,
    Json(body): Json<BookHttpRequest>,
) -> Result<ApiSuccess<BookHttpResponse>, ApiError> {
    let isbn = Isbn::new(&isbn)?;
    let saved = state.books.create_or_update(isbn, body.into()).await?;
    let status = if saved.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok(ApiSuccess::new(status, BookHttpResponse::try_from(saved.book)?))
}

pub async fn list_books<S: Store>(
    State(state): State<AppState<S>>,
    Query(query): Query<ListBooksQuery>,
) -> Result<ApiSuccess<Vec<BookHttpResponse>>, ApiError> {
    let books = state.books.list(query.author).await?;
    let body = books
        .into_iter()
        .map(BookHttpResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ApiSuccess::new(StatusCode::OK, body))
}

pub async fn get_book<S: Store>(
    State(state): State<AppState<S>>,
    Path(isbn): Path<String>,
) -> Result<ApiSuccess<BookHttpResponse>, ApiError> {
    let isbn = Isbn::new_unchecked(&isbn);
    let book = state.books.get(&isbn).await?.ok_or_else(|| {
        ApiError::NotFound(format!("Book with isbn \"{isbn}\" does not exist"))
    })?;
    Ok(ApiSuccess::new(StatusCode::OK, BookHttpResponse::try_from(book)?))
}

pub async fn partial_update_book<S: Store>(
    State(state): State<AppState<S>>,
    Path(isbn): Path<String>,
    Json(body): Json<BookUpdateHttpRequest>,
) -> Result<ApiSuccess<BookHttpResponse>, ApiError> {
    let isbn = Isbn::new_unchecked(&isbn);
    let book = state.books.partial_update(&isbn, &body.into()).await?;
    Ok(ApiSuccess::new(StatusCode::OK, BookHttpResponse::try_from(book)?))
}

pub async fn delete_book<S: Store>(
    State(state): State<AppState<S>>,
    Path(isbn): Path<String>,
) -> Result<StatusCode, ApiError> {
    let isbn = Isbn::new_unchecked(&isbn);
    state.books.delete(&isbn).await?;
    Ok(StatusCode::NO_CONTENT)
}
