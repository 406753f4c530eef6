mod authors;
mod books;
mod response;

pub use response::{ApiError, ApiResponse, ApiSuccess};

use crate::service::{AuthorService, BookService};
use crate::store::Store;
use anyhow::Context;
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone)]
pub struct AppState<S> {
    authors: AuthorService<S>,
    books: BookService<S>,
}

impl<S: Store> AppState<S> {
    pub fn new(store: S) -> Self {
        Self {
            authors: AuthorService::new(store.clone()),
            books: BookService::new(store),
        }
    }
}

#[derive(Debug)]
pub struct HttpServerConfig {
    port: u16,
}

impl HttpServerConfig {
    pub const fn new(port: u16) -> Self {
        Self { port }
    }
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new<S: Store>(
        state: AppState<S>,
        config: HttpServerConfig,
    ) -> anyhow::Result<Self> {
        let router = router(state);

        let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port))
            .await
            .with_context(|| format!("Failed to bind to port {}", config.port))?;

        Ok(Self { router, listener })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!(addr = ?self.listener.local_addr().ok(), "listening");
        axum::serve(self.listener, self.router)
            .await
            .context("Received error from running server")?;
        Ok(())
    }
}

pub fn router<S: Store>(state: AppState<S>) -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/authors",
            get(authors::list_authors::<S>).post(authors::create_author::<S>),
        )
        .route(
            "/authors/{id}",
            get(authors::get_author::<S>)
                .put(authors::full_update_author::<S>)
                .patch(authors::partial_update_author::<S>)
                .delete(authors::delete_author::<S>),
        )
        .route("/books", get(books::list_books::<S>))
        .route(
            "/books/{isbn}",
            get(books::get_book::<S>)
                .put(books::create_or_update_book::<S>)
                .patch(books::partial_update_book::<S>)
                .delete(books::delete_book::<S>),
        )
}
