//! Book catalog: create, list, fetch with reviews, search.

pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use shelf_authz::{require_auth, TokenKeys};
use shelf_http::error::{ErrorBody, ErrorResponse};
use shelf_kernel::{InitCtx, Migration, Module};
use utoipa::OpenApi;

use crate::modules::{reviews, CatalogState};

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::create_book,
        routes::list_books,
        routes::search_books,
        routes::get_book,
        reviews::routes::create_review
    ),
    components(schemas(
        models::Book,
        models::CreateBook,
        models::BookCreated,
        models::BookList,
        models::Pagination,
        models::BookWithStats,
        models::BookDetail,
        models::SearchResults,
        reviews::models::ReviewWithAuthor,
        reviews::models::ReviewInput,
        reviews::models::ReviewCreated,
        reviews::models::CreatedReview,
        ErrorResponse,
        ErrorBody
    )),
    tags((name = "Books", description = "Book catalog"))
)]
struct BooksApi;

pub struct BooksModule {
    state: CatalogState,
    tokens: Arc<TokenKeys>,
}

impl BooksModule {
    pub fn new(state: CatalogState, tokens: Arc<TokenKeys>) -> Self {
        Self { state, tokens }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        let public = Router::new()
            .route("/", get(routes::list_books))
            .route("/search", get(routes::search_books))
            .route("/{id}", get(routes::get_book));

        let protected = Router::new()
            .route("/", post(routes::create_book))
            .route("/{id}/reviews", post(reviews::routes::create_review))
            .route_layer(from_fn_with_state(self.tokens.clone(), require_auth));

        public.merge(protected).with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        serde_json::to_value(BooksApi::openapi()).ok()
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_create_books",
            up: r#"
                CREATE TABLE IF NOT EXISTS books (
                    id BIGSERIAL PRIMARY KEY,
                    title VARCHAR(255) NOT NULL,
                    author VARCHAR(255) NOT NULL,
                    genre VARCHAR(100),
                    description TEXT NOT NULL,
                    published_year INTEGER NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                    CONSTRAINT books_title_author_key UNIQUE (title, author)
                );
                CREATE INDEX IF NOT EXISTS books_created_at_idx ON books (created_at DESC);
            "#,
        }]
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

pub fn create_module(state: CatalogState, tokens: Arc<TokenKeys>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(state, tokens))
}
