//! Editing and soft-deleting reviews. Creation is mounted by the books
//! module under `/books/{id}/reviews`.

pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{middleware::from_fn_with_state, routing::patch, Router};
use shelf_authz::{require_auth, TokenKeys};
use shelf_http::error::{ErrorBody, ErrorResponse};
use shelf_kernel::{Migration, Module};
use utoipa::OpenApi;

use crate::modules::CatalogState;

#[derive(OpenApi)]
#[openapi(
    paths(routes::update_review, routes::delete_review),
    components(schemas(
        models::ReviewInput,
        models::ReviewUpdated,
        models::UpdatedReview,
        models::ReviewDeleted,
        ErrorResponse,
        ErrorBody
    )),
    tags((name = "Reviews", description = "Book reviews"))
)]
struct ReviewsApi;

pub struct ReviewsModule {
    state: CatalogState,
    tokens: Arc<TokenKeys>,
}

impl ReviewsModule {
    pub fn new(state: CatalogState, tokens: Arc<TokenKeys>) -> Self {
        Self { state, tokens }
    }
}

#[async_trait]
impl Module for ReviewsModule {
    fn name(&self) -> &'static str {
        "reviews"
    }

    fn routes(&self) -> Router {
        Router::new()
            .route(
                "/{id}",
                patch(routes::update_review).delete(routes::delete_review),
            )
            .route_layer(from_fn_with_state(self.tokens.clone(), require_auth))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        serde_json::to_value(ReviewsApi::openapi()).ok()
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_create_reviews",
            up: r#"
                CREATE TABLE IF NOT EXISTS reviews (
                    id BIGSERIAL PRIMARY KEY,
                    book_id BIGINT NOT NULL REFERENCES books (id),
                    user_id BIGINT NOT NULL REFERENCES users (id),
                    rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                    comment TEXT,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                    deleted_at TIMESTAMPTZ
                );
                CREATE UNIQUE INDEX IF NOT EXISTS reviews_user_book_live_key
                    ON reviews (user_id, book_id) WHERE deleted_at IS NULL;
                CREATE INDEX IF NOT EXISTS reviews_book_id_idx ON reviews (book_id);
            "#,
        }]
    }
}

pub fn create_module(state: CatalogState, tokens: Arc<TokenKeys>) -> Arc<dyn Module> {
    Arc::new(ReviewsModule::new(state, tokens))
}
