//! Account signup and login.

pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{routing::post, Router};
use shelf_http::error::{ErrorBody, ErrorResponse};
use shelf_kernel::{InitCtx, Migration, Module};
use utoipa::OpenApi;

use routes::AuthState;

#[derive(OpenApi)]
#[openapi(
    paths(routes::signup, routes::login),
    components(schemas(
        models::Credentials,
        models::AuthResponse,
        models::PublicUser,
        ErrorResponse,
        ErrorBody
    )),
    tags((name = "Auth", description = "Signup and login"))
)]
struct AuthApi;

pub struct AuthModule {
    state: AuthState,
}

impl AuthModule {
    pub fn new(state: AuthState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for AuthModule {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            token_ttl_hours = ctx.settings.auth.token_ttl_hours,
            "auth module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/signup", post(routes::signup))
            .route("/login", post(routes::login))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        serde_json::to_value(AuthApi::openapi()).ok()
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_create_users",
            up: r#"
                CREATE TABLE IF NOT EXISTS users (
                    id BIGSERIAL PRIMARY KEY,
                    username TEXT NOT NULL,
                    email TEXT NOT NULL,
                    password_hash TEXT NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                    CONSTRAINT users_email_key UNIQUE (email),
                    CONSTRAINT users_username_key UNIQUE (username)
                );
            "#,
        }]
    }
}

pub fn create_module(state: AuthState) -> Arc<dyn Module> {
    Arc::new(AuthModule::new(state))
}
