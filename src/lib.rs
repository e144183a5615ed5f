//! Book review service: accounts, a book catalog and reviews, served as
//! modules on the shelf HTTP stack.

pub mod modules;
pub mod utils;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::Context;
use shelf_authz::TokenKeys;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use sqlx::PgPool;

use modules::auth::store::PgUserStore;
use modules::books::store::PgBookStore;
use modules::reviews::store::PgReviewStore;

pub use modules::{register_all, AppContext};

impl AppContext {
    /// Postgres-backed stores sharing one pool.
    pub fn postgres(pool: PgPool, settings: &Settings) -> Self {
        Self {
            users: Arc::new(PgUserStore::new(pool.clone())),
            books: Arc::new(PgBookStore::new(pool.clone())),
            reviews: Arc::new(PgReviewStore::new(pool)),
            tokens: Arc::new(TokenKeys::from_settings(&settings.auth)),
            bcrypt_cost: settings.auth.bcrypt_cost,
        }
    }
}

pub fn build_registry(ctx: &AppContext) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    register_all(&mut registry, ctx)?;
    Ok(registry)
}

/// Apply pending migrations of every module and return how many ran.
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let pool = shelf_db::connect(&settings.database).await?;
    let registry = build_registry(&AppContext::postgres(pool.clone(), settings))?;

    let applied = shelf_db::migrate::run(&pool, &registry.collect_migrations()).await?;
    pool.close().await;
    Ok(applied)
}

/// Connect, migrate, and serve until a shutdown signal arrives.
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let pool = shelf_db::connect(&settings.database).await?;
    let registry = build_registry(&AppContext::postgres(pool.clone(), settings))?;

    let applied = shelf_db::migrate::run(&pool, &registry.collect_migrations())
        .await
        .context("failed to apply migrations")?;
    tracing::info!(applied, "migrations up to date");

    registry.init_all(&InitCtx { settings }).await?;

    let served = shelf_http::start_server(&registry, settings).await;

    registry.stop_all().await?;
    pool.close().await;
    served
}
