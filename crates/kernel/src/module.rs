use async_trait::async_trait;
use axum::Router;

/// Handed to every module once migrations have run.
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
}

/// Schema migration contributed by a module.
///
/// `id` must be unique within the module; the runner records applied
/// migrations as `{module}/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// A feature slice of the service: routes, schema and API docs.
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name, also the prefix its routes are nested under.
    fn name(&self) -> &'static str;

    /// Startup hook, run in registration order after migrations.
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Routes relative to `/{name}`.
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI fragment with paths relative to `/{name}`.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Ordered schema changes owned by this module.
    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    /// Shutdown hook, run in reverse registration order.
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
