//! Apply-once migration runner.
//!
//! Applied migrations are recorded by id in `schema_migrations`; each pending
//! script runs in its own transaction together with its bookkeeping insert.

use std::collections::HashSet;

use anyhow::Context;
use shelf_kernel::Migration;
use sqlx::PgPool;

const TRACKING_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS schema_migrations (
        id         TEXT PRIMARY KEY,
        applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
"#;

/// Apply every migration not yet recorded. Returns how many were applied.
pub async fn run(pool: &PgPool, migrations: &[(String, Migration)]) -> anyhow::Result<usize> {
    sqlx::raw_sql(TRACKING_TABLE)
        .execute(pool)
        .await
        .with_context(|| "failed to create schema_migrations")?;

    let applied: HashSet<String> = sqlx::query_scalar::<_, String>("SELECT id FROM schema_migrations")
        .fetch_all(pool)
        .await
        .with_context(|| "failed to read schema_migrations")?
        .into_iter()
        .collect();

    let pending = pending(migrations, &applied);
    tracing::info!(
        target: "shelf-db",
        total = migrations.len(),
        pending = pending.len(),
        "running migrations"
    );

    for (id, migration) in &pending {
        let mut tx = pool.begin().await?;

        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration '{id}' failed"))?;
        sqlx::query("INSERT INTO schema_migrations (id) VALUES ($1)")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to record migration '{id}'"))?;

        tx.commit().await?;
        tracing::info!(target: "shelf-db", migration = %id, "applied migration");
    }

    Ok(pending.len())
}

/// Migrations from `migrations` whose id is not in `applied`, in order.
pub fn pending<'a>(
    migrations: &'a [(String, Migration)],
    applied: &HashSet<String>,
) -> Vec<&'a (String, Migration)> {
    migrations
        .iter()
        .filter(|(id, _)| !applied.contains(id))
        .collect()
}
