//! Inserts the sample courses into Postgres when the table is empty.

use std::env;

use anyhow::Context as _;
use chrono::Utc;
use coursegen::repository::{postgres, seed, PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let store = PgStore::new(postgres::connect(&url, 1).await?);
    store.migrate().await.context("run migrations")?;

    let existing = store.course_count().await?;
    if existing > 0 {
        tracing::info!(existing, "database already contains courses");
        return Ok(());
    }

    for (course, created_at) in seed::sample_courses_with_dates(Utc::now()) {
        let stored = store.insert_course_at(course, created_at).await?;
        tracing::info!(id = stored.id, title = %stored.title, "seeded course");
    }
    Ok(())
}
