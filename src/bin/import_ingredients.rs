//! Loads ingredients from a `name,measurement_unit` CSV file.
//!
//! Usage: `import-ingredients [path]` (defaults to `data/ingredients.csv`).
//! Pairs that already exist are skipped.

use foodgram::{
    actions::{import_ingredients, parse_ingredient_csv},
    config::Config,
};
use sqlx::postgres::PgPoolOptions;

const DEFAULT_PATH: &str = "data/ingredients.csv";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_PATH.to_owned());
    let config = Config::from_env()?;

    let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
        log::error!("Could not read {path}: {e}");
        e
    })?;
    let ingredients = parse_ingredient_csv(&content)?;
    log::info!("Read {} ingredients from {path}", ingredients.len());

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!().run(&pool).await?;

    let inserted = import_ingredients(&ingredients, &pool).await?;
    log::info!(
        "Added {inserted} ingredients, {} already existed",
        (ingredients.len() as u64).saturating_sub(inserted)
    );

    Ok(())
}
