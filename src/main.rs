use foodgram::{
    api::{routes, Context},
    config::Config,
};
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| {
        log::error!("Invalid configuration: {e}");
        e
    })?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!().run(&pool).await?;
    log::info!("Database migrations applied");

    let address = config.bind_address;
    let context = Context::new(pool, config);

    log::info!("Listening on {address}");
    warp::serve(routes(context)).run(address).await;

    Ok(())
}
