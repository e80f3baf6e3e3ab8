use migration::{Migrator, MigratorTrait};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "gruzzolo={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    tracing::info!("opening database {}", settings.server.database);
    let db = sea_orm::Database::connect(settings.server.database_url()).await?;
    Migrator::up(&db, None).await?;

    let engine = engine::Engine::builder().database(db).build().await?;

    let bind = settings
        .server
        .bind
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    server::run_with_listener(engine, listener).await?;

    Ok(())
}
