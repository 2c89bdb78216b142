use ask_me_anything::{
    build_router,
    message::{InMemoryMessageRepository, MessageRepository, PostgresMessageRepository},
    room::{InMemoryRoomRepository, PostgresRoomRepository, RoomRepository},
    AppState, Config, Publisher, SubscriberRegistry,
};
use sqlx::postgres::PgPoolOptions;
use std::{error::Error, sync::Arc};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Repositories = (
    Arc<dyn RoomRepository + Send + Sync>,
    Arc<dyn MessageRepository + Send + Sync>,
);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ask_me_anything=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ask-me-anything server");

    let config = Config::from_env()?;
    let (room_repository, message_repository) = repositories(&config).await?;

    let registry = Arc::new(SubscriberRegistry::new());
    let app_state = AppState::new(
        room_repository,
        message_repository,
        Publisher::new(Arc::clone(&registry)),
    );
    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    info!(address = %config.bind_address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                return;
            }
            info!(
                rooms = registry.room_count(),
                "Shutdown requested, closing subscriber connections"
            );
            registry.shutdown();
        })
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn repositories(config: &Config) -> Result<Repositories, Box<dyn Error>> {
    let Some(database_url) = &config.database_url else {
        info!("DATABASE_URL not set, using in-memory storage");
        return Ok((
            Arc::new(InMemoryRoomRepository::new()),
            Arc::new(InMemoryMessageRepository::new()),
        ));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Connected to PostgreSQL and applied migrations");

    Ok((
        Arc::new(PostgresRoomRepository::new(pool.clone())),
        Arc::new(PostgresMessageRepository::new(pool)),
    ))
}
