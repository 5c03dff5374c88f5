use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voyage_api::{app, AppState, AuthConfig};
use voyage_core::NotificationEmitter;
use voyage_store::app_config::{Config, StorageBackend};
use voyage_store::{DbClient, PgOfferingStore, PgReservationRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voyage_api=debug,voyage_booking=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Voyage API on port {}", config.server.port);

    let auth = AuthConfig {
        secret: config.auth.jwt_secret.clone(),
    };

    let app_state = match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; tours and bookings are lost on restart");
            AppState::in_memory(auth, &config.business_rules)
        }
        StorageBackend::Postgres => {
            let db = DbClient::new(&config.database.url, config.database.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;

            let tours = Arc::new(PgOfferingStore::new(db.pool.clone()));
            let bookings = Arc::new(PgReservationRepository::new(db.pool.clone()));

            AppState::new(
                tours.clone(),
                tours,
                bookings,
                notifier(&config)?,
                auth,
                &config.business_rules,
            )
        }
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(feature = "kafka")]
fn notifier(config: &Config) -> anyhow::Result<Arc<dyn NotificationEmitter>> {
    let producer = voyage_store::EventProducer::new(&config.kafka.brokers, &config.kafka.topic)
        .context("Failed to create Kafka producer")?;
    Ok(Arc::new(producer))
}

#[cfg(not(feature = "kafka"))]
fn notifier(_config: &Config) -> anyhow::Result<Arc<dyn NotificationEmitter>> {
    tracing::info!("Built without Kafka; booking notifications go to the log");
    Ok(Arc::new(voyage_core::LogNotifier))
}
