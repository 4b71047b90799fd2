//! Natjecanja - Application Entry Point

use std::{net::SocketAddr, sync::Arc};

use redis::Client as RedisClient;
use tokio::{net::TcpListener, sync::broadcast::error::RecvError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use natjecanja::{
    config::{StorageBackend, CONFIG},
    db::{self, Repositories},
    events::ChangeFeed,
    handlers,
    identity::{
        CredentialStore, IdentityEvent, IdentityProvider, LocalIdentityProvider,
        MemoryCredentialStore, PgCredentialStore,
    },
    seed,
    services::Backend,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| CONFIG.server.rust_log.clone().into());
    if CONFIG.server.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting Natjecanja server...");

    let (repos, credentials): (Repositories, Arc<dyn CredentialStore>) =
        match CONFIG.database.backend {
            StorageBackend::Postgres => {
                let url = CONFIG
                    .database
                    .url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for postgres"))?;

                tracing::info!("Connecting to database...");
                let pool = db::create_pool(&CONFIG.database, url).await?;
                db::test_connection(&pool).await?;

                tracing::info!("Running database migrations...");
                db::run_migrations(&pool).await?;

                (
                    Repositories::postgres(pool.clone()),
                    Arc::new(PgCredentialStore::new(pool)) as Arc<dyn CredentialStore>,
                )
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage, data is lost on restart");
                (
                    Repositories::memory(),
                    Arc::new(MemoryCredentialStore::default()) as Arc<dyn CredentialStore>,
                )
            }
        };

    let identity: Arc<dyn IdentityProvider> =
        Arc::new(LocalIdentityProvider::new(credentials, CONFIG.jwt.clone()));
    spawn_identity_audit(identity.as_ref());

    let backend = Backend::new(repos, identity, ChangeFeed::new());

    if let Some(admin) = &CONFIG.portal.bootstrap_admin {
        seed::bootstrap_admin(&backend, admin).await?;
    }

    // Redis only backs rate limiting
    let redis = match &CONFIG.redis.url {
        Some(url) => {
            tracing::info!("Connecting to Redis...");
            let client = RedisClient::open(url.as_str())?;
            Some(redis::aio::ConnectionManager::new(client).await?)
        }
        None => {
            tracing::warn!("REDIS_URL not set, rate limiting disabled");
            None
        }
    };

    let state = AppState::new(backend, redis, CONFIG.clone());
    let app = handlers::app(state);

    // Start the server
    let addr = SocketAddr::new(CONFIG.server.host.parse()?, CONFIG.server.port);
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Log sign-ins, sign-outs and new credentials
fn spawn_identity_audit(identity: &dyn IdentityProvider) {
    let mut events = identity.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(IdentityEvent::SignedIn { uid, email }) => {
                    tracing::info!(%uid, %email, "Signed in");
                }
                Ok(IdentityEvent::SignedOut { uid }) => {
                    tracing::info!(%uid, "Signed out");
                }
                Ok(IdentityEvent::CredentialCreated { uid, email }) => {
                    tracing::info!(%uid, %email, "Credential created");
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Identity audit log lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}
