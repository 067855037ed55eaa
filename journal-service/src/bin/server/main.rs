use std::sync::Arc;

use auth::Authenticator;
use auth::KeyProvider;
use auth::SigningKeys;
use auth::TokenService;
use auth::TokenSettings;
use journal_service::config::Config;
use journal_service::domain::user::service::UserService;
use journal_service::inbound::http::router::create_router;
use journal_service::outbound::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "journal_service=debug,auth=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "journal-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        environment = %config.environment,
        http_port = config.server.http_port,
        jwt_issuer = %config.jwt.issuer,
        jwt_algorithm = %config.jwt.algorithm,
        jwt_expiration_hours = config.jwt.expiration_hours,
        keys_directory = %config.keys.directory,
        "Configuration loaded"
    );

    let token_service = build_token_service(&config)?;

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let authenticator = Arc::new(Authenticator::new(
        config.password.hasher()?,
        token_service,
    ));
    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool));
    let user_service = Arc::new(UserService::new(
        user_repository,
        Arc::clone(&authenticator),
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(user_service, authenticator, config.is_production());

    axum::serve(http_listener, http_application)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server exited successfully");

    Ok(())
}

/// Provision and load the signing key pair.
///
/// Key failures are not fatal: the service starts without key material and
/// every token operation reports `KeyUnavailable` until the keys are fixed.
fn build_token_service(config: &Config) -> Result<TokenService, anyhow::Error> {
    let settings: TokenSettings = config.jwt.token_settings()?;
    let provider = KeyProvider::new(&config.keys.directory).with_bits(config.keys.bits);

    let keys = provider
        .ensure_keypair()
        .and_then(|_| provider.load())
        .and_then(|pair| SigningKeys::from_key_pair(&pair));

    match keys {
        Ok(keys) => {
            tracing::info!(algorithm = ?settings.algorithm, "Signing keys loaded");
            Ok(TokenService::new(settings, keys))
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                directory = %config.keys.directory,
                "Signing keys unavailable; token operations will fail"
            );
            Ok(TokenService::without_keys(settings))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
