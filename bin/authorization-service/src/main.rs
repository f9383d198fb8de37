use rolebridge_authorization_service::{
    AuthorizationService, InMemoryRoleAssignmentRepository, PgRoleAssignmentRepository,
    RoleAssignmentRepository, ServiceConfig, router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let repository: Arc<dyn RoleAssignmentRepository> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(url)
                .await
                .expect("failed to connect to database");

            tracing::info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("failed to run migrations");

            Arc::new(PgRoleAssignmentRepository::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; serving seeded in-memory role assignments");
            Arc::new(InMemoryRoleAssignmentRepository::seeded())
        }
    };

    let app = router(AuthorizationService::new(repository));

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
