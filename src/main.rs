use std::{net::SocketAddr, sync::Arc};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orders_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    notify::{EmailNotifier, LogNotifier, Notifier},
    routes::build_app,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,orders_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;

    run_migrations(&pool).await?;

    let notifier: Arc<dyn Notifier> = match &config.email {
        Some(email) => {
            tracing::info!(smtp_host = %email.smtp_host, "email notifications enabled");
            Arc::new(EmailNotifier::new(email)?)
        }
        None => {
            tracing::info!("SMTP_HOST not set, notifications are only logged");
            Arc::new(LogNotifier)
        }
    };

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    let state = AppState::new(pool, config, notifier)?;
    let app = build_app(state);

    tracing::info!("listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
