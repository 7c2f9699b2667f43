//! Roastery storefront - HTTP server entry point

use std::sync::Arc;

use anyhow::Result;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roastery_storefront::routes::admin::ensure_admin;
use roastery_storefront::services::notifications::{OrderNotifier, SmtpNotifier};
use roastery_storefront::services::payments::StripeGateway;
use roastery_storefront::{router, AppConfig, AppState, Stores};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let db = PgPoolOptions::new().max_connections(10).connect(config.database_url.expose_secret()).await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let payments = Arc::new(StripeGateway::new(&config.payments));
    let notifier: Option<Arc<dyn OrderNotifier>> = match &config.email {
        Some(email) => match SmtpNotifier::new(email, &config.payments.currency) {
            Ok(n) => Some(Arc::new(n)),
            Err(e) => {
                tracing::warn!(error = %e, "SMTP transport unavailable, order emails disabled");
                None
            }
        },
        None => {
            tracing::warn!("SMTP_HOST not set, order emails disabled");
            None
        }
    };

    let addr = config.socket_addr();
    let bootstrap = config.bootstrap_admin.clone();
    let state = AppState::new(config, Stores::postgres(db), payments, notifier);
    if let Some(admin) = bootstrap {
        ensure_admin(&state, &admin.email, &admin.password).await?;
    }

    tracing::info!("Roastery storefront listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, router(state)).await?;
    Ok(())
}
