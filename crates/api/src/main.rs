use anyhow::Context;

use contacts_api::{app, config::ApiConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    contacts_observability::init();

    let config = ApiConfig::from_env()?;
    let store = app::services::build_store(&config.store);

    let router = app::build_app(config.jwt_secret.clone(), store)
        .await
        .context("failed to register contacts database")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router).await?;
    Ok(())
}
