// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Hike Finder web server.

use hike_finder::{config::Config, db::Db, services::GoogleGateway, views::Views, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Hike Finder");

    let db = Db::connect(&config.database_url).await?;
    db.migrate().await?;
    tracing::info!("Database schema up to date");

    let gateway = GoogleGateway::new(
        config.google_api_key.clone(),
        config.weather_api_key.clone(),
        config.http_timeout,
    )?;

    let views = Views::new()?;

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        gateway: Arc::new(gateway),
        views,
    });

    let app = hike_finder::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive("hike_finder=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
