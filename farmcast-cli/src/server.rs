use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Query, RawQuery, State, rejection::QueryRejection},
    http::StatusCode,
    routing::get,
};
use farmcast_core::{CurrentQuery, Envelope, GoogleQuery, Reply, WeatherError, WeatherService};

type AppState = Arc<WeatherService>;

pub fn router(service: WeatherService) -> Router {
    Router::new()
        .route("/weather/current", get(current))
        .route("/weather", get(current_google))
        .with_state(Arc::new(service))
}

pub async fn serve(bind: SocketAddr, service: WeatherService) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;

    tracing::info!(%bind, "listening");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

async fn current(
    State(service): State<AppState>,
    RawQuery(raw): RawQuery,
    query: Result<Query<CurrentQuery>, QueryRejection>,
) -> (StatusCode, Json<Envelope>) {
    match query {
        Ok(Query(q)) => respond(service.current(&q).await),
        Err(rejection) => respond(Reply::from_error(undecodable(raw, &rejection))),
    }
}

async fn current_google(
    State(service): State<AppState>,
    RawQuery(raw): RawQuery,
    query: Result<Query<GoogleQuery>, QueryRejection>,
) -> (StatusCode, Json<Envelope>) {
    match query {
        Ok(Query(q)) => respond(service.current_google(&q).await),
        Err(rejection) => respond(Reply::from_error(undecodable(raw, &rejection))),
    }
}

/// A query string serde cannot decode, e.g. a repeated parameter.
fn undecodable(raw: Option<String>, rejection: &QueryRejection) -> WeatherError {
    WeatherError::InvalidParameter {
        name: "query",
        value: raw.unwrap_or_default(),
        reason: rejection.body_text(),
    }
}

fn respond(reply: Reply) -> (StatusCode, Json<Envelope>) {
    (reply.status, Json(reply.envelope))
}
