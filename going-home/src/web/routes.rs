//! HTTP route handlers.

use std::net::SocketAddr;

use axum::{
    Json, Router,
    extract::{ConnectInfo, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tracing::{error, info};

use crate::render::{Channel, RenderError, render};
use crate::transport::ConnectionSource;

use super::state::AppState;

/// Create the application router.
///
/// Every route answers both GET and POST; unknown paths get the HTML page.
pub fn create_router<S>(state: AppState<S>) -> Router
where
    S: ConnectionSource + Send + Sync + 'static,
{
    Router::new()
        .route("/arduino.json", get(arduino::<S>).post(arduino::<S>))
        .route("/all.json", get(all_json::<S>).post(all_json::<S>))
        .fallback(html_page::<S>)
        .with_state(state)
}

/// Restricted JSON for the embedded display.
async fn arduino<S>(
    State(state): State<AppState<S>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<Response, AppError>
where
    S: ConnectionSource + Send + Sync + 'static,
{
    respond(&state, Channel::Arduino, addr).await
}

/// The whole result, including the raw API payload.
async fn all_json<S>(
    State(state): State<AppState<S>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<Response, AppError>
where
    S: ConnectionSource + Send + Sync + 'static,
{
    respond(&state, Channel::Json, addr).await
}

async fn html_page<S>(
    State(state): State<AppState<S>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<Response, AppError>
where
    S: ConnectionSource + Send + Sync + 'static,
{
    respond(&state, Channel::Html, addr).await
}

async fn respond<S>(
    state: &AppState<S>,
    channel: Channel,
    addr: SocketAddr,
) -> Result<Response, AppError>
where
    S: ConnectionSource + Send + Sync + 'static,
{
    info!(?channel, client = %addr, "handling request");

    let result = state.run().await;
    let rendered = render(channel, &result)?;

    Ok(([(header::CONTENT_TYPE, channel.content_type())], rendered.body).into_response())
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    Internal { message: String },
}

impl From<RenderError> for AppError {
    fn from(e: RenderError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        error!(%status, %message, "request failed");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
