//! HTTP front end.
//!
//! Serves the next connection as restricted JSON (`/arduino.json`), full
//! JSON (`/all.json`) and a small HTML page (every other path).

mod routes;
mod state;

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::transport::ConnectionSource;

pub use routes::{AppError, create_router};
pub use state::{AppState, Clock};

/// Serve requests on `listener` until the process is stopped.
pub async fn serve<S>(listener: TcpListener, state: AppState<S>) -> std::io::Result<()>
where
    S: ConnectionSource + Send + Sync + 'static,
{
    let app = create_router(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}
