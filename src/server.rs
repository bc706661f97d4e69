use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use crate::api::{create_router, AppState};
use crate::config::ServerConfig;
use crate::error::{IrisError, Result};
use crate::model::ModelHandle;

/// Start the API server and run until Ctrl+C or SIGTERM.
pub async fn start_api_server(server: &ServerConfig, model: ModelHandle) -> Result<()> {
    let listener = TcpListener::bind(server.bind_addr()).await?;
    serve(listener, model).await
}

/// Serve on an already-bound listener.
pub async fn serve(listener: TcpListener, model: ModelHandle) -> Result<()> {
    if !model.is_available() {
        info!(status = model.status().as_str(), "serving without a model");
    }

    let app = create_router(AppState::new(model));

    let addr = listener.local_addr()?;
    info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| IrisError::Internal(format!("API server error: {}", e)))?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
    info!("Shutdown signal received");
}
