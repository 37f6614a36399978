use std::sync::Arc;

use promptgate_api::{build_router, AppConfig, AppState};
use promptgate_core::{GeminiClient, ModelConfig, PromptService};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded environment file");
    }

    let model_config = ModelConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "invalid model configuration");
        std::process::exit(1);
    });
    let app_config = AppConfig::from_env();

    let client = GeminiClient::new(&model_config).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to create model client");
        std::process::exit(1);
    });
    tracing::info!(
        model = client.model(),
        temperature = model_config.temperature,
        "Gemini model initialized"
    );

    let service = PromptService::new(Arc::new(client)).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to load prompt templates");
        std::process::exit(1);
    });

    let app = build_router(AppState::new(service));

    let (host, port) = app_config.bind_addr();
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to bind on {host}:{port}");
            std::process::exit(1);
        });
    match listener.local_addr() {
        Ok(addr) => tracing::info!("listening on {addr}"),
        Err(_) => tracing::info!("listening on {host}:{port}"),
    }

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
