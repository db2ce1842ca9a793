use std::env;
use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::{TcpListener, UnixListener};
use tracing::{info, warn};

use rpp_generator::config::Config;
use rpp_generator::logger::init_logging;
use rpp_generator::web::{router, AppState};
use rpp_generator::GeminiClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let config = Config::from_env();
    if config.api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; generation requests will fail");
    }
    let generator = GeminiClient::new(&config);
    info!(model = %generator.model(), "Generation client ready");

    let static_dir = env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string());

    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();
    let mut port = "8090".to_string();
    let mut unix_socket = None;

    let mut i = 1;
    while i < args.len() {
        if args[i] == "--unix" && i + 1 < args.len() {
            unix_socket = Some(args[i + 1].clone());
            i += 2;
        } else {
            port = args[i].clone();
            i += 1;
        }
    }

    let app = router(AppState::new(Arc::new(generator)), &static_dir);

    info!(static_dir = %static_dir, "Initialized routes");

    if let Some(socket_path) = unix_socket {
        // stale socket from a previous run
        tokio::fs::remove_file(&socket_path).await.ok();
        let listener = UnixListener::bind(&socket_path)
            .with_context(|| format!("binding unix socket {socket_path}"))?;

        info!("Starting server on Unix socket: {}", socket_path);
        axum::serve(listener, app.into_make_service()).await?;
    } else {
        let listener = TcpListener::bind(format!("0.0.0.0:{}", port))
            .await
            .with_context(|| format!("binding port {port}"))?;
        info!("Starting server on port {}", port);
        axum::serve(listener, app.into_make_service()).await?;
    }

    Ok(())
}
