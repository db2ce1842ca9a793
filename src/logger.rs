use std::env;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins. Otherwise `LOG_LEVEL` (default `info`) applies to this
/// crate, the CLI and request tracing; everything else logs warnings only.
pub fn init_logging() {
    let level = env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn default_directives(level: &str) -> String {
    let level = level.trim().to_lowercase();
    format!("warn,rpp_generator={level},rpp={level},tower_http={level}")
}
