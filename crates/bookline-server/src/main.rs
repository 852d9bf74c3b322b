use bookline_config::loader::load_config;
use bookline_server::observability::{apply_logging_level, init_tracing};
use bookline_server::BooklineServer;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Load .env first so BOOKLINE__* overrides are visible to the
    // config loader.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config_path = resolve_config_path();
    let config = match load_config(config_path.as_deref()) {
        Ok(config) => config,
        Err(message) => {
            error!(%message, "invalid configuration");
            std::process::exit(2);
        }
    };
    apply_logging_level(&config.logging.level);
    info!(addr = %config.addr(), "starting bookline server");

    if let Err(error) = BooklineServer::new(config).run().await {
        error!(%error, "server error");
        std::process::exit(1);
    }
}

/// `--config <path>` wins over `BOOKLINE_CONFIG`; with neither set the
/// loader falls back to `bookline.toml` in the working directory.
fn resolve_config_path() -> Option<String> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next();
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(path.to_string());
        }
    }
    std::env::var("BOOKLINE_CONFIG").ok()
}
