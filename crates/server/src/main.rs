use std::future::IntoFuture;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use jawn_content::{CachedContentService, OutputCache};
use jawn_images::ImageUrls;
use tracing::{info, warn};

use jawn_server::api::AppState;
use jawn_server::config::{Environment, JawnConfig};
use jawn_server::templates::Templates;
use jawn_server::{blob_factory, seed, state_factory};

/// Copilot That Jawn web server.
#[derive(Parser, Debug)]
#[command(name = "jawn-server", about = "Web server for Copilot That Jawn")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "jawn.toml")]
    config: PathBuf,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the hosting environment.
    #[arg(long, env = "JAWN_ENVIRONMENT", value_enum)]
    environment: Option<Environment>,

    /// Azure Storage connection string.
    #[arg(long, env = "AZURE_STORAGE_CONNECTION_STRING", hide_env_values = true)]
    connection_string: Option<String>,

    /// Shared secret for the refresh endpoints.
    #[arg(long, env = "JAWN_REFRESH_API_KEY", hide_env_values = true)]
    refresh_api_key: Option<String>,
}

impl Cli {
    fn apply(self, config: &mut JawnConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(environment) = self.environment {
            config.server.environment = environment;
        }
        if self.connection_string.is_some() {
            config.storage.connection_string = self.connection_string;
        }
        if self.refresh_api_key.is_some() {
            config.refresh.api_key = self.refresh_api_key;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let mut config = JawnConfig::load(&cli.config)?;
    cli.apply(&mut config);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    info!(environment = %config.server.environment, "starting jawn-server");

    let table = state_factory::create_table(&config.storage).await?;
    let distributed = state_factory::create_cache(&config.cache)?;
    let images = blob_factory::create_blob_store(&config.images, &config.storage).await?;
    let urls = ImageUrls::new(
        config.images.cdn_endpoint.clone(),
        config.images.container.clone(),
    );

    if let Some(dir) = &config.storage.seed_dir {
        if config.storage.backend == "memory" {
            seed::seed_content(dir, Arc::clone(&table), Arc::clone(&images), urls.clone()).await?;
        } else {
            warn!(backend = %config.storage.backend, "seed_dir ignored outside the memory backend");
        }
    }

    let output_cache = Arc::new(OutputCache::with_capacity(
        !config.server.environment.is_development(),
        config.cache.output_max_bytes,
    ));
    info!(enabled = output_cache.is_enabled(), "output cache configured");

    let content = CachedContentService::new(
        table,
        distributed,
        Arc::clone(&output_cache),
        urls,
        config.cache.settings(),
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);

    let state = AppState {
        content: Arc::new(content),
        output_cache,
        images,
        templates: Arc::new(Templates::new()?),
        config: Arc::new(config),
    };
    let app = jawn_server::api::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "jawn-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM, bounded by the
    // configured drain timeout.
    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(());
        })
        .into_future();
    let drain_deadline = async move {
        if signalled_rx.await.is_ok() {
            tokio::time::sleep(shutdown_timeout).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = server => result?,
        () = drain_deadline => {
            warn!(
                timeout_secs = shutdown_timeout.as_secs(),
                "shutdown timeout exceeded, dropping open connections"
            );
        }
    }

    info!("jawn-server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
