//! HomeSSM server - a self-hosted AWS SSM Parameter Store.
//!
//! Serves the `AmazonSSM` JSON API over plain HTTP. Every request must be
//! SigV4-signed with one of the credentials from the configuration file.
//! Parameters live in a single redb file; `SecureString` values are sealed
//! with AES-256-GCM before they reach disk.
//!
//! # Usage
//!
//! ```text
//! homessm-server --config .homessm-config.yaml --db-path .homessm-db
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `HOMESSM_CONFIG` | `.homessm-config.yaml` | Configuration file |
//! | `HOMESSM_DB_PATH` | `.homessm-db` | Database file |
//! | `HOMESSM_LISTEN` | `0.0.0.0:9080` | Bind address |
//! | `HOMESSM_REGION` | *(from file)* | Overrides the configured region |
//! | `HOMESSM_LOG_LEVEL` | `info` | Log level filter |
//! | `HOMESSM_LOG_FORMAT` | `text` | `text` or `json` |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `HOMESSM_LOG_LEVEL`) |

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use homessm_auth::sigv4::SERVICE_SSM;
use homessm_auth::{Credential, SigV4Verifier, StaticCredentialProvider};
use homessm_core::HomeSsmConfig;
use homessm_ssm_core::config::SsmConfig;
use homessm_ssm_core::handler::HomeSsmHandler;
use homessm_ssm_core::provider::HomeSsmProvider;
use homessm_ssm_core::storage::RedbStore;
use homessm_ssm_core::store::ParameterStore;
use homessm_ssm_http::{SsmHttpConfig, SsmHttpService};

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "homessm-server", version, about = "Self-hosted AWS SSM Parameter Store")]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(long, env = "HOMESSM_CONFIG", default_value = ".homessm-config.yaml")]
    config: PathBuf,

    /// Path to the redb database file. Created if missing.
    #[arg(long, env = "HOMESSM_DB_PATH", default_value = ".homessm-db")]
    db_path: PathBuf,

    /// Address to listen on.
    #[arg(long, env = "HOMESSM_LISTEN", default_value = "0.0.0.0:9080")]
    listen: SocketAddr,

    /// Log level filter, ignored when `RUST_LOG` is set.
    #[arg(long, env = "HOMESSM_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format.
    #[arg(long, env = "HOMESSM_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to `--log-level`.
fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }

    Ok(())
}

/// Build the signature verifier from the configured credentials.
fn build_verifier(config: &HomeSsmConfig) -> SigV4Verifier {
    let provider = StaticCredentialProvider::new(config.credentials.iter().map(|c| {
        Credential::new(
            c.access_key.clone(),
            c.secret_key.clone(),
            c.username.clone(),
        )
    }));
    SigV4Verifier::new(config.region.clone(), SERVICE_SSM, Arc::new(provider))
}

/// Open the database and wire the store, provider and HTTP service together.
fn build_service(config: &HomeSsmConfig, db_path: &Path) -> Result<SsmHttpService<HomeSsmHandler>> {
    let backend = RedbStore::open(db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;
    info!(path = %backend.path().display(), "opened parameter database");
    let store = ParameterStore::open(Arc::new(backend), &config.keys)
        .context("failed to initialize encryption keys")?;

    let aliases: Vec<&str> = store.key_aliases().collect();
    info!(
        default_key = %store.default_alias(),
        key_aliases = ?aliases,
        "parameter store ready",
    );

    let ssm_config = SsmConfig::builder().region(config.region.clone()).build();
    let provider = HomeSsmProvider::new(store, ssm_config);
    let handler = HomeSsmHandler::new(Arc::new(provider));

    let http_config = SsmHttpConfig {
        verifier: Arc::new(build_verifier(config)),
    };
    Ok(SsmHttpService::new(Arc::new(handler), http_config))
}

/// Run the accept loop until ctrl-c, then drain in-flight connections.
async fn serve(listener: TcpListener, service: SsmHttpService<HomeSsmHandler>) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&args.log_level, args.log_format)?;

    let config = HomeSsmConfig::load(&args.config)
        .with_context(|| format!("failed to load configuration {}", args.config.display()))?;

    let access_keys: Vec<&str> = config
        .credentials
        .iter()
        .map(|c| c.access_key.as_str())
        .collect();
    info!(
        listen = %args.listen,
        db_path = %args.db_path.display(),
        region = %config.region,
        access_keys = ?access_keys,
        version = VERSION,
        "starting HomeSSM",
    );

    let service = build_service(&config, &args.db_path)?;

    let listener = TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("failed to bind to {}", args.listen))?;

    info!(addr = %args.listen, "listening for connections");

    serve(listener, service).await
}
