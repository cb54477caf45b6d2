//! openvpn-exporter — Prometheus exporter for OpenVPN status files.
//!
//! Serves `/metrics` (rate-limited, one collection pass per scrape),
//! `/health`, and a small index page. All parsing and validation lives in
//! `openvpn-exporter-core`; this binary is the HTTP and CLI glue.

mod handlers;
mod state;

use std::net::SocketAddr;
use std::process;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use clap::Parser;
use tower_http::compression::CompressionLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use openvpn_exporter_core::collector::{Collector, ExporterConfig};
use openvpn_exporter_core::ratelimit::RateLimiter;

use state::AppState;

/// Prometheus exporter for OpenVPN server and client status files.
#[derive(Parser)]
#[command(
    name = "openvpn-exporter",
    about = "Prometheus exporter for OpenVPN status files",
    version = openvpn_exporter_core::VERSION
)]
struct Args {
    /// Listen address for the web interface and telemetry.
    #[arg(long, default_value = "0.0.0.0:9176", env = "LISTEN_ADDRESS")]
    listen: String,

    /// Comma-separated paths at which OpenVPN places its status files.
    #[arg(
        long,
        env = "STATUS_PATHS",
        value_delimiter = ',',
        default_value = "/var/log/openvpn/openvpn-status.log"
    )]
    status_paths: Vec<String>,

    /// Suppress per-client and per-route metric series.
    #[arg(long, env = "IGNORE_INDIVIDUALS")]
    ignore_individuals: bool,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "openvpn_exporter=info".parse().unwrap()),
        )
        .init();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
        .block_on(async_main(args));
}

async fn async_main(args: Args) {
    let addr: SocketAddr = match args.listen.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(listen = %args.listen, error = %e, "invalid listen address");
            process::exit(1);
        }
    };

    let config = ExporterConfig {
        status_paths: args.status_paths,
        ignore_individuals: args.ignore_individuals,
    };
    info!(
        paths = ?config.status_paths,
        ignore_individuals = config.ignore_individuals,
        "starting openvpn-exporter"
    );

    let app_state = Arc::new(AppState {
        collector: Collector::new(config),
        limiter: RateLimiter::default(),
    });

    let app = Router::new()
        .route("/", get(handlers::handle_index))
        .route("/health", get(handlers::handle_health))
        .route("/metrics", get(handlers::handle_metrics))
        .layer(CompressionLayer::new())
        .with_state(app_state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(listen = %addr, error = %e, "failed to bind listener");
            process::exit(1);
        }
    };
    info!(listen = %addr, "openvpn-exporter listening");

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        error!(error = %e, "server exited with error");
        process::exit(1);
    }
}
