use clap::Parser;
use std::{error::Error, sync::Arc, time::Duration};
use axum::{
    extract::{Json, State}, http::StatusCode, response::{IntoResponse, Response}, routing::{get, post}, Router
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::{net::TcpListener, task::JoinHandle};
use tower_http::{
    trace::TraceLayer,
    cors::{CorsLayer, Any},
};
use http::header;
use common::config::{BackendConfig, Config};
use crate::{
    creator::CustomerCreator,
    lifecycle::ShutdownHandle,
    model::Customer,
    storage::CustomerStorage,
};

pub const GREETING: &str = "Hello World!";

/// How often histogram samples are drained into the exporter's summaries.
pub const METRICS_UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to config file
    #[arg(short, long, default_value = "target/debug/config/total_config.yaml")]
    pub config: String,
}

pub fn initialize_executable() -> Result<Config, Box<dyn Error + Send + Sync>> {
    let args = Args::parse();
    println!("Loading config from: {}", args.config);
    load_config(&args.config)
}

/// Reads the YAML config, then lets `.env` / process variables override it.
pub fn load_config(config_path: &str) -> Result<Config, Box<dyn Error + Send + Sync>> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    let config = Config::load(config_path)?.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

/// `RUST_LOG` takes precedence over the configured level.
pub fn initialize_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[derive(Clone)]
pub struct AppState {
    creator: CustomerCreator,
    shutdown: ShutdownHandle,
    metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(storage: Arc<dyn CustomerStorage>, shutdown: ShutdownHandle) -> Self {
        Self {
            creator: CustomerCreator::new(storage),
            shutdown,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: PrometheusHandle) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }
}

pub fn build_router(
    state: AppState,
    cors_origin: Option<&str>,
) -> Result<Router, Box<dyn Error + Send + Sync>> {
    let router = Router::new()
        .route("/", get(greeting))
        .route("/customers", post(create_customer))
        .route("/shutdown", get(shutdown))
        .route("/health", get(health_check))
        .route("/metrics", get(render_metrics))
        .layer(TraceLayer::new_for_http());

    let router = match cors_origin {
        Some(origin) => router.layer(
            CorsLayer::new()
                .allow_origin(origin.parse::<header::HeaderValue>()?)
                .allow_methods(Any)
                .allow_headers(Any),
        ),
        None => router,
    };

    Ok(router.with_state(state))
}

pub async fn run_backend(
    config: BackendConfig,
    storage: Arc<dyn CustomerStorage>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let metrics = PrometheusBuilder::new().install_recorder()?;
    let listener = TcpListener::bind(&config.server_address).await?;
    tracing::info!("Starting backend service at {}", listener.local_addr()?);

    let shutdown = ShutdownHandle::new();
    let upkeep = spawn_metrics_upkeep(metrics.clone(), METRICS_UPKEEP_INTERVAL, shutdown.clone());
    let state = AppState::new(storage, shutdown).with_metrics(metrics);

    let result = serve(listener, state, config.cors_origin.as_deref()).await;
    upkeep.abort();
    result
}

/// Drains histogram samples every `every` until shutdown is requested.
pub fn spawn_metrics_upkeep(
    handle: PrometheusHandle,
    every: Duration,
    shutdown: ShutdownHandle,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            tokio::select! {
                _ = ticker.tick() => handle.run_upkeep(),
                _ = shutdown.wait() => break,
            }
        }
        tracing::debug!("Metrics upkeep stopped");
    })
}

/// Serves until `/shutdown` is called or Ctrl-C is received.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    cors_origin: Option<&str>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let shutdown = state.shutdown_handle();
    let app = build_router(state, cors_origin)?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    tracing::info!("Backend service stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: ShutdownHandle) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = shutdown.wait() => tracing::info!("Shutdown requested over HTTP"),
        _ = ctrl_c => {
            tracing::info!("Received Ctrl-C");
            shutdown.trigger();
        }
    }
}

pub async fn greeting() -> &'static str {
    GREETING
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK").into_response()
}

pub async fn create_customer(
    State(state): State<AppState>,
    Json(customer): Json<Customer>,
) -> Response {
    match state.creator.create(&customer).await {
        Ok(created) => {
            tracing::info!(customer_id = created.id, "Created customer");
            (StatusCode::CREATED, Json(created)).into_response()
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                customer_id = customer.id,
                "Failed to create customer"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

pub async fn shutdown(State(state): State<AppState>) -> impl IntoResponse {
    if state.shutdown.trigger() {
        tracing::info!("Shutdown requested");
    } else {
        tracing::debug!("Shutdown already in progress");
    }
    (StatusCode::OK, "Shutting down")
}

pub async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()).into_response(),
        None => (StatusCode::NOT_FOUND, "Metrics are not enabled").into_response(),
    }
}
