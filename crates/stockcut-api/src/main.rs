use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use stockcut_core::export::{pattern_table_csv, slitting_rows_csv};
use stockcut_core::{
    OptimizerConfig, OptimizerError, PackingRequest, PackingResult, SlittingRequest,
    SlittingResult,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Slitting runs allowed at once when `STOCKCUT_MAX_SLITS` is unset.
const DEFAULT_MAX_SLITS: usize = 4;

#[derive(Clone)]
struct AppState {
    config: Arc<OptimizerConfig>,
    /// Bounds concurrent slitting runs, and with them the solver threads a
    /// timed-out run leaves behind
    slit_permits: Arc<Semaphore>,
}

impl AppState {
    fn new(config: OptimizerConfig, max_slits: usize) -> Self {
        Self {
            config: Arc::new(config),
            slit_permits: Arc::new(Semaphore::new(max_slits.max(1))),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting stock cutting API");

    let config = load_config()?;
    let max_slits = std::env::var("STOCKCUT_MAX_SLITS")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_MAX_SLITS);
    info!("Allowing {} concurrent slitting runs", max_slits);
    let state = AppState::new(config, max_slits);

    let app = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/pack", post(pack))
        .route("/api/pack/csv", post(pack_csv))
        .route("/api/slit", post(slit))
        .route("/api/slit/csv", post(slit_csv))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state);

    let addr = std::env::var("STOCKCUT_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on http://{}", addr);
    info!("Try: curl http://localhost:3000/api/health");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Optional JSON settings file named by `STOCKCUT_CONFIG`.
fn load_config() -> anyhow::Result<OptimizerConfig> {
    let Ok(path) = std::env::var("STOCKCUT_CONFIG") else {
        return Ok(OptimizerConfig::default());
    };
    let content = std::fs::read_to_string(&path)?;
    let config: OptimizerConfig = serde_json::from_str(&content)?;
    config.validate()?;
    info!("Loaded settings from {}", path);
    Ok(config)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "stockcut-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn run_pack(state: &AppState, request: PackingRequest) -> Result<PackingResult, AppError> {
    info!("Received packing request with {} cut rows", request.cuts.len());

    let result = request.run(&state.config)?;

    info!(
        "Packing complete: {} bars, {:.2}% utilization",
        result.summary.total_bars, result.summary.utilization_percentage
    );
    Ok(result)
}

/// Slitting can run for seconds per thickness group, so it stays off the async workers.
async fn run_slit(state: &AppState, request: SlittingRequest) -> Result<SlittingResult, AppError> {
    info!(
        "Received slitting request with {} orders and {} coils",
        request.orders.len(),
        request.coils.len()
    );

    let Ok(permit) = Arc::clone(&state.slit_permits).try_acquire_owned() else {
        warn!("Rejecting slitting request: all solver slots busy");
        return Err(AppError(SolverBusy.into()));
    };

    let config = Arc::clone(&state.config);
    let result = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        request.run(&config)
    })
    .await??;

    info!(
        "Slitting complete: {} coils used, {} groups skipped",
        result.summary.units_used, result.summary.groups_skipped
    );
    Ok(result)
}

async fn pack(
    State(state): State<AppState>,
    Json(request): Json<PackingRequest>,
) -> Result<Json<PackingResult>, AppError> {
    Ok(Json(run_pack(&state, request).await?))
}

async fn pack_csv(
    State(state): State<AppState>,
    Json(request): Json<PackingRequest>,
) -> Result<Response, AppError> {
    let result = run_pack(&state, request).await?;
    let csv = pattern_table_csv(&result.patterns)?;
    Ok(csv_response(csv))
}

async fn slit(
    State(state): State<AppState>,
    Json(request): Json<SlittingRequest>,
) -> Result<Json<SlittingResult>, AppError> {
    Ok(Json(run_slit(&state, request).await?))
}

async fn slit_csv(
    State(state): State<AppState>,
    Json(request): Json<SlittingRequest>,
) -> Result<Response, AppError> {
    let result = run_slit(&state, request).await?;
    let csv = slitting_rows_csv(&result.assignments)?;
    Ok(csv_response(csv))
}

fn csv_response(csv: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        csv,
    )
        .into_response()
}

/// Every slitting slot is taken.
#[derive(Debug)]
struct SolverBusy;

impl fmt::Display for SolverBusy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Too many slitting runs in progress, try again later")
    }
}

impl std::error::Error for SolverBusy {}

/// Application error type
struct AppError(anyhow::Error);

impl From<OptimizerError> for AppError {
    fn from(err: OptimizerError) -> Self {
        AppError(err.into())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError(err.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError(err)
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        if self.0.is::<SolverBusy>() {
            return StatusCode::SERVICE_UNAVAILABLE;
        }
        match self.0.downcast_ref::<OptimizerError>() {
            Some(OptimizerError::Configuration(_)) | Some(OptimizerError::InvalidInput(_)) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Request error: {}", self.0);

        (
            self.status(),
            Json(json!({
                "error": self.0.to_string(),
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_bad_requests() {
        let err = AppError::from(OptimizerError::Configuration("bad stock".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = AppError::from(OptimizerError::InvalidInput("bad row".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        let err = AppError::from(OptimizerError::Io(io));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_pack_handler_uses_state_config() {
        let state = AppState::new(OptimizerConfig::default(), 1);
        let request: PackingRequest =
            serde_json::from_str(r#"{"cuts": [{"length": 2000, "quantity": 3}]}"#).unwrap();

        let Json(result) = pack(State(state), Json(request)).await.ok().unwrap();
        assert_eq!(result.summary.total_bars, 2);
    }

    #[tokio::test]
    async fn test_slit_runs_on_blocking_pool() {
        let state = AppState::new(OptimizerConfig::default(), 1);
        let request: SlittingRequest = serde_json::from_str(
            r#"{
                "orders": [{"name": "0.75x500", "quantity": 2}],
                "coils": [{"lot_no": "CR075 1000C12700 250401-1"}]
            }"#,
        )
        .unwrap();

        let result = run_slit(&state, request).await.ok().unwrap();
        assert_eq!(result.assignments.len(), 1);
        assert_eq!(result.assignments[0].pattern, "500×2");
        assert_eq!(state.slit_permits.available_permits(), 1);
    }

    #[tokio::test]
    async fn test_slit_is_refused_when_slots_are_busy() {
        let state = AppState::new(OptimizerConfig::default(), 1);
        let _held = Arc::clone(&state.slit_permits).try_acquire_owned().unwrap();

        let request: SlittingRequest = serde_json::from_str(
            r#"{
                "orders": [{"name": "0.75x500"}],
                "coils": [{"lot_no": "CR075 1000C12700 250401-1"}]
            }"#,
        )
        .unwrap();

        let err = run_slit(&state, request).await.err().unwrap();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
