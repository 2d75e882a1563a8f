use crate::domain::{
    Diagnosis, DiagnosisFields, DiagnosisId, Paging, Patient, PatientFields, PatientId,
};
use crate::error::RecordsError;
use crate::metrics::{self, MetricName};
use crate::storage::Storage;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get},
    Router,
};
use hyper::Server;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared handler state: the storage handle and, optionally, the metrics renderer
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Error response wrapper; renders `{"detail": ...}` with the mapped status
#[derive(Debug)]
pub struct ApiError(RecordsError);

impl From<RecordsError> for ApiError {
    fn from(err: RecordsError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(RecordsError::Validation(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError(RecordsError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(RecordsError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let detail = match status {
            StatusCode::NOT_FOUND => {
                metrics::increment(MetricName::NotFound);
                self.0.to_string()
            }
            StatusCode::UNPROCESSABLE_ENTITY => {
                metrics::increment(MetricName::ValidationRejected);
                self.0.to_string()
            }
            _ => {
                metrics::increment(MetricName::StorageErrors);
                error!(error = %self.0, "Request failed in storage layer");
                "Internal server error".to_string()
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "patient-records",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Metrics are disabled" })),
        )
            .into_response(),
    }
}

async fn create_patient(
    State(state): State<AppState>,
    payload: Result<Json<PatientFields>, JsonRejection>,
) -> ApiResult<Patient> {
    let Json(fields) = payload?;
    let patient = state.storage.create_patient(fields).await?;
    metrics::increment(MetricName::PatientsCreated);
    Ok(Json(patient))
}

async fn list_patients(
    State(state): State<AppState>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Vec<Patient>> {
    let Query(params) = params?;
    let paging = Paging::new(params.offset, params.limit)?;
    let patients = state.storage.list_patients(paging).await?;
    Ok(Json(patients))
}

async fn get_patient(
    State(state): State<AppState>,
    path: Result<Path<PatientId>, PathRejection>,
) -> ApiResult<Patient> {
    let Path(patient_id) = path?;
    let patient = state.storage.get_patient(patient_id).await?;
    Ok(Json(patient))
}

async fn update_patient(
    State(state): State<AppState>,
    path: Result<Path<PatientId>, PathRejection>,
    payload: Result<Json<PatientFields>, JsonRejection>,
) -> ApiResult<Patient> {
    let Path(patient_id) = path?;
    let Json(fields) = payload?;
    let patient = state.storage.update_patient(patient_id, fields).await?;
    metrics::increment(MetricName::PatientsUpdated);
    Ok(Json(patient))
}

async fn delete_patient(
    State(state): State<AppState>,
    path: Result<Path<PatientId>, PathRejection>,
) -> ApiResult<serde_json::Value> {
    let Path(patient_id) = path?;
    let deleted = state.storage.delete_patient(patient_id).await?;
    metrics::increment(MetricName::PatientsDeleted);
    metrics::increment_by(MetricName::CascadedDiagnoses, deleted.diagnoses_removed as u64);
    Ok(Json(json!({ "ok": true })))
}

async fn create_diagnosis(
    State(state): State<AppState>,
    path: Result<Path<PatientId>, PathRejection>,
    payload: Result<Json<DiagnosisFields>, JsonRejection>,
) -> ApiResult<Diagnosis> {
    let Path(patient_id) = path?;
    let Json(fields) = payload?;
    let diagnosis = state.storage.create_diagnosis(patient_id, fields).await?;
    metrics::increment(MetricName::DiagnosesCreated);
    Ok(Json(diagnosis))
}

async fn list_diagnoses(
    State(state): State<AppState>,
    path: Result<Path<PatientId>, PathRejection>,
) -> ApiResult<Vec<Diagnosis>> {
    let Path(patient_id) = path?;
    let diagnoses = state.storage.list_diagnoses(patient_id).await?;
    Ok(Json(diagnoses))
}

async fn delete_diagnosis(
    State(state): State<AppState>,
    path: Result<Path<(PatientId, DiagnosisId)>, PathRejection>,
) -> ApiResult<Diagnosis> {
    let Path((patient_id, diagnosis_id)) = path?;
    let diagnosis = state
        .storage
        .delete_diagnosis(patient_id, diagnosis_id)
        .await?;
    metrics::increment(MetricName::DiagnosesDeleted);
    Ok(Json(diagnosis))
}

/// Create the HTTP router. Every resource path answers with and without a
/// trailing slash.
pub fn create_server(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let patients = get(list_patients).post(create_patient);
    let patient = get(get_patient).put(update_patient).delete(delete_patient);
    let diagnoses = get(list_diagnoses).post(create_diagnosis);
    let diagnosis = delete(delete_diagnosis);

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .route("/patients", patients.clone())
        .route("/patients/", patients)
        .route("/patients/:patient_id", patient.clone())
        .route("/patients/:patient_id/", patient)
        .route("/patients/:patient_id/diagnoses", diagnoses.clone())
        .route("/patients/:patient_id/diagnoses/", diagnoses)
        .route(
            "/patients/:patient_id/diagnoses/:diagnosis_id",
            diagnosis.clone(),
        )
        .route("/patients/:patient_id/diagnoses/:diagnosis_id/", diagnosis)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Start the HTTP server on `addr`, returning once a shutdown signal arrives
pub async fn start_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_server(state);

    info!(%addr, "HTTP server running");
    info!("Health check: http://{addr}/health");

    Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
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
