//! Service counters recorded through the `metrics` facade.
//!
//! Names follow Prometheus conventions. When the Prometheus recorder is
//! installed the server renders them on `/metrics`; otherwise recording is a
//! no-op.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fmt;
use tracing::info;

/// All metric names used by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    PatientsCreated,
    PatientsUpdated,
    PatientsDeleted,
    DiagnosesCreated,
    DiagnosesDeleted,
    CascadedDiagnoses,
    NotFound,
    ValidationRejected,
    StorageErrors,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::PatientsCreated => "records_patients_created_total",
            MetricName::PatientsUpdated => "records_patients_updated_total",
            MetricName::PatientsDeleted => "records_patients_deleted_total",
            MetricName::DiagnosesCreated => "records_diagnoses_created_total",
            MetricName::DiagnosesDeleted => "records_diagnoses_deleted_total",
            MetricName::CascadedDiagnoses => "records_diagnoses_cascade_deleted_total",
            MetricName::NotFound => "records_not_found_total",
            MetricName::ValidationRejected => "records_validation_rejected_total",
            MetricName::StorageErrors => "records_storage_errors_total",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            PatientsCreated,
            PatientsUpdated,
            PatientsDeleted,
            DiagnosesCreated,
            DiagnosesDeleted,
            CascadedDiagnoses,
            NotFound,
            ValidationRejected,
            StorageErrors,
        ]
        .into_iter()
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn increment(name: MetricName) {
    increment_by(name, 1);
}

pub fn increment_by(name: MetricName, value: u64) {
    ::metrics::counter!(name.as_str()).increment(value);
}

/// Install the global Prometheus recorder. Only one recorder can exist per
/// process, so this fails if called twice.
pub fn install_recorder() -> Result<PrometheusHandle, String> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))?;

    // Register every counter at zero so scrapes see the full catalog
    for name in MetricName::all_metrics() {
        increment_by(name, 0);
    }
    info!("Metrics recorder installed");
    Ok(handle)
}
