use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordsError {
    #[error("Patient not found")]
    PatientNotFound,

    #[error("Diagnosis not found for this patient")]
    DiagnosisNotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Storage worker failed: {0}")]
    Task(String),

    #[error("Storage lock poisoned")]
    Poisoned,
}

impl RecordsError {
    /// HTTP status code this error surfaces as at the service boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            RecordsError::PatientNotFound | RecordsError::DiagnosisNotFound => 404,
            RecordsError::Validation(_) => 422,
            _ => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == 404
    }
}

impl From<tokio::task::JoinError> for RecordsError {
    fn from(err: tokio::task::JoinError) -> Self {
        RecordsError::Task(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RecordsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_messages_match_wire_details() {
        assert_eq!(RecordsError::PatientNotFound.to_string(), "Patient not found");
        assert_eq!(
            RecordsError::DiagnosisNotFound.to_string(),
            "Diagnosis not found for this patient"
        );
    }

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(RecordsError::PatientNotFound.status_code(), 404);
        assert_eq!(RecordsError::DiagnosisNotFound.status_code(), 404);
        assert_eq!(RecordsError::Validation("limit".into()).status_code(), 422);
        assert_eq!(RecordsError::Poisoned.status_code(), 500);
        assert_eq!(
            RecordsError::Database(rusqlite::Error::QueryReturnedNoRows).status_code(),
            500
        );
    }

    #[test]
    fn only_missing_records_count_as_not_found() {
        assert!(RecordsError::PatientNotFound.is_not_found());
        assert!(!RecordsError::Validation("x".into()).is_not_found());
    }
}
