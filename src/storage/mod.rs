use crate::domain::{
    Deleted, Diagnosis, DiagnosisFields, DiagnosisId, Paging, Patient, PatientFields, PatientId,
};
use crate::error::Result;
use async_trait::async_trait;

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryStorage;
pub use sqlite::SqliteStorage;

/// Access layer for patients and their diagnoses.
///
/// Every call is one atomic unit of work. Missing records surface as
/// `RecordsError::PatientNotFound` / `RecordsError::DiagnosisNotFound`.
#[async_trait]
pub trait Storage: Send + Sync {
    // Patient operations
    async fn create_patient(&self, fields: PatientFields) -> Result<Patient>;
    /// Patients in ascending id order, windowed by `paging`
    async fn list_patients(&self, paging: Paging) -> Result<Vec<Patient>>;
    async fn get_patient(&self, id: PatientId) -> Result<Patient>;
    /// Overwrites name, age and ssn. Diagnoses are not touched.
    async fn update_patient(&self, id: PatientId, fields: PatientFields) -> Result<Patient>;
    /// Removes the patient's diagnoses, then the patient, in one transaction
    async fn delete_patient(&self, id: PatientId) -> Result<Deleted>;

    // Diagnosis operations
    async fn create_diagnosis(
        &self,
        patient_id: PatientId,
        fields: DiagnosisFields,
    ) -> Result<Diagnosis>;
    /// Diagnoses of an existing patient in ascending id order.
    /// An unknown patient is `PatientNotFound`, not an empty list.
    async fn list_diagnoses(&self, patient_id: PatientId) -> Result<Vec<Diagnosis>>;
    /// Deletes and returns the diagnosis only if it belongs to `patient_id`
    async fn delete_diagnosis(
        &self,
        patient_id: PatientId,
        diagnosis_id: DiagnosisId,
    ) -> Result<Diagnosis>;
}
