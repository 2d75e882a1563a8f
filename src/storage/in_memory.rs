use super::Storage;
use crate::domain::{
    Deleted, Diagnosis, DiagnosisFields, DiagnosisId, Paging, Patient, PatientFields, PatientId,
};
use crate::error::{RecordsError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Default)]
struct Tables {
    patients: BTreeMap<PatientId, Patient>,
    diagnoses: BTreeMap<DiagnosisId, Diagnosis>,
    // High-water marks so ids are never handed out twice
    last_patient_id: PatientId,
    last_diagnosis_id: DiagnosisId,
}

impl Tables {
    fn require_patient(&self, id: PatientId) -> Result<&Patient> {
        self.patients.get(&id).ok_or(RecordsError::PatientNotFound)
    }
}

/// In-memory storage implementation for development/testing.
///
/// One lock guards both tables, so every operation is atomic just like a
/// SQLite transaction.
#[derive(Default)]
pub struct InMemoryStorage {
    tables: Mutex<Tables>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| RecordsError::Poisoned)
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_patient(&self, fields: PatientFields) -> Result<Patient> {
        let mut tables = self.tables()?;
        tables.last_patient_id += 1;
        let patient = fields.into_patient(tables.last_patient_id);
        tables.patients.insert(patient.id, patient.clone());

        debug!(patient_id = patient.id, "Created patient");
        Ok(patient)
    }

    async fn list_patients(&self, paging: Paging) -> Result<Vec<Patient>> {
        let tables = self.tables()?;
        Ok(tables
            .patients
            .values()
            .skip(paging.offset() as usize)
            .take(paging.limit() as usize)
            .cloned()
            .collect())
    }

    async fn get_patient(&self, id: PatientId) -> Result<Patient> {
        let tables = self.tables()?;
        tables.require_patient(id).cloned()
    }

    async fn update_patient(&self, id: PatientId, fields: PatientFields) -> Result<Patient> {
        let mut tables = self.tables()?;
        let patient = tables
            .patients
            .get_mut(&id)
            .ok_or(RecordsError::PatientNotFound)?;
        *patient = fields.into_patient(id);

        debug!(patient_id = id, "Updated patient");
        Ok(patient.clone())
    }

    async fn delete_patient(&self, id: PatientId) -> Result<Deleted> {
        let mut tables = self.tables()?;
        tables.require_patient(id)?;

        let before = tables.diagnoses.len();
        tables.diagnoses.retain(|_, d| d.patient_id != id);
        let diagnoses_removed = before - tables.diagnoses.len();
        tables.patients.remove(&id);

        debug!(patient_id = id, diagnoses_removed, "Deleted patient");
        Ok(Deleted { diagnoses_removed })
    }

    async fn create_diagnosis(
        &self,
        patient_id: PatientId,
        fields: DiagnosisFields,
    ) -> Result<Diagnosis> {
        let mut tables = self.tables()?;
        tables.require_patient(patient_id)?;

        tables.last_diagnosis_id += 1;
        let diagnosis = Diagnosis {
            id: tables.last_diagnosis_id,
            name: fields.name,
            patient_id,
        };
        tables.diagnoses.insert(diagnosis.id, diagnosis.clone());

        debug!(patient_id, diagnosis_id = diagnosis.id, "Created diagnosis");
        Ok(diagnosis)
    }

    async fn list_diagnoses(&self, patient_id: PatientId) -> Result<Vec<Diagnosis>> {
        let tables = self.tables()?;
        tables.require_patient(patient_id)?;
        Ok(tables
            .diagnoses
            .values()
            .filter(|d| d.patient_id == patient_id)
            .cloned()
            .collect())
    }

    async fn delete_diagnosis(
        &self,
        patient_id: PatientId,
        diagnosis_id: DiagnosisId,
    ) -> Result<Diagnosis> {
        let mut tables = self.tables()?;
        match tables.diagnoses.get(&diagnosis_id) {
            Some(d) if d.patient_id == patient_id => {}
            _ => return Err(RecordsError::DiagnosisNotFound),
        }
        let diagnosis = tables
            .diagnoses
            .remove(&diagnosis_id)
            .ok_or(RecordsError::DiagnosisNotFound)?;

        debug!(patient_id, diagnosis_id, "Deleted diagnosis");
        Ok(diagnosis)
    }
}
