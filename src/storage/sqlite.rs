//! SQLite implementation of [`Storage`].
//!
//! Each operation runs on a blocking worker with its own connection and a
//! single transaction. The connection is dropped when the worker returns,
//! whether the transaction committed or not; an uncommitted transaction rolls
//! back on drop.

use super::Storage;
use crate::db::Database;
use crate::domain::{
    Deleted, Diagnosis, DiagnosisFields, DiagnosisId, Paging, Patient, PatientFields, PatientId,
};
use crate::error::{RecordsError, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, info};

pub struct SqliteStorage {
    db: Database,
}

impl SqliteStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    async fn with_session<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = db.session()?;
            f(&mut conn)
        })
        .await?
    }
}

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        ssn: row.get(3)?,
    })
}

fn diagnosis_from_row(row: &Row<'_>) -> rusqlite::Result<Diagnosis> {
    Ok(Diagnosis {
        id: row.get(0)?,
        name: row.get(1)?,
        patient_id: row.get(2)?,
    })
}

fn find_patient(conn: &Connection, id: PatientId) -> Result<Option<Patient>> {
    let patient = conn
        .query_row(
            "SELECT id, name, age, ssn FROM patient WHERE id = ?1",
            params![id],
            patient_from_row,
        )
        .optional()?;
    Ok(patient)
}

fn require_patient(conn: &Connection, id: PatientId) -> Result<Patient> {
    find_patient(conn, id)?.ok_or(RecordsError::PatientNotFound)
}

fn find_diagnosis(conn: &Connection, id: DiagnosisId) -> Result<Option<Diagnosis>> {
    let diagnosis = conn
        .query_row(
            "SELECT id, name, patient_id FROM diagnosis WHERE id = ?1",
            params![id],
            diagnosis_from_row,
        )
        .optional()?;
    Ok(diagnosis)
}

fn diagnoses_for(conn: &Connection, patient_id: PatientId) -> Result<Vec<Diagnosis>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, patient_id FROM diagnosis WHERE patient_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![patient_id], diagnosis_from_row)?;
    let diagnoses = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(diagnoses)
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn create_patient(&self, fields: PatientFields) -> Result<Patient> {
        let patient = self
            .with_session(move |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                tx.execute(
                    "INSERT INTO patient (name, age, ssn) VALUES (?1, ?2, ?3)",
                    params![fields.name, fields.age, fields.ssn],
                )?;
                let patient = require_patient(&tx, tx.last_insert_rowid())?;
                tx.commit()?;
                Ok(patient)
            })
            .await?;

        info!(patient_id = patient.id, "Created patient");
        Ok(patient)
    }

    async fn list_patients(&self, paging: Paging) -> Result<Vec<Patient>> {
        let patients = self
            .with_session(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, age, ssn FROM patient ORDER BY id LIMIT ?1 OFFSET ?2",
                )?;
                let rows = stmt.query_map(
                    params![i64::from(paging.limit()), i64::from(paging.offset())],
                    patient_from_row,
                )?;
                let patients = rows.collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(patients)
            })
            .await?;

        debug!(
            offset = paging.offset(),
            limit = paging.limit(),
            returned = patients.len(),
            "Listed patients"
        );
        Ok(patients)
    }

    async fn get_patient(&self, id: PatientId) -> Result<Patient> {
        self.with_session(move |conn| require_patient(conn, id)).await
    }

    async fn update_patient(&self, id: PatientId, fields: PatientFields) -> Result<Patient> {
        let patient = self
            .with_session(move |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let changed = tx.execute(
                    "UPDATE patient SET name = ?1, age = ?2, ssn = ?3 WHERE id = ?4",
                    params![fields.name, fields.age, fields.ssn, id],
                )?;
                if changed == 0 {
                    return Err(RecordsError::PatientNotFound);
                }
                let patient = require_patient(&tx, id)?;
                tx.commit()?;
                Ok(patient)
            })
            .await?;

        info!(patient_id = id, "Updated patient");
        Ok(patient)
    }

    async fn delete_patient(&self, id: PatientId) -> Result<Deleted> {
        let deleted = self
            .with_session(move |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                require_patient(&tx, id)?;
                let diagnoses_removed =
                    tx.execute("DELETE FROM diagnosis WHERE patient_id = ?1", params![id])?;
                tx.execute("DELETE FROM patient WHERE id = ?1", params![id])?;
                tx.commit()?;
                Ok(Deleted { diagnoses_removed })
            })
            .await?;

        info!(
            patient_id = id,
            diagnoses_removed = deleted.diagnoses_removed,
            "Deleted patient"
        );
        Ok(deleted)
    }

    async fn create_diagnosis(
        &self,
        patient_id: PatientId,
        fields: DiagnosisFields,
    ) -> Result<Diagnosis> {
        let diagnosis = self
            .with_session(move |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                require_patient(&tx, patient_id)?;
                tx.execute(
                    "INSERT INTO diagnosis (name, patient_id) VALUES (?1, ?2)",
                    params![fields.name, patient_id],
                )?;
                let diagnosis = find_diagnosis(&tx, tx.last_insert_rowid())?.ok_or_else(|| {
                    RecordsError::Database(rusqlite::Error::QueryReturnedNoRows)
                })?;
                tx.commit()?;
                Ok(diagnosis)
            })
            .await?;

        info!(
            patient_id,
            diagnosis_id = diagnosis.id,
            "Created diagnosis"
        );
        Ok(diagnosis)
    }

    async fn list_diagnoses(&self, patient_id: PatientId) -> Result<Vec<Diagnosis>> {
        self.with_session(move |conn| {
            let tx = conn.transaction()?;
            require_patient(&tx, patient_id)?;
            let diagnoses = diagnoses_for(&tx, patient_id)?;
            tx.commit()?;
            Ok(diagnoses)
        })
        .await
    }

    async fn delete_diagnosis(
        &self,
        patient_id: PatientId,
        diagnosis_id: DiagnosisId,
    ) -> Result<Diagnosis> {
        let diagnosis = self
            .with_session(move |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let diagnosis = find_diagnosis(&tx, diagnosis_id)?
                    .filter(|d| d.patient_id == patient_id)
                    .ok_or(RecordsError::DiagnosisNotFound)?;
                tx.execute("DELETE FROM diagnosis WHERE id = ?1", params![diagnosis_id])?;
                tx.commit()?;
                Ok(diagnosis)
            })
            .await?;

        info!(patient_id, diagnosis_id, "Deleted diagnosis");
        Ok(diagnosis)
    }
}
