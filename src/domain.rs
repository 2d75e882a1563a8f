//! Record shapes shared by the access layer and the HTTP boundary.
//!
//! A `Patient` never embeds its diagnoses. Callers that need them issue an
//! explicit `list_diagnoses(patient_id)` against the storage layer.

use crate::constants::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::error::{RecordsError, Result};
use serde::{Deserialize, Serialize};

pub type PatientId = i64;
pub type DiagnosisId = i64;

/// A persisted patient row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub name: String,
    pub age: Option<i64>,
    pub ssn: String,
}

/// Caller-supplied patient fields; any `id` in the payload is ignored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientFields {
    pub name: String,
    #[serde(default)]
    pub age: Option<i64>,
    pub ssn: String,
}

impl PatientFields {
    pub fn into_patient(self, id: PatientId) -> Patient {
        Patient {
            id,
            name: self.name,
            age: self.age,
            ssn: self.ssn,
        }
    }
}

/// A persisted diagnosis row, always owned by one patient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub id: DiagnosisId,
    pub name: String,
    pub patient_id: PatientId,
}

/// Caller-supplied diagnosis fields; `patient_id` comes from the path, never the body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisFields {
    pub name: String,
}

/// Marker returned by a successful patient delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deleted {
    pub diagnoses_removed: usize,
}

/// Offset/limit window for patient listings. Construct through [`Paging::new`]
/// so the limit bound is checked before storage is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    offset: u32,
    limit: u32,
}

impl Paging {
    pub fn new(offset: Option<u32>, limit: Option<u32>) -> Result<Self> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if limit > MAX_PAGE_LIMIT {
            return Err(RecordsError::Validation(format!(
                "limit must be less than or equal to {MAX_PAGE_LIMIT}, got {limit}"
            )));
        }
        Ok(Self {
            offset: offset.unwrap_or(0),
            limit,
        })
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patient_fields_ignore_caller_supplied_id() {
        let fields: PatientFields =
            serde_json::from_value(json!({"id": 99, "name": "Ann", "age": 40, "ssn": "123-45-6789"}))
                .unwrap();
        let patient = fields.into_patient(1);
        assert_eq!(patient.id, 1);
        assert_eq!(patient.name, "Ann");
        assert_eq!(patient.age, Some(40));
    }

    #[test]
    fn patient_age_is_optional() {
        let fields: PatientFields =
            serde_json::from_value(json!({"name": "Bo", "ssn": "000-00-0000"})).unwrap();
        assert_eq!(fields.age, None);
    }

    #[test]
    fn patient_fields_require_name_and_ssn() {
        assert!(serde_json::from_value::<PatientFields>(json!({"name": "Bo"})).is_err());
        assert!(serde_json::from_value::<PatientFields>(json!({"ssn": "1"})).is_err());
    }

    #[test]
    fn diagnosis_fields_drop_body_patient_id() {
        let fields: DiagnosisFields =
            serde_json::from_value(json!({"name": "flu", "patient_id": 7})).unwrap();
        assert_eq!(fields, DiagnosisFields { name: "flu".into() });
    }

    #[test]
    fn paging_defaults_to_first_hundred() {
        let paging = Paging::new(None, None).unwrap();
        assert_eq!(paging, Paging::default());
        assert_eq!((paging.offset(), paging.limit()), (0, 100));
    }

    #[test]
    fn paging_accepts_bounds_and_rejects_above_max() {
        assert_eq!(Paging::new(Some(5), Some(0)).unwrap().limit(), 0);
        assert_eq!(Paging::new(None, Some(100)).unwrap().limit(), 100);
        let err = Paging::new(None, Some(101)).unwrap_err();
        assert!(matches!(err, RecordsError::Validation(_)));
    }
}
