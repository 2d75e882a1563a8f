pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod server;
pub mod storage;

pub use db::Database;
pub use domain::{Deleted, Diagnosis, DiagnosisFields, Paging, Patient, PatientFields};
pub use error::{RecordsError, Result};
pub use storage::{InMemoryStorage, SqliteStorage, Storage};
