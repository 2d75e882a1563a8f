/// Shared constants for paging, schema names and defaults

// Paging bounds for patient listings
pub const DEFAULT_PAGE_LIMIT: u32 = 100;
pub const MAX_PAGE_LIMIT: u32 = 100;

// Table names as created by the schema layer
pub const PATIENT_TABLE: &str = "patient";
pub const DIAGNOSIS_TABLE: &str = "diagnosis";

// Defaults used when neither config file nor environment specify a value
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DATABASE_PATH: &str = "database.db";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_CONFIG_FILE: &str = "patient_records.toml";
