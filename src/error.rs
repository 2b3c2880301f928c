use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Cannot read {source_name}: {reason}")]
    SourceRead { source_name: String, reason: String },

    #[error("Sheet '{sheet}' is missing expected column '{column}'")]
    SchemaMismatch { sheet: String, column: String },

    #[error("Official net profit {stated} does not match computed {computed} (difference {difference})")]
    SummaryMismatch {
        stated: f64,
        computed: f64,
        difference: f64,
    },

    #[error("No sheet could be loaded from the workbook")]
    NoData,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DashboardError {
    pub fn source_read(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceRead {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

/// Why a single row was rejected by the normalizer.
///
/// These never abort a sheet. They are tallied in the sheet audit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowValidationError {
    #[error("date is missing")]
    MissingDate,

    #[error("unparseable date '{0}'")]
    InvalidDate(String),

    #[error("amount is missing")]
    MissingAmount,

    #[error("unparseable amount '{0}'")]
    InvalidAmount(String),
}

impl RowValidationError {
    pub fn is_date_error(&self) -> bool {
        matches!(self, Self::MissingDate | Self::InvalidDate(_))
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
