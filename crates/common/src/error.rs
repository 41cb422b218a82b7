use std::fmt;

use thiserror::Error;

/// The ordered phases of a mirror synchronization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    EnsureSchema,
    ClearStaging,
    BulkLoad,
    Upsert,
    Prune,
    Commit,
}

impl SyncPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPhase::EnsureSchema => "ensure_schema",
            SyncPhase::ClearStaging => "clear_staging",
            SyncPhase::BulkLoad => "bulk_load",
            SyncPhase::Upsert => "upsert",
            SyncPhase::Prune => "prune",
            SyncPhase::Commit => "commit",
        }
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum CrmError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("{phase} phase failed: {message}")]
    Phase { phase: SyncPhase, message: String },

    #[error("validation error: {0}")]
    Validation(String),
}

impl CrmError {
    pub fn phase(phase: SyncPhase, err: impl fmt::Display) -> Self {
        CrmError::Phase {
            phase,
            message: err.to_string(),
        }
    }

    /// The phase a failed run stopped in, if the failure happened inside one.
    pub fn failed_phase(&self) -> Option<SyncPhase> {
        match self {
            CrmError::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

pub type CrmResult<T> = Result<T, CrmError>;
