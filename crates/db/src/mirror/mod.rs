//! Full-refresh mirroring of a record batch into a Postgres table.
//!
//! A run stages the batch with `COPY`, upserts the staged rows into the
//! target on the natural key and deletes target rows the batch no longer
//! contains. Phases after schema setup share one transaction.

pub mod copy;
pub mod models;
pub mod pg_repository;
pub mod repositories;
pub mod sql;
pub mod synchronizer;

pub use models::{
    CellValue, ColumnKind, ColumnSpec, MirrorOutcome, MirrorRecord, StagedRow, StagingBatch,
    TableSpec,
};
pub use pg_repository::PgMirrorStore;
pub use repositories::{MirrorSession, MirrorStore};
pub use synchronizer::Synchronizer;
