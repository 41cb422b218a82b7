pub mod error;

pub use error::{CrmError, CrmResult, SyncPhase};
