pub mod env;
pub mod tracing_init;

pub use env::{AppConfig, FetchMode, SyncEntity, MAX_PAGE_SIZE};
pub use tracing_init::init_tracing;
