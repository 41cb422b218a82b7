pub mod client;
pub mod entities;
pub mod models;
pub mod sync;
