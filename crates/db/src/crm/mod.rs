//! Typed HubSpot CRM records and the coercions that build them.

pub mod coerce;
pub mod models;

pub use models::{Contact, Deal, Engagement, Lead, Properties};
