//! # Database Layer
//!
//! Persistence seam for the coordination engine. [`InspectionStore`] is the
//! trait every manager talks to; [`PgStore`] is the production Postgres
//! implementation and [`MemoryStore`] backs tests and embedded setups.

pub mod memory;
pub mod pg;
pub mod store;

pub use memory::MemoryStore;
pub use pg::PgStore;
pub use store::{InspectionStore, SupersessionOutcome};
