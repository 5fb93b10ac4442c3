//! # State Machine
//!
//! Status enums and transition metadata for orders, appointments, and the
//! virtual-inspection queue.

pub mod states;

pub use states::{AppointmentStatus, Modality, OrderSource, OrderStatus, QueueState, StatusInternal};
