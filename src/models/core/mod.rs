pub mod appointment;
pub mod call_log;
pub mod inspection_order;
pub mod intermediary_account;
pub mod notification;
pub mod queue_entry;
