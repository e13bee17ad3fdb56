pub mod connection;
pub mod control;
pub mod record_source;
pub mod submission;
