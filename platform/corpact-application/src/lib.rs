pub mod completion;
pub mod config;
pub mod harness;
pub mod readiness;
pub mod reporting;
pub mod submission;
