pub mod control;
pub mod http;
pub mod network;
pub mod records;
