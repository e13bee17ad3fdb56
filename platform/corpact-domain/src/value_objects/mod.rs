pub mod acceptance;
pub mod endpoint;
pub mod markers;
pub mod payload;
pub mod phase;
pub mod verdict;
