mod file;
mod memory;

pub use file::FileRecordSource;
pub use memory::InMemoryRecordSource;
