//! QueueStore implementations: in-memory (tests/dev) and file-backed.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;
