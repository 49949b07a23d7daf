pub mod simple;
pub mod memory;

pub use simple::HttpBlobStore;
pub use memory::MemoryBlobStore;
