mod local_store;
mod memory_store;

pub use local_store::LocalBlobStore;
pub use memory_store::InMemoryBlobStore;
