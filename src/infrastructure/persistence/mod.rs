mod memory_record_store;

pub use memory_record_store::InMemoryRecordStore;
