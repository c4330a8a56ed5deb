pub mod models;
pub mod repos;
pub mod store;

pub use store::{MemoryStore, PgStore, Store, StoreError, StoreResult, StoreTx};
