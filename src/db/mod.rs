pub mod memory;
pub mod pool;
pub mod postgres;
pub mod store;

pub use pool::connect;
pub use store::{DocumentStore, StoreError, StoreResult};
