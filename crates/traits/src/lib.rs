pub mod executor;
pub mod store;

pub use executor::{Executor, SyncExecutor};
pub use store::{ConfigStore, InMemoryConfigStore, SharedDocument, StoreError};
