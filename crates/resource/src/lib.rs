//! Configuration stores for the valuer engine.
//!
//! ## Available Stores
//!
//! - [`FilesystemConfigStore`]: documents are files below a base directory
//!
//! ## Re-exports
//!
//! For convenience, we also re-export the in-memory store from valuer-traits:
//! - [`InMemoryConfigStore`]: Pre-populated in-memory storage

mod filesystem;

pub use filesystem::FilesystemConfigStore;

pub use valuer_traits::InMemoryConfigStore;
