//! # Attempt Stores
//!
//! [`crate::traits::attempt_store::AttemptStore`] implementations:
//!
//! - [`file_store::FileAttemptStore`]: JSON files below a storage root, used in production.
//! - [`memory_store::MemoryAttemptStore`]: in-process maps, used by tests and dry runs.
//!
//! Both serialize writers of the same `(student, exercise)` key through [`locks::KeyedLocks`].

pub mod file_store;
pub mod locks;
pub mod memory_store;

pub use file_store::FileAttemptStore;
pub use locks::{AttemptLock, KeyedLocks};
pub use memory_store::MemoryAttemptStore;
