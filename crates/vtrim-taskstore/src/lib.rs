//! Durable VideoTask record store.
//!
//! This crate provides:
//! - The `TaskStore` trait with atomic per-call field updates
//! - A Redis-hash implementation with an atomic pending->processing
//!   compare-and-swap (the single-flight guard for duplicate dispatch)
//! - An in-memory implementation for tests and local runs

pub mod error;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use error::{TaskStoreError, TaskStoreResult};
pub use memory::MemoryTaskStore;
pub use redis_store::RedisTaskStore;
pub use store::TaskStore;
