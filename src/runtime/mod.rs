//! Runtime module
//!
//! Provides the spawned work handle used by the runtime-backed variants.

pub mod async_task;

pub use async_task::AsyncTask;
