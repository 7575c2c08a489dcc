//! `beads_rust`: the storage and coordination core for a local-first issue
//! and dependency tracker. A durable issue store with write-ahead logging
//! and crash recovery, a dependency graph with cycle detection and
//! ready/blocked computation, content-addressed dedup and optimistic
//! concurrency, and multi-process file locking.

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod lock;
pub mod logging;
pub mod model;
pub mod storage;
pub mod sync;
pub mod util;
pub mod validation;
pub mod workspace;

pub use error::{BeadsError, StructuredError};
