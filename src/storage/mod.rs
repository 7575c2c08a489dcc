//! Durable storage: the WAL, the JSONL snapshot, and the in-memory
//! indexed issue store, composed together by the workspace manager.

pub mod snapshot;
pub mod store;
pub mod wal;

pub use snapshot::{LoadResult, SNAPSHOT_FILE_NAME};
pub use store::{Filter, IssuePatch, IssueStore, SortField};
pub use wal::{OpCode, ReadResult, Wal, WalRecord, WAL_FILE_NAME};
