//! Binary, CRC-framed write-ahead log.
//!
//! One record per mutation:
//!
//! ```text
//! ┌─────────────┬─────────────┬─────────────┬───────────────┬─────────┐
//! │ u32 length  │ u8 op_code  │ u64 seq_no  │ payload bytes │ u32 crc │
//! └─────────────┴─────────────┴─────────────┴───────────────┴─────────┘
//! ```
//!
//! `length` covers `op_code + seq_no + payload` (not the crc itself).
//! `crc` is CRC-32 over `(op_code, seq_no, payload)`. A short read or a CRC
//! mismatch on the final record is treated as crash-truncation: the valid
//! prefix is returned along with a truncation flag, never an error.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::Result;

pub const WAL_FILE_NAME: &str = "beads.wal";

const HEADER_LEN: usize = 4 + 1 + 8; // length + op_code + seq_no
const CRC_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    Insert = 0,
    Update = 1,
    Delete = 2,
    DepAdd = 3,
    DepRemove = 4,
    LabelAdd = 5,
    LabelRemove = 6,
    CommentAdd = 7,
}

impl OpCode {
    fn from_u8(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::Insert,
            1 => Self::Update,
            2 => Self::Delete,
            3 => Self::DepAdd,
            4 => Self::DepRemove,
            5 => Self::LabelAdd,
            6 => Self::LabelRemove,
            7 => Self::CommentAdd,
            _ => return None,
        })
    }
}

/// A single decoded WAL record.
#[derive(Debug, Clone)]
pub struct WalRecord {
    pub op: OpCode,
    pub seq_no: u64,
    pub payload: Value,
}

/// Envelope wrapping every payload with a schema version tag, per spec.md §6.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    v: u32,
    #[serde(flatten)]
    body: T,
}

/// Result of a `read_all` pass over the WAL.
pub struct ReadResult {
    pub records: Vec<WalRecord>,
    pub truncated: bool,
}

/// Handle to the WAL file. Callers hold the workspace lock for the
/// duration of any append/truncate.
pub struct Wal {
    path: PathBuf,
    next_seq: u64,
}

impl Wal {
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            next_seq: 1,
        }
    }

    /// Append a mutation record, `fsync`ing before returning the new `seq_no`.
    pub fn append<T: Serialize>(&mut self, op: OpCode, payload: &T) -> Result<u64> {
        let seq_no = self.next_seq;
        let envelope = Envelope { v: 1, body: payload };
        let payload_bytes = serde_json::to_vec(&envelope)?;

        let mut frame = Vec::with_capacity(HEADER_LEN + payload_bytes.len() + CRC_LEN);
        let body_len = (1 + 8 + payload_bytes.len()) as u32;
        frame.extend_from_slice(&body_len.to_le_bytes());
        frame.push(op as u8);
        frame.extend_from_slice(&seq_no.to_le_bytes());
        frame.extend_from_slice(&payload_bytes);

        let crc = crc32fast::hash(&frame[4..]);
        frame.extend_from_slice(&crc.to_le_bytes());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&frame)?;
        file.sync_all()?;

        self.next_seq += 1;
        Ok(seq_no)
    }

    /// Read every valid record from the start of the file.
    ///
    /// Stops at the first short read or CRC mismatch; that and everything
    /// after it is dropped, and `truncated` is set.
    pub fn read_all(&self) -> Result<ReadResult> {
        let mut records = Vec::new();
        let mut truncated = false;

        let Ok(mut file) = File::open(&self.path) else {
            return Ok(ReadResult { records, truncated });
        };

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;

        let mut offset = 0usize;
        let mut max_seq = 0u64;

        while offset < buf.len() {
            if buf.len() - offset < 4 {
                truncated = true;
                break;
            }
            let body_len = u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap()) as usize;
            let frame_len = 4 + body_len + CRC_LEN;
            if buf.len() - offset < frame_len || body_len < 9 {
                truncated = true;
                break;
            }

            let body = &buf[offset + 4..offset + 4 + body_len];
            let crc_bytes = &buf[offset + 4 + body_len..offset + frame_len];
            let expected_crc = u32::from_le_bytes(crc_bytes.try_into().unwrap());
            let actual_crc = crc32fast::hash(body);

            if actual_crc != expected_crc {
                truncated = true;
                break;
            }

            let Some(op) = OpCode::from_u8(body[0]) else {
                truncated = true;
                break;
            };
            let seq_no = u64::from_le_bytes(body[1..9].try_into().unwrap());
            let payload_bytes = &body[9..];

            let Ok(value) = serde_json::from_slice::<Value>(payload_bytes) else {
                truncated = true;
                break;
            };

            max_seq = max_seq.max(seq_no);
            records.push(WalRecord {
                op,
                seq_no,
                payload: value,
            });

            offset += frame_len;
        }

        if truncated {
            warn!(path = %self.path.display(), valid_records = records.len(), "WAL tail truncated");
        }

        Ok(ReadResult { records, truncated })
    }

    /// Zero the file and reset the sequence counter. Called after a
    /// successful snapshot flush.
    pub fn truncate(&mut self) -> Result<()> {
        if self.path.exists() {
            let file = OpenOptions::new().write(true).open(&self.path)?;
            file.set_len(0)?;
            file.sync_all()?;
        }
        self.next_seq = 1;
        info!(path = %self.path.display(), "WAL truncated after flush");
        Ok(())
    }

    /// Resume sequence numbering after replaying existing records.
    pub fn resume_from(&mut self, records: &[WalRecord]) {
        if let Some(max) = records.iter().map(|r| r.seq_no).max() {
            self.next_seq = max + 1;
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn wal_path(dir: &TempDir) -> PathBuf {
        dir.path().join(WAL_FILE_NAME)
    }

    #[test]
    fn append_then_read_all_round_trips() {
        let dir = TempDir::new().unwrap();
        let mut wal = Wal::at(wal_path(&dir));

        let seq1 = wal.append(OpCode::Insert, &json!({"id": "bd-a"})).unwrap();
        let seq2 = wal.append(OpCode::Update, &json!({"id": "bd-a", "title": "x"})).unwrap();

        assert_eq!(seq1, 1);
        assert_eq!(seq2, 2);

        let result = wal.read_all().unwrap();
        assert!(!result.truncated);
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0].op, OpCode::Insert);
        assert_eq!(result.records[1].seq_no, 2);
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let wal = Wal::at(wal_path(&dir));
        let result = wal.read_all().unwrap();
        assert!(result.records.is_empty());
        assert!(!result.truncated);
    }

    #[test]
    fn truncated_tail_is_tolerated() {
        let dir = TempDir::new().unwrap();
        let path = wal_path(&dir);
        let mut wal = Wal::at(&path);
        wal.append(OpCode::Insert, &json!({"id": "bd-a"})).unwrap();
        wal.append(OpCode::Insert, &json!({"id": "bd-b"})).unwrap();

        let len = std::fs::metadata(&path).unwrap().len();
        let truncated_len = len.saturating_sub(17).max(0);
        let file = OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(truncated_len).unwrap();

        let result = wal.read_all().unwrap();
        assert!(result.truncated);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].payload["id"], "bd-a");
    }

    #[test]
    fn truncate_resets_file_and_counter() {
        let dir = TempDir::new().unwrap();
        let mut wal = Wal::at(wal_path(&dir));
        wal.append(OpCode::Insert, &json!({"id": "bd-a"})).unwrap();
        wal.truncate().unwrap();

        let result = wal.read_all().unwrap();
        assert!(result.records.is_empty());

        let seq = wal.append(OpCode::Insert, &json!({"id": "bd-b"})).unwrap();
        assert_eq!(seq, 1);
    }

    #[test]
    fn corrupt_crc_is_treated_as_truncation() {
        let dir = TempDir::new().unwrap();
        let path = wal_path(&dir);
        let mut wal = Wal::at(&path);
        wal.append(OpCode::Insert, &json!({"id": "bd-a"})).unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        std::fs::write(&path, bytes).unwrap();

        let result = wal.read_all().unwrap();
        assert!(result.truncated);
        assert!(result.records.is_empty());
    }
}
