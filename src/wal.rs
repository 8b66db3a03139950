//! Append-only operation log backing a persistent `Database`.
//!
//! Each record is a little-endian `u32` length followed by a bincode frame. Document bodies
//! travel inside the frame as JSON bytes so the log stays readable with ordinary tooling.

use crate::errors::DbError;
use crate::types::{CollectionName, DocumentId};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalRecord {
    pub op: OpKind,
    pub collection: CollectionName,
    pub id: DocumentId,
    pub value_json: Option<Vec<u8>>,
    pub ts_millis: i64,
}

/// Largest frame accepted in either direction.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

pub fn write_record<W: Write>(writer: &mut W, rec: &WalRecord) -> Result<(), DbError> {
    let bytes = bincode::serde::encode_to_vec(rec, bincode::config::standard())?;
    let len = u32::try_from(bytes.len())
        .ok()
        .filter(|_| bytes.len() <= MAX_FRAME_LEN)
        .ok_or_else(|| DbError::WalError(format!("record too large: {} bytes", bytes.len())))?;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&bytes)?;
    Ok(())
}

/// Reads the next record. `Ok(None)` at a clean end of file or on a torn trailing write.
pub fn read_record<R: Read>(reader: &mut R) -> Result<Option<WalRecord>, DbError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = usize::try_from(u32::from_le_bytes(len_buf))
        .map_err(|_| DbError::WalError("record length overflows usize".into()))?;
    if len > MAX_FRAME_LEN {
        return Err(DbError::WalError(format!("corrupt record length: {len} bytes")));
    }
    let mut buf = vec![0u8; len];
    match reader.read_exact(&mut buf) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            log::warn!("operation log ends with a truncated record ({len} bytes expected)");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    }
    let (rec, _) = bincode::serde::decode_from_slice(&buf, bincode::config::standard())?;
    Ok(Some(rec))
}

pub struct Wal {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl std::fmt::Debug for Wal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wal").field("path", &self.path).finish()
    }
}

impl Wal {
    /// Opens (or creates) the log at `path` and returns it together with every record already
    /// present, in write order.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<(Self, Vec<WalRecord>), DbError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).read(true).append(true).open(&path)?;
        let mut records = Vec::new();
        {
            let mut reader = BufReader::new(File::open(&path)?);
            while let Some(rec) = read_record(&mut reader)? {
                records.push(rec);
            }
        }
        log::info!("operation log {} replayed: {} records", path.display(), records.len());
        Ok((Self { path, writer: BufWriter::new(file) }, records))
    }

    /// Appends and flushes one record; the caller applies the change only after this succeeds.
    pub fn append(&mut self, rec: &WalRecord) -> Result<(), DbError> {
        write_record(&mut self.writer, rec)?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), DbError> {
        self.writer.flush()?;
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
