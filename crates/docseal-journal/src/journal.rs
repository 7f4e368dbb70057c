use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{JournalError, Result};

/// When appended records reach stable storage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// `sync_all` before `append` returns.
    EveryWrite,
    /// Flush to the OS and let it decide.
    #[default]
    OsDefault,
}

/// Configuration for a [`Journal`].
#[derive(Clone, Debug, Default)]
pub struct JournalConfig {
    pub sync_mode: SyncMode,
}

/// Frame header: little-endian payload length, then its CRC32.
const FRAME_HEADER_LEN: usize = 8;

struct JournalWriter {
    writer: BufWriter<File>,
    /// End of the last complete frame.
    offset: u64,
}

/// Crash-recoverable, append-only record log.
///
/// Each record is one frame:
/// ```text
/// | len: u32 LE | crc32(payload): u32 LE | payload: bincode(T) |
/// ```
///
/// On recovery the file is read front-to-back; records that fail the CRC
/// check are skipped and a torn tail ends recovery.
pub struct Journal<T> {
    path: PathBuf,
    writer: Mutex<JournalWriter>,
    config: JournalConfig,
    _record: PhantomData<fn() -> T>,
}

impl<T> Journal<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Open (or create) a journal segment at the given path.
    pub fn open(path: &Path, config: JournalConfig) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        discard_torn_tail(path)?;
        let (writer, offset) = open_append(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(JournalWriter { writer, offset }),
            config,
            _record: PhantomData,
        })
    }

    /// Append a single record. Returns the byte offset it was written at.
    pub fn append(&self, record: &T) -> Result<u64> {
        let frame = encode_frame(record)?;

        let mut w = self.lock()?;
        let record_offset = w.offset;
        if let Err(e) = self.write_frame(&mut w, &frame) {
            warn!(offset = record_offset, error = %e, "journal append failed; rolling back");
            self.roll_back(&mut w)?;
            return Err(e);
        }
        w.offset += frame.len() as u64;

        debug!(offset = record_offset, len = frame.len(), "journal append");
        Ok(record_offset)
    }

    /// Recover all valid records from the segment.
    pub fn recover(&self) -> Result<Vec<T>> {
        let _guard = self.lock()?;
        let mut data = Vec::new();
        BufReader::new(File::open(&self.path)?).read_to_end(&mut data)?;

        let mut records = Vec::new();
        let end = scan_frames(&data, |offset, payload| match payload {
            Some(payload) => match bincode::deserialize::<T>(payload) {
                Ok(record) => records.push(record),
                Err(e) => warn!(offset, error = %e, "undecodable journal record; skipping"),
            },
            None => warn!(offset, "CRC mismatch; skipping journal record"),
        });
        if end < data.len() {
            warn!(end, file_len = data.len(), "torn journal tail; stopping recovery");
        }

        debug!(recovered = records.len(), "journal recovery complete");
        Ok(records)
    }

    /// Replace the whole segment with the given records.
    ///
    /// The new segment is written to a temporary file beside the journal and
    /// renamed over it, so readers observe either the old or the new segment.
    pub fn rewrite(&self, records: &[T]) -> Result<()> {
        let mut w = self.lock()?;
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut out = BufWriter::new(tmp.as_file_mut());
            for record in records {
                out.write_all(&encode_frame(record)?)?;
            }
            out.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| JournalError::Io(e.error))?;

        let (writer, offset) = open_append(&self.path)?;
        w.writer = writer;
        w.offset = offset;

        debug!(records = records.len(), offset, "journal rewritten");
        Ok(())
    }

    /// Remove every record.
    pub fn truncate(&self) -> Result<()> {
        let mut w = self.lock()?;
        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        drop(file);
        let (writer, offset) = open_append(&self.path)?;
        w.writer = writer;
        w.offset = offset;

        debug!("journal truncated");
        Ok(())
    }

    /// Byte length of the segment as written so far.
    pub fn offset(&self) -> Result<u64> {
        Ok(self.lock()?.offset)
    }

    /// Path to the segment file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_frame(&self, w: &mut JournalWriter, frame: &[u8]) -> Result<()> {
        w.writer.write_all(frame)?;
        w.writer.flush()?;
        if self.config.sync_mode == SyncMode::EveryWrite {
            w.writer.get_ref().sync_all()?;
        }
        Ok(())
    }

    /// Drop whatever a failed append left behind, in the buffer or in the
    /// file, so the segment ends at `w.offset` again.
    fn roll_back(&self, w: &mut JournalWriter) -> Result<()> {
        let (fresh, _) = open_append(&self.path)?;
        let failed = std::mem::replace(&mut w.writer, fresh);
        let (_file, _unwritten) = failed.into_parts();

        let file = w.writer.get_ref();
        if file.metadata()?.len() > w.offset {
            file.set_len(w.offset)?;
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, JournalWriter>> {
        self.writer.lock().map_err(|_| JournalError::Poisoned)
    }
}

fn open_append(path: &Path) -> io::Result<(BufWriter<File>, u64)> {
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)?;
    let offset = file.metadata()?.len();
    Ok((BufWriter::new(file), offset))
}

/// Walk the frames of a segment, handing each one's offset to `visit` with
/// its payload (`None` when the CRC does not match). Returns the end of the
/// last complete frame; anything after it is a torn tail.
fn scan_frames<'a>(data: &'a [u8], mut visit: impl FnMut(usize, Option<&'a [u8]>)) -> usize {
    let mut offset = 0usize;
    while offset + FRAME_HEADER_LEN <= data.len() {
        let header = &data[offset..offset + FRAME_HEADER_LEN];
        let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        let start = offset + FRAME_HEADER_LEN;
        if length == 0 || start + length > data.len() {
            break;
        }
        let payload = &data[start..start + length];
        if crc32fast::hash(payload) == expected_crc {
            visit(offset, Some(payload));
        } else {
            visit(offset, None);
        }
        offset = start + length;
    }
    offset
}

/// Cut a segment back to its last complete frame so new appends are
/// readable on the next recovery.
fn discard_torn_tail(path: &Path) -> Result<()> {
    let len = match fs::metadata(path) {
        Ok(meta) if meta.is_file() => meta.len(),
        Ok(_) => return Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    let data = fs::read(path)?;
    let valid = scan_frames(&data, |_, _| {}) as u64;
    if valid < len {
        warn!(path = %path.display(), valid, file_len = len, "discarding torn journal tail");
        let file = OpenOptions::new().write(true).open(path)?;
        file.set_len(valid)?;
        file.sync_all()?;
    }
    Ok(())
}

fn encode_frame<T: Serialize>(record: &T) -> Result<Vec<u8>> {
    let payload =
        bincode::serialize(record).map_err(|e| JournalError::Serialization(e.to_string()))?;
    let length =
        u32::try_from(payload.len()).map_err(|_| JournalError::RecordTooLarge(payload.len()))?;
    let crc = crc32fast::hash(&payload);

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    frame.extend_from_slice(&length.to_le_bytes());
    frame.extend_from_slice(&crc.to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}
