//! Admin-side reassembly of `file_chunk` streams.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::PathBuf;

use remotefm_protocol::{BufferedTransfer, Chunk, ChunkOutcome, TransferError};
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("{source}; partial data saved to {}", partial.display())]
    Incomplete {
        source: TransferError,
        partial: PathBuf,
    },

    #[error("failed to save download: {0}")]
    Io(#[from] io::Error),
}

/// A finished download written into the download directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub key: String,
    pub path: PathBuf,
    pub bytes: u64,
}

/// What one chunk did to its download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accepted {
    Progress { received: u64, total: Option<u64> },
    Saved(SavedFile),
    /// The chunk belongs to a download that already failed.
    Ignored,
}

/// A download is identified by the sending device and its transfer key.
type DownloadId = (String, String);

/// Buffers in-flight downloads per device and transfer key, and writes each
/// completed one to `<download_dir>/<last path component of the key>`.
#[derive(Debug)]
pub struct DownloadAssembler {
    dir: PathBuf,
    transfers: HashMap<DownloadId, BufferedTransfer>,
    failed: HashSet<DownloadId>,
}

impl DownloadAssembler {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            transfers: HashMap::new(),
            failed: HashSet::new(),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.transfers.len()
    }

    /// Drop every unfinished download.
    pub fn clear(&mut self) {
        if !self.transfers.is_empty() {
            warn!(count = self.transfers.len(), "Discarding unfinished downloads");
        }
        self.transfers.clear();
        self.failed.clear();
    }

    /// Feed one `file_chunk` sent by `device`. An offset-0 chunk (re)starts
    /// the download of its key; after a failure, later chunks of that key
    /// are ignored until the next offset-0 chunk.
    pub async fn accept(
        &mut self,
        device: &str,
        key: &str,
        offset: u64,
        data: &str,
        is_last: bool,
        total_size: u64,
    ) -> Result<Accepted, DownloadError> {
        let id = (device.to_string(), key.to_string());
        if offset == 0 {
            self.failed.remove(&id);
            if self.transfers.insert(id.clone(), BufferedTransfer::new(key)).is_some() {
                debug!(device = %device, key = %key, "Download restarted");
            }
        } else if self.failed.contains(&id) {
            if is_last {
                self.failed.remove(&id);
            }
            return Ok(Accepted::Ignored);
        }

        match self.push(&id, offset, data, is_last, total_size) {
            Ok(ChunkOutcome::Progress { received, total }) => {
                Ok(Accepted::Progress { received, total })
            }
            Ok(ChunkOutcome::Complete { received }) => {
                let bytes = self
                    .transfers
                    .remove(&id)
                    .map(BufferedTransfer::into_bytes)
                    .unwrap_or_default();
                let path = self.save(key, &bytes, false).await?;
                info!(key = %key, path = %path.display(), bytes = received, "Download saved");
                Ok(Accepted::Saved(SavedFile {
                    key: key.to_string(),
                    path,
                    bytes: received,
                }))
            }
            Err(e) => {
                let transfer = self.transfers.remove(&id);
                if !is_last {
                    self.failed.insert(id);
                }
                match (e, transfer) {
                    (e @ TransferError::SizeMismatch { .. }, Some(transfer)) => {
                        let partial = self.save(key, &transfer.into_bytes(), true).await?;
                        Err(DownloadError::Incomplete { source: e, partial })
                    }
                    (e, _) => Err(e.into()),
                }
            }
        }
    }

    fn push(
        &mut self,
        id: &DownloadId,
        offset: u64,
        data: &str,
        is_last: bool,
        total_size: u64,
    ) -> Result<ChunkOutcome, TransferError> {
        let chunk = Chunk::from_wire(offset, data, is_last, Some(total_size))?;
        let transfer = self
            .transfers
            .get_mut(id)
            .ok_or_else(|| TransferError::OffsetMismatch {
                key: id.1.clone(),
                expected: 0,
                got: offset,
            })?;
        transfer.push(chunk)
    }

    async fn save(&self, key: &str, bytes: &[u8], partial: bool) -> io::Result<PathBuf> {
        let mut name = file_name_of(key);
        if partial {
            name.push_str(".partial");
        }
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(name);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }
}

/// Last component of a remote path, whichever separator the device uses.
fn file_name_of(key: &str) -> String {
    key.rsplit(['/', '\\'])
        .find(|part| !part.is_empty() && *part != "." && *part != "..")
        .unwrap_or("download")
        .to_string()
}

#[cfg(test)]
mod tests {
    use remotefm_protocol::Message;

    use super::*;

    fn wire(bytes: &[u8], chunk_size: usize) -> Vec<(u64, String, bool, u64)> {
        let total = bytes.len() as u64;
        let mut out = Vec::new();
        let mut offset = 0usize;
        loop {
            let end = (offset + chunk_size).min(bytes.len());
            let chunk = Chunk {
                offset: offset as u64,
                data: bytes[offset..end].to_vec(),
                is_last: end as u64 >= total,
                total_size: Some(total),
            };
            let Message::FileChunk {
                offset: at,
                data,
                is_last,
                total_size,
                ..
            } = chunk.into_file_chunk("k")
            else {
                unreachable!();
            };
            out.push((at, data, is_last, total_size));
            if is_last {
                return out;
            }
            offset = end;
        }
    }

    #[test]
    fn file_names_come_from_the_last_component() {
        assert_eq!(file_name_of("/sdcard/DCIM/cat.jpg"), "cat.jpg");
        assert_eq!(file_name_of("C:\\Users\\me\\notes.txt"), "notes.txt");
        assert_eq!(file_name_of("/sdcard/Music/"), "Music");
        assert_eq!(file_name_of("/sdcard/.."), "sdcard");
        assert_eq!(file_name_of(""), "download");
    }

    #[tokio::test]
    async fn completed_download_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut assembler = DownloadAssembler::new(dir.path().join("dl"));
        let bytes: Vec<u8> = (0..100u8).collect();

        let mut last = None;
        for (offset, data, is_last, total) in wire(&bytes, 30) {
            last = Some(
                assembler
                    .accept("dev", "/sdcard/a.bin", offset, &data, is_last, total)
                    .await
                    .unwrap(),
            );
        }
        let Some(Accepted::Saved(saved)) = last else {
            panic!("expected saved file");
        };
        assert_eq!(saved.bytes, 100);
        assert_eq!(saved.path, dir.path().join("dl").join("a.bin"));
        assert_eq!(std::fs::read(&saved.path).unwrap(), bytes);
        assert_eq!(assembler.in_flight(), 0);
    }

    #[tokio::test]
    async fn gap_fails_once_then_ignores_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let mut assembler = DownloadAssembler::new(dir.path());
        let chunks = wire(&[1u8; 100], 25);

        let (o, d, l, t) = &chunks[0];
        assembler.accept("dev", "k", *o, d, *l, *t).await.unwrap();
        let (o, d, l, t) = &chunks[2];
        let err = assembler.accept("dev", "k", *o, d, *l, *t).await.unwrap_err();
        assert!(matches!(
            err,
            DownloadError::Transfer(TransferError::OffsetMismatch { expected: 25, got: 50, .. })
        ));
        let (o, d, l, t) = &chunks[3];
        assert_eq!(
            assembler.accept("dev", "k", *o, d, *l, *t).await.unwrap(),
            Accepted::Ignored
        );
        assert_eq!(assembler.in_flight(), 0);
        assert!(!dir.path().join("k").exists());
    }

    #[tokio::test]
    async fn premature_end_keeps_partial_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut assembler = DownloadAssembler::new(dir.path());
        let (offset, data, _, total) = wire(&[9u8; 80], 40).remove(0);

        let err = assembler
            .accept("dev", "/x/video.mp4", offset, &data, true, total)
            .await
            .unwrap_err();
        let DownloadError::Incomplete { partial, .. } = err else {
            panic!("expected incomplete");
        };
        assert_eq!(partial, dir.path().join("video.mp4.partial"));
        assert_eq!(std::fs::read(&partial).unwrap(), vec![9u8; 40]);
    }

    #[tokio::test]
    async fn offset_zero_restarts_a_download() {
        let dir = tempfile::tempdir().unwrap();
        let mut assembler = DownloadAssembler::new(dir.path());
        let old = wire(&[1u8; 60], 20);
        let (o, d, l, t) = &old[0];
        assembler.accept("dev", "f", *o, d, *l, *t).await.unwrap();

        let mut last = None;
        for (o, d, l, t) in wire(&[2u8; 10], 20) {
            last = Some(assembler.accept("dev", "f", o, &d, l, t).await.unwrap());
        }
        assert!(matches!(last, Some(Accepted::Saved(_))));
        assert_eq!(std::fs::read(dir.path().join("f")).unwrap(), vec![2u8; 10]);
    }

    #[tokio::test]
    async fn chunk_without_start_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut assembler = DownloadAssembler::new(dir.path());
        let chunks = wire(&[0u8; 40], 20);
        let (o, d, l, t) = &chunks[1];
        assert!(assembler.accept("dev", "orphan", *o, d, *l, *t).await.is_err());
    }

    #[tokio::test]
    async fn same_key_from_two_devices_does_not_mix() {
        let dir = tempfile::tempdir().unwrap();
        let mut assembler = DownloadAssembler::new(dir.path());
        let a = wire(&[1u8; 40], 20);
        let b = wire(&[2u8; 40], 20);

        let (o, d, l, t) = &a[0];
        assembler.accept("phone-a", "/sdcard/x", *o, d, *l, *t).await.unwrap();
        let (o, d, l, t) = &b[0];
        assembler.accept("phone-b", "/sdcard/x", *o, d, *l, *t).await.unwrap();
        assert_eq!(assembler.in_flight(), 2);

        let (o, d, l, t) = &a[1];
        let Accepted::Saved(saved) = assembler
            .accept("phone-a", "/sdcard/x", *o, d, *l, *t)
            .await
            .unwrap()
        else {
            panic!("expected phone-a to finish");
        };
        assert_eq!(std::fs::read(&saved.path).unwrap(), vec![1u8; 40]);

        // Same file name on disk; the later download overwrites it whole.
        let (o, d, l, t) = &b[1];
        let Accepted::Saved(_) = assembler
            .accept("phone-b", "/sdcard/x", *o, d, *l, *t)
            .await
            .unwrap()
        else {
            panic!("expected phone-b to finish");
        };
        assert_eq!(std::fs::read(&saved.path).unwrap(), vec![2u8; 40]);
        assert_eq!(assembler.in_flight(), 0);
    }
}
