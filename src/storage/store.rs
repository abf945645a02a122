//! Append-only persistent store with positional block reads

use crate::error::{Error, Result};
use crate::storage::block::{Block, BlockLayout};
use bytes::BytesMut;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

/// Construction parameters for the store, produced by the solver and the
/// outer configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Total expected vector count (N)
    pub total_vectors: usize,
    /// Vectors per common block (P)
    pub vectors_per_block: usize,
    /// Series length per vector slot (L)
    pub series_length: usize,
    /// Directory the storage file is created under
    pub storage_dir: PathBuf,
    /// Run with no file I/O: `add`/`get` become no-ops
    pub disabled: bool,
}

/// The open file channel and its reusable write buffer.
struct StoreFile {
    file: File,
    path: PathBuf,
    write_buf: BytesMut,
}

/// Persists blocks to a single flat binary file as fixed-size records;
/// block `id` lives at byte offset `id * block_size`.
///
/// Single-threaded by design: all writes go through one owned file handle
/// and one scratch buffer, drained before reuse.
pub struct PersistentStore {
    layout: BlockLayout,
    inner: Option<StoreFile>,
    blocks_written: u64,
}

impl PersistentStore {
    /// Open a store under `config.storage_dir` with a timestamp-qualified
    /// file name; the directory is created if absent. In disabled mode no
    /// file is touched.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let layout = BlockLayout::new(
            config.total_vectors,
            config.vectors_per_block,
            config.series_length,
        )?;
        info!(block_size = layout.block_size, "block size computed");
        if config.disabled {
            debug!("store running in disabled mode");
            return Ok(Self {
                layout,
                inner: None,
                blocks_written: 0,
            });
        }
        std::fs::create_dir_all(&config.storage_dir)?;
        let path = config
            .storage_dir
            .join(format!("storage_{}", chrono::Utc::now().timestamp_millis()));
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)?;
        debug!(path = %path.display(), "persistent storage file created");
        Ok(Self {
            layout,
            inner: Some(StoreFile {
                file,
                path,
                write_buf: BytesMut::with_capacity(layout.block_size),
            }),
            blocks_written: 0,
        })
    }

    pub fn layout(&self) -> &BlockLayout {
        &self.layout
    }

    /// Number of blocks appended through this store instance.
    pub fn block_count(&self) -> u64 {
        self.blocks_written
    }

    pub fn path(&self) -> Option<&Path> {
        self.inner.as_ref().map(|f| f.path.as_path())
    }

    /// Append one serialized block at the current end of the file. The store
    /// never rewrites in place.
    pub fn add(&mut self, block: &Block) -> Result<()> {
        let Some(store) = self.inner.as_mut() else {
            return Ok(());
        };
        trace!(id = block.header().id, "writing block");
        self.layout.encode_into(block, &mut store.write_buf);
        store.file.seek(SeekFrom::End(0))?;
        store.file.write_all(&store.write_buf)?;
        store.write_buf.clear();
        self.blocks_written += 1;
        Ok(())
    }

    /// Read the block with the given id from offset `id * block_size`. A read
    /// past the file's current extent is an [`Error::OutOfRange`], never a
    /// zero-filled block. Returns `None` in disabled mode.
    pub fn get(&mut self, id: u64) -> Result<Option<Block>> {
        let Some(store) = self.inner.as_mut() else {
            return Ok(None);
        };
        let offset = id * self.layout.block_size as u64;
        trace!(
            id,
            from = offset,
            to = offset + self.layout.block_size as u64,
            "reading block"
        );
        store.file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; self.layout.block_size];
        match store.file.read_exact(&mut buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(Error::OutOfRange { id, offset });
            }
            Err(e) => return Err(Error::Io(e)),
        }
        Ok(Some(self.layout.decode(&buf)?))
    }

    /// Flush outstanding writes durably and release the file. Safe to call
    /// in disabled mode.
    pub fn close(self) -> Result<()> {
        if let Some(store) = self.inner {
            trace!("closing persistent store");
            store.file.sync_all()?;
        }
        Ok(())
    }
}
