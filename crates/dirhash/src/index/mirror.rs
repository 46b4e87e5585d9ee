use crate::db::InventoryEntry;
use crate::error::{DirhashError, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Append-only, human-readable copy of an inventory.
///
/// Layout: a blank line opens each directory's paragraph, then one
/// `<digest> <path>` line per file. The statistics block goes last.
pub struct MirrorWriter {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl MirrorWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => DirhashError::AlreadyExists(path.to_path_buf()),
                _ => DirhashError::file_io(path, e),
            })?;

        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes one entry, preceded by a paragraph break when a new directory starts,
    /// and flushes before returning.
    pub fn append(&mut self, entry: &InventoryEntry, new_dir: bool) -> Result<()> {
        let path = &self.path;
        let writer = &mut self.writer;
        let result = (|| {
            if new_dir {
                writeln!(writer)?;
            }
            writeln!(writer, "{} {}", entry.digest, entry.path)?;
            writer.flush()
        })();
        result.map_err(|e| DirhashError::file_io(path.as_path(), e))
    }

    /// Appends the closing block and flushes the file to disk.
    pub fn close(mut self, trailer: &str) -> Result<()> {
        let result = (|| {
            writeln!(self.writer)?;
            self.writer.write_all(trailer.as_bytes())?;
            self.writer.flush()?;
            self.writer.get_ref().sync_all()
        })();
        result.map_err(|e| DirhashError::file_io(self.path.as_path(), e))
    }
}
