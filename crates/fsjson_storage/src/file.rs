//! Reader-backed byte sources for files and pipes.

use crate::error::{StorageError, StorageResult};
use crate::source::ByteSource;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Buffer size for [`FileSource`]; two log blocks per refill.
const FILE_BUFFER_SIZE: usize = 64 * 1024;

/// A byte source over any [`Read`] implementation.
///
/// `read(n)` keeps pulling from the inner reader until `n` bytes are
/// collected or the reader reports end-of-file, so a short return always
/// means the stream is exhausted.
#[derive(Debug)]
pub struct IoSource<R> {
    inner: R,
    pos: u64,
}

impl<R: Read + Send> IoSource<R> {
    /// Wraps a reader positioned at stream offset zero.
    pub fn new(inner: R) -> Self {
        Self { inner, pos: 0 }
    }

    /// Consumes the source and returns the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Send> ByteSource for IoSource<R> {
    fn read(&mut self, n: usize) -> StorageResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(n.min(FILE_BUFFER_SIZE));
        // `take` + `read_to_end` retries on `Interrupted` and stops at EOF.
        let read = (&mut self.inner).take(n as u64).read_to_end(&mut buf)?;
        self.pos += read as u64;
        Ok(buf)
    }

    fn tell(&self) -> u64 {
        self.pos
    }
}

/// A buffered byte source over a file on disk.
///
/// # Example
///
/// ```no_run
/// use fsjson_storage::{ByteSource, FileSource};
/// use std::path::Path;
///
/// let mut source = FileSource::open(Path::new("output-0")).unwrap();
/// let header = source.read(7).unwrap();
/// ```
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    inner: IoSource<BufReader<File>>,
}

impl FileSource {
    /// Opens a file for sequential reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not a regular file or cannot be opened.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(StorageError::NotAFile {
                path: path.to_path_buf(),
            });
        }

        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            inner: IoSource::new(BufReader::with_capacity(FILE_BUFFER_SIZE, file)),
        })
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn read(&mut self, n: usize) -> StorageResult<Vec<u8>> {
        self.inner.read(n)
    }

    fn tell(&self) -> u64 {
        self.inner.tell()
    }
}
