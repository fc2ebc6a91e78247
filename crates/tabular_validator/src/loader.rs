//! Byte stream providers and the byte-level read pipeline.
//!
//! A [`Loader`] opens a raw byte stream for a scheme. The stream is then
//! wrapped by [`HashingReader`] (md5, sha256 and byte count of the raw bytes)
//! and unwrapped by [`decompress`] when the source is compressed.

use crate::{ErrorCode, Result, TableError};
use flate2::read::MultiGzDecoder;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// A readable, sendable byte stream.
pub type ByteStream = Box<dyn Read + Send>;

/// Where the bytes of a resource live.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Path(PathBuf),
    Buffer(Arc<[u8]>),
}

/// Opens byte streams for one scheme.
pub trait Loader: Send + Sync + fmt::Debug {
    fn open(&self, source: &Source) -> Result<ByteStream>;
}

/// Local files.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl Loader for FileLoader {
    fn open(&self, source: &Source) -> Result<ByteStream> {
        let Source::Path(path) = source else {
            return Err(TableError::scheme("scheme \"file\" requires a path"));
        };
        debug!("Opening file {}", path.display());
        let file = File::open(path)
            .map_err(|error| TableError::scheme(format!("{error}: {}", path.display())))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// In-memory bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct BufferLoader;

impl Loader for BufferLoader {
    fn open(&self, source: &Source) -> Result<ByteStream> {
        let Source::Buffer(bytes) = source else {
            return Err(TableError::scheme("scheme \"buffer\" requires in-memory bytes"));
        };
        Ok(Box::new(Cursor::new(Arc::clone(bytes))))
    }
}

/// Byte statistics of a consumed stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteStats {
    pub bytes: u64,
    pub md5: Option<String>,
    pub sha256: Option<String>,
}

struct CounterState {
    bytes: u64,
    md5: Option<md5::Context>,
    sha256: Option<Sha256>,
    finished: Option<ByteStats>,
}

/// Running byte count and digests shared between the reading pipeline and
/// the table that reports them.
#[derive(Clone)]
pub struct ByteCounter {
    state: Arc<Mutex<CounterState>>,
}

impl fmt::Debug for ByteCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteCounter")
            .field("bytes", &self.bytes())
            .finish()
    }
}

impl Default for ByteCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteCounter {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(CounterState {
                bytes: 0,
                md5: Some(md5::Context::new()),
                sha256: Some(Sha256::new()),
                finished: None,
            })),
        }
    }

    fn update(&self, chunk: &[u8]) {
        if let Ok(mut state) = self.state.lock() {
            if state.finished.is_some() {
                return;
            }
            state.bytes += chunk.len() as u64;
            if let Some(md5) = state.md5.as_mut() {
                md5.consume(chunk);
            }
            if let Some(sha256) = state.sha256.as_mut() {
                sha256.update(chunk);
            }
        }
    }

    /// Bytes read so far.
    pub fn bytes(&self) -> u64 {
        self.state.lock().map(|state| state.bytes).unwrap_or_default()
    }

    /// Finalizes the digests. Idempotent; bytes read afterwards are ignored.
    pub fn finish(&self) -> ByteStats {
        let Ok(mut state) = self.state.lock() else {
            return ByteStats::default();
        };
        if let Some(stats) = &state.finished {
            return stats.clone();
        }
        let stats = ByteStats {
            bytes: state.bytes,
            md5: state.md5.take().map(|md5| format!("{:x}", md5.finalize())),
            sha256: state.sha256.take().map(|sha256| hex::encode(sha256.finalize())),
        };
        state.finished = Some(stats.clone());
        stats
    }

    /// Statistics once finished, the running byte count otherwise.
    pub fn snapshot(&self) -> ByteStats {
        let Ok(state) = self.state.lock() else {
            return ByteStats::default();
        };
        match &state.finished {
            Some(stats) => stats.clone(),
            None => ByteStats {
                bytes: state.bytes,
                ..Default::default()
            },
        }
    }
}

/// Counts and hashes every byte read through it.
pub struct HashingReader<R> {
    inner: R,
    counter: ByteCounter,
}

impl<R: Read> HashingReader<R> {
    pub fn new(inner: R, counter: ByteCounter) -> Self {
        Self { inner, counter }
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let count = self.inner.read(buf)?;
        self.counter.update(&buf[..count]);
        Ok(count)
    }
}

/// Turns plain I/O failures of a pipeline stage into errors of that stage.
/// Errors raised by earlier stages pass through unchanged.
pub struct StageReader<R> {
    inner: R,
    code: ErrorCode,
}

impl<R: Read> StageReader<R> {
    pub fn new(inner: R, code: ErrorCode) -> Self {
        Self { inner, code }
    }
}

impl<R: Read> Read for StageReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner
            .read(buf)
            .map_err(|error| TableError::from_io(error, self.code).into_io())
    }
}

/// Unwraps a compressed stream. Gzip is streamed; zip archives are spooled
/// to a temporary file and the selected member is extracted to another one.
pub fn decompress(
    stream: ByteStream,
    compression: Option<&str>,
    innerpath: Option<&str>,
) -> Result<ByteStream> {
    match compression {
        None | Some("") | Some("no") => Ok(stream),
        Some("gz") | Some("gzip") => {
            debug!("Streaming gzip data");
            Ok(Box::new(StageReader::new(
                MultiGzDecoder::new(stream),
                ErrorCode::CompressionError,
            )))
        }
        Some("zip") => unzip(stream, innerpath),
        Some(other) => Err(TableError::compression(format!(
            "compression \"{other}\" is not supported"
        ))),
    }
}

fn unzip(mut stream: ByteStream, innerpath: Option<&str>) -> Result<ByteStream> {
    let mut spool = tempfile::tempfile()
        .map_err(|error| TableError::compression(format!("cannot create a spool file: {error}")))?;
    io::copy(&mut stream, &mut spool)
        .map_err(|error| TableError::from_io(error, ErrorCode::SchemeError))?;
    spool
        .seek(SeekFrom::Start(0))
        .map_err(|error| TableError::compression(error.to_string()))?;

    let mut archive =
        zip::ZipArchive::new(spool).map_err(|error| TableError::compression(error.to_string()))?;
    let index = match innerpath {
        Some(name) => archive.index_for_name(name).ok_or_else(|| {
            TableError::compression(format!("innerpath \"{name}\" is not in the archive"))
        })?,
        None => first_file(&mut archive)?,
    };

    let mut member = archive
        .by_index(index)
        .map_err(|error| TableError::compression(error.to_string()))?;
    debug!("Extracting zip member {}", member.name());
    let mut extracted = tempfile::tempfile()
        .map_err(|error| TableError::compression(format!("cannot create a spool file: {error}")))?;
    io::copy(&mut member, &mut extracted)
        .map_err(|error| TableError::compression(error.to_string()))?;
    extracted
        .seek(SeekFrom::Start(0))
        .map_err(|error| TableError::compression(error.to_string()))?;
    Ok(Box::new(BufReader::new(extracted)))
}

fn first_file(archive: &mut zip::ZipArchive<File>) -> Result<usize> {
    for index in 0..archive.len() {
        let member = archive
            .by_index(index)
            .map_err(|error| TableError::compression(error.to_string()))?;
        if !member.is_dir() {
            return Ok(index);
        }
    }
    Err(TableError::compression("the archive has no files"))
}

/// Reads up to `size` bytes without losing them: the prefix is returned
/// together with a stream replaying it before the rest.
pub fn buffer_prefix(mut stream: ByteStream, size: usize) -> Result<(Vec<u8>, ByteStream)> {
    let mut buffer = Vec::with_capacity(size.min(1 << 20));
    (&mut stream)
        .take(size as u64)
        .read_to_end(&mut buffer)
        .map_err(|error| TableError::from_io(error, ErrorCode::SchemeError))?;
    let replay = Cursor::new(buffer.clone()).chain(stream);
    Ok((buffer, Box::new(replay)))
}
