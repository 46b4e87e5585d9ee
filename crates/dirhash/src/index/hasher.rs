use crate::error::{DirhashError, Result};
use crate::index::CancelToken;
use serde::{Deserialize, Serialize};
use sha2::digest::DynDigest;
use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::str::FromStr;

/// Read size for streaming digests; memory use stays flat regardless of file size.
pub const DEFAULT_BUFFER_SIZE: usize = 1 << 20;

/// The closed set of digest algorithms an inventory can be built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl Algorithm {
    pub const ALL: [Algorithm; 6] = [
        Algorithm::Md5,
        Algorithm::Sha1,
        Algorithm::Sha224,
        Algorithm::Sha256,
        Algorithm::Sha384,
        Algorithm::Sha512,
    ];

    /// Lowercase name; doubles as the digest column name in the inventory store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Md5 => "md5",
            Algorithm::Sha1 => "sha1",
            Algorithm::Sha224 => "sha224",
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha384 => "sha384",
            Algorithm::Sha512 => "sha512",
        }
    }

    /// Length of the hex digest in characters.
    pub fn hex_len(&self) -> usize {
        match self {
            Algorithm::Md5 => 32,
            Algorithm::Sha1 => 40,
            Algorithm::Sha224 => 56,
            Algorithm::Sha256 => 64,
            Algorithm::Sha384 => 96,
            Algorithm::Sha512 => 128,
        }
    }

    fn new_hasher(&self) -> Box<dyn DynDigest> {
        match self {
            Algorithm::Md5 => Box::new(md5::Md5::default()),
            Algorithm::Sha1 => Box::new(sha1::Sha1::default()),
            Algorithm::Sha224 => Box::new(sha2::Sha224::default()),
            Algorithm::Sha256 => Box::new(sha2::Sha256::default()),
            Algorithm::Sha384 => Box::new(sha2::Sha384::default()),
            Algorithm::Sha512 => Box::new(sha2::Sha512::default()),
        }
    }
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::Sha256
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = DirhashError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        Algorithm::ALL
            .into_iter()
            .find(|alg| alg.as_str() == lowered)
            .ok_or_else(|| DirhashError::UnsupportedAlgorithm(s.to_string()))
    }
}

/// Digest of one stream plus the number of bytes fed into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashOutput {
    pub digest: String,
    pub bytes: u64,
}

/// Streams content through a fixed algorithm.
///
/// The engine is configured once per run. If a [`CancelToken`] is attached it is
/// checked between chunks, so a large file does not delay an interrupt until it
/// has been read in full.
#[derive(Debug, Clone)]
pub struct HashEngine {
    algorithm: Algorithm,
    buffer_size: usize,
    cancel: Option<CancelToken>,
}

impl HashEngine {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            buffer_size: DEFAULT_BUFFER_SIZE,
            cancel: None,
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Hashes a reader to completion. No digest is returned if any read fails.
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> Result<HashOutput> {
        let mut hasher = self.algorithm.new_hasher();
        let mut buffer = vec![0u8; self.buffer_size];
        let mut bytes = 0u64;

        loop {
            if self.is_cancelled() {
                return Err(DirhashError::Cancelled);
            }

            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            hasher.update(&buffer[..bytes_read]);
            bytes += bytes_read as u64;
        }

        Ok(HashOutput {
            digest: hex::encode(hasher.finalize()),
            bytes,
        })
    }

    pub fn digest_file<P: AsRef<Path>>(&self, path: P) -> Result<HashOutput> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            log::debug!("Failed to open file for hashing: {}: {}", path.display(), e);
            DirhashError::file_io(path, e)
        })?;

        self.digest_reader(file).map_err(|e| match e {
            DirhashError::Io(source) => DirhashError::file_io(path, source),
            other => other,
        })
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map_or(false, CancelToken::is_cancelled)
    }
}
