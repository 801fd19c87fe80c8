//! Configuration for chunked arrays.
//!
//! This module provides types to configure how an array is chunked and
//! compressed:
//!
//! - [`CompressionParams`] - Compression level and byte-shuffle flag
//! - [`ArrayOptions`] - Chunk sizing and compression for a new array
//! - [`HashConfig`] - Specifies whether sealed chunks are fingerprinted
//!
//! # Example
//!
//! ```
//! use carrayrs::{ArrayOptions, CompressionParams, HashConfig};
//!
//! let cparams = CompressionParams::new(9, false)?;
//!
//! let options = ArrayOptions::default()
//!     .with_cparams(cparams)
//!     .with_chunk_size(16 * 1024)
//!     .with_hash_config(HashConfig::disabled());
//! options.validate()?;
//! # Ok::<(), carrayrs::CArrayError>(())
//! ```

use std::fmt;

use crate::error::CArrayError;
use crate::sizing::{calc_chunk_size, expected_size_mb};

/// Default compression level.
pub const DEFAULT_CLEVEL: i32 = 5;

/// Default byte-shuffle flag.
pub const DEFAULT_SHUFFLE: bool = true;

/// Number of items assumed when the caller gives no size estimate.
pub const DEFAULT_EXPECTED_LEN: u64 = 1 << 20;

/// Largest explicit chunk size accepted, in bytes (1 GiB).
pub const MAX_CHUNK_SIZE: usize = 1 << 30;

/// Parameters handed to the compression backend for every chunk.
///
/// Values are validated once at construction and cannot be changed
/// afterwards; build a new instance to use different settings.
///
/// # Example
///
/// ```
/// use carrayrs::CompressionParams;
///
/// let cparams = CompressionParams::new(3, true)?;
/// assert_eq!(cparams.clevel(), 3);
/// assert!(cparams.shuffle());
///
/// assert!(CompressionParams::new(-1, true).is_err());
/// # Ok::<(), carrayrs::CArrayError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompressionParams {
    clevel: i32,
    shuffle: bool,
}

impl CompressionParams {
    /// Creates a new set of compression parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CArrayError::InvalidArgument`] if `clevel` is negative.
    pub fn new(clevel: i32, shuffle: bool) -> Result<Self, CArrayError> {
        if clevel < 0 {
            return Err(CArrayError::invalid("clevel must be a non-negative integer"));
        }

        Ok(Self { clevel, shuffle })
    }

    /// Returns the compression level.
    pub fn clevel(&self) -> i32 {
        self.clevel
    }

    /// Returns whether the byte-shuffle filter is active.
    pub fn shuffle(&self) -> bool {
        self.shuffle
    }
}

impl Default for CompressionParams {
    fn default() -> Self {
        Self {
            clevel: DEFAULT_CLEVEL,
            shuffle: DEFAULT_SHUFFLE,
        }
    }
}

impl fmt::Display for CompressionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CompressionParams(clevel={}, shuffle={})",
            self.clevel, self.shuffle
        )
    }
}

/// Options applied when a chunked array is created.
///
/// If no explicit chunk size is set, the chunk size is derived from the
/// expected number of items via [`calc_chunk_size`].
///
/// # Example
///
/// ```
/// use carrayrs::ArrayOptions;
///
/// // 1 Mi items of 8 bytes = 8 MB, which sizes chunks at 64 KiB.
/// let options = ArrayOptions::default().with_expected_len(1 << 20);
/// assert_eq!(options.resolve_chunk_size(8)?, 64 * 1024);
///
/// // An explicit chunk size wins.
/// let options = options.with_chunk_size(4096);
/// assert_eq!(options.resolve_chunk_size(8)?, 4096);
/// # Ok::<(), carrayrs::CArrayError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ArrayOptions {
    cparams: CompressionParams,
    chunk_size: Option<usize>,
    expected_len: Option<u64>,
    hash_config: HashConfig,
}

impl ArrayOptions {
    /// Creates options with the given compression parameters.
    pub fn new(cparams: CompressionParams) -> Self {
        Self {
            cparams,
            ..Self::default()
        }
    }

    /// Sets the compression parameters.
    pub fn with_cparams(mut self, cparams: CompressionParams) -> Self {
        self.cparams = cparams;
        self
    }

    /// Sets an explicit chunk size in bytes.
    ///
    /// Note: This does not validate the value. Use [`ArrayOptions::validate`]
    /// to check it.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    /// Sets the expected number of items, used to size chunks.
    pub fn with_expected_len(mut self, expected_len: u64) -> Self {
        self.expected_len = Some(expected_len);
        self
    }

    /// Sets the hash configuration.
    pub fn with_hash_config(mut self, config: HashConfig) -> Self {
        self.hash_config = config;
        self
    }

    /// Returns the compression parameters.
    pub fn cparams(&self) -> &CompressionParams {
        &self.cparams
    }

    /// Returns the explicit chunk size, if set.
    pub fn chunk_size(&self) -> Option<usize> {
        self.chunk_size
    }

    /// Returns the expected number of items, if set.
    pub fn expected_len(&self) -> Option<u64> {
        self.expected_len
    }

    /// Returns the hash configuration.
    pub fn hash_config(&self) -> &HashConfig {
        &self.hash_config
    }

    /// Validates the current options.
    ///
    /// Compression parameters are checked when they are built, so only the
    /// explicit chunk size is checked here.
    pub fn validate(&self) -> Result<(), CArrayError> {
        match self.chunk_size {
            Some(0) => Err(CArrayError::invalid("chunk size must be non-zero")),
            Some(size) if size > MAX_CHUNK_SIZE => {
                Err(CArrayError::invalid("chunk size exceeds MAX_CHUNK_SIZE"))
            }
            _ => Ok(()),
        }
    }

    /// Returns the chunk size in bytes for items of `item_size` bytes.
    pub fn resolve_chunk_size(&self, item_size: usize) -> Result<usize, CArrayError> {
        self.validate()?;
        match self.chunk_size {
            Some(size) => Ok(size),
            None => {
                let nitems = self.expected_len.unwrap_or(DEFAULT_EXPECTED_LEN);
                calc_chunk_size(expected_size_mb(nitems, item_size))
            }
        }
    }
}

/// Configuration for chunk fingerprinting.
///
/// Controls whether a BLAKE3 hash is computed for each sealed chunk. Hashing
/// is off by default and only takes effect with the `hash-blake3` feature.
///
/// # Example
///
/// ```
/// use carrayrs::HashConfig;
///
/// let config = HashConfig::enabled();
/// assert!(config.enabled);
///
/// let config = HashConfig::disabled();
/// assert!(!config.enabled);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashConfig {
    /// Whether to compute BLAKE3 hashes for sealed chunks.
    pub enabled: bool,
}

impl HashConfig {
    /// Creates a new hash configuration.
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Enables hashing.
    pub const fn enabled() -> Self {
        Self { enabled: true }
    }

    /// Disables hashing.
    pub const fn disabled() -> Self {
        Self { enabled: false }
    }
}

impl Default for HashConfig {
    fn default() -> Self {
        Self::disabled()
    }
}
