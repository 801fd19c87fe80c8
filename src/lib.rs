//! carrayrs
//!
//! Chunk sizing and streaming ingestion for chunked, compressed arrays.
//!
//! `carrayrs` answers two questions for a chunked columnar store:
//!
//! - how big should a chunk be, given the expected data volume
//! - how to fill a chunked container from a lazy source, one chunk at a
//!   time, without holding the whole dataset in memory
//!
//! The crate intentionally:
//! - does NOT implement a compression codec
//! - does NOT define an on-disk chunk format
//! - does NOT manage concurrency (backends receive a thread count)
//!
//! # Sizing
//!
//! ```
//! use carrayrs::calc_chunk_size;
//!
//! assert_eq!(calc_chunk_size(1e-4)?, 4 * 1024);
//! assert_eq!(calc_chunk_size(1.0)?, 64 * 1024);
//! assert_eq!(calc_chunk_size(1e4)?, 1024 * 1024);
//! # Ok::<(), carrayrs::CArrayError>(())
//! ```
//!
//! # Ingestion
//!
//! ```
//! use carrayrs::{fromiter, ArrayOptions, CompressionParams, Count};
//!
//! let options = ArrayOptions::new(CompressionParams::new(9, true)?);
//! let array = fromiter::<f64, _>((0..100_000).map(f64::from), Count::Unbounded, &options)?;
//!
//! assert_eq!(array.len(), 100_000);
//! assert_eq!(array.get(99_999), Some(99_999.0));
//! # Ok::<(), carrayrs::CArrayError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod carray;
mod chunk;
mod config;
mod dtype;
mod error;
mod ingest;
mod sizing;
mod stats;
mod threads;
mod util;

mod hash; // internal blake3 impl

//
// Public surface
//

pub use carray::{CArray, ChunkedContainer};
pub use chunk::{Chunk, ChunkHash};
pub use config::{
    ArrayOptions, CompressionParams, DEFAULT_CLEVEL, DEFAULT_EXPECTED_LEN, DEFAULT_SHUFFLE,
    HashConfig, MAX_CHUNK_SIZE,
};
pub use dtype::{DType, Element};
pub use error::CArrayError;
pub use ingest::{Count, fromiter, ingest};
pub use sizing::{
    BASE_CHUNK_SIZE, MAX_EXPECTED_SIZE_MB, MAX_ZONE, MIN_EXPECTED_SIZE_MB, MIN_ZONE,
    calc_chunk_size, chunk_size_formula, expected_size_mb, limit_expected_size, size_zone,
};
pub use stats::{MemoryStats, show_stats};
pub use threads::{
    RegistrationId, ThreadAware, ThreadRegistry, deregister, detect_number_of_cores,
    num_threads, register, set_num_threads,
};
pub use util::range_len;
