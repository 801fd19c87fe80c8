//! In-memory chunked array.
//!
//! [`CArray`] accumulates appended items in a leftover buffer and seals a
//! [`Chunk`] every time the buffer reaches `chunk_len` items. Sealed chunks
//! are immutable; only the leftover tail grows.
//!
//! # Example
//!
//! ```
//! use carrayrs::{ArrayOptions, CArray};
//!
//! let options = ArrayOptions::default().with_chunk_size(32);
//! let mut array = CArray::<u64>::new(&options)?;
//!
//! array.append(&[1, 2, 3, 4, 5]);
//! array.append(&[6]);
//!
//! // 32 bytes hold 4 u64 items, so one chunk is sealed.
//! assert_eq!(array.chunk_len(), 4);
//! assert_eq!(array.nchunks(), 1);
//! assert_eq!(array.leftover(), &[5, 6]);
//! assert_eq!(array.get(4), Some(5));
//! # Ok::<(), carrayrs::CArrayError>(())
//! ```

use std::fmt;

use bytes::Bytes;
use tracing::trace;

use crate::chunk::{Chunk, ChunkHash};
use crate::config::{ArrayOptions, CompressionParams, HashConfig};
use crate::dtype::{DType, Element};
use crate::error::CArrayError;

#[cfg(feature = "hash-blake3")]
use crate::hash::Blake3Hasher;

/// Upper bound on chunk slots reserved ahead of time by [`CArray::reserve`].
const MAX_RESERVED_CHUNKS: usize = 4096;

/// A chunked array of fixed-width elements.
///
/// # Memory Considerations
///
/// - The leftover buffer grows on demand, up to `chunk_len` items
/// - Sealed chunks hold the encoded bytes handed to the compression backend
#[derive(Debug)]
pub struct CArray<E: Element> {
    chunks: Vec<Chunk>,
    leftover: Vec<E>,
    chunk_size: usize,
    chunk_len: usize,
    len: u64,
    cparams: CompressionParams,
    hash_config: HashConfig,
    #[cfg(feature = "hash-blake3")]
    hasher: Blake3Hasher,
}

impl<E: Element> CArray<E> {
    /// Creates an empty array.
    ///
    /// The chunk size comes from `options`: the explicit chunk size if set,
    /// otherwise the size recommended for the expected number of items.
    ///
    /// # Errors
    ///
    /// Returns [`CArrayError::InvalidArgument`] if the options are invalid.
    pub fn new(options: &ArrayOptions) -> Result<Self, CArrayError> {
        let item_size = E::DTYPE.item_size();
        let chunk_size = options.resolve_chunk_size(item_size)?;
        let chunk_len = (chunk_size / item_size).max(1);

        Ok(Self {
            chunks: Vec::new(),
            leftover: Vec::new(),
            chunk_size,
            chunk_len,
            len: 0,
            cparams: *options.cparams(),
            hash_config: *options.hash_config(),
            #[cfg(feature = "hash-blake3")]
            hasher: Blake3Hasher::new(),
        })
    }

    /// Creates an array holding a copy of `items`.
    pub fn from_slice(items: &[E], options: &ArrayOptions) -> Result<Self, CArrayError> {
        let mut array = Self::new(options)?;
        array.append(items);
        Ok(array)
    }

    /// Appends items, sealing every chunk that fills up.
    pub fn append(&mut self, mut items: &[E]) {
        while !items.is_empty() {
            if self.leftover.is_empty() && items.len() >= self.chunk_len {
                let (head, tail) = items.split_at(self.chunk_len);
                self.seal(head);
                self.len += head.len() as u64;
                items = tail;
                continue;
            }

            let room = self.chunk_len - self.leftover.len();
            let (head, tail) = items.split_at(room.min(items.len()));
            self.leftover.extend_from_slice(head);
            self.len += head.len() as u64;
            items = tail;

            if self.leftover.len() == self.chunk_len {
                let full = std::mem::take(&mut self.leftover);
                self.seal(&full);
                self.leftover = full;
                self.leftover.clear();
            }
        }
    }

    /// Reserves room for roughly `additional` more items.
    ///
    /// This is a hint only: the reservation is capped and an allocation
    /// failure is ignored.
    pub fn reserve(&mut self, additional: usize) {
        let nchunks = (additional / self.chunk_len).min(MAX_RESERVED_CHUNKS);
        if self.chunks.try_reserve(nchunks).is_err() {
            trace!(nchunks, "chunk reservation skipped");
        }
    }

    /// Encodes `items` into a new sealed chunk.
    fn seal(&mut self, items: &[E]) {
        let offset = self.sealed_len();
        let mut data = Vec::with_capacity(items.len() * E::DTYPE.item_size());
        for &item in items {
            item.write_le(&mut data);
        }

        let mut chunk = Chunk::new(Bytes::from(data), offset, items.len());
        if let Some(hash) = self.compute_hash(&chunk.data) {
            chunk = chunk.set_hash(hash);
        }
        self.chunks.push(chunk);
    }

    /// Computes the fingerprint for the given data if hashing is enabled.
    #[cfg_attr(not(feature = "hash-blake3"), allow(unused_variables))]
    fn compute_hash(&mut self, data: &[u8]) -> Option<ChunkHash> {
        if !self.hash_config.enabled {
            return None;
        }
        #[cfg(feature = "hash-blake3")]
        return Some(self.hasher.fingerprint(data));
        #[cfg(not(feature = "hash-blake3"))]
        return None;
    }

    /// Number of items held in sealed chunks.
    fn sealed_len(&self) -> u64 {
        self.chunks.len() as u64 * self.chunk_len as u64
    }

    /// Returns the item at `index`, if in bounds.
    pub fn get(&self, index: u64) -> Option<E> {
        if index >= self.len {
            return None;
        }

        let sealed = self.sealed_len();
        if index >= sealed {
            return self.leftover.get((index - sealed) as usize).copied();
        }

        let chunk = &self.chunks[(index / self.chunk_len as u64) as usize];
        let item_size = E::DTYPE.item_size();
        let start = (index - chunk.offset) as usize * item_size;
        Some(E::read_le(&chunk.data[start..start + item_size]))
    }

    /// Iterates over all items in order.
    pub fn iter(&self) -> impl Iterator<Item = E> + '_ {
        let item_size = E::DTYPE.item_size();
        self.chunks
            .iter()
            .flat_map(move |chunk| chunk.data.chunks_exact(item_size).map(E::read_le))
            .chain(self.leftover.iter().copied())
    }

    /// Copies all items into a vector.
    pub fn to_vec(&self) -> Vec<E> {
        let mut out = Vec::with_capacity(self.len as usize);
        out.extend(self.iter());
        out
    }

    /// Returns the number of items.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns true if the array holds no items.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the chunk size in bytes.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the number of items per chunk.
    pub fn chunk_len(&self) -> usize {
        self.chunk_len
    }

    /// Returns the number of sealed chunks.
    pub fn nchunks(&self) -> usize {
        self.chunks.len()
    }

    /// Returns the sealed chunks.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Returns the items not yet sealed into a chunk.
    pub fn leftover(&self) -> &[E] {
        &self.leftover
    }

    /// Returns the uncompressed size in bytes.
    pub fn nbytes(&self) -> u64 {
        self.len * E::DTYPE.item_size() as u64
    }

    /// Returns the element type.
    pub fn dtype(&self) -> DType {
        E::DTYPE
    }

    /// Returns the compression parameters.
    pub fn cparams(&self) -> &CompressionParams {
        &self.cparams
    }
}

impl<E: Element> fmt::Display for CArray<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "carray(({},), {})  nbytes: {}; chunk_size: {}; chunk_len: {}; {}",
            self.len,
            E::DTYPE,
            self.nbytes(),
            self.chunk_size,
            self.chunk_len,
            self.cparams
        )
    }
}
