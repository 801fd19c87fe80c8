//! Chunked containers.
//!
//! - [`ChunkedContainer`] - What ingestion needs from a container
//! - [`CArray`] - In-memory chunked array

mod engine;

pub use engine::CArray;

use crate::config::ArrayOptions;
use crate::dtype::Element;
use crate::error::CArrayError;

/// A container that stores items in fixed-length chunks.
///
/// Ingestion creates the container, reads its chunk length once and then
/// appends blocks of at most that many items.
pub trait ChunkedContainer: Sized {
    /// Element type stored by the container.
    type Item: Element;

    /// Creates an empty container.
    fn create(options: &ArrayOptions) -> Result<Self, CArrayError>;

    /// Number of items per chunk (at least 1).
    fn chunk_len(&self) -> usize;

    /// Appends a block of items.
    fn append(&mut self, block: &[Self::Item]) -> Result<(), CArrayError>;

    /// Number of items stored.
    fn len(&self) -> u64;

    /// Returns true if no items are stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hint that roughly `additional` more items will be appended.
    fn reserve(&mut self, additional: usize) {
        let _ = additional;
    }
}

impl<E: Element> ChunkedContainer for CArray<E> {
    type Item = E;

    fn create(options: &ArrayOptions) -> Result<Self, CArrayError> {
        CArray::new(options)
    }

    fn chunk_len(&self) -> usize {
        CArray::chunk_len(self)
    }

    fn append(&mut self, block: &[E]) -> Result<(), CArrayError> {
        CArray::append(self, block);
        Ok(())
    }

    fn len(&self) -> u64 {
        CArray::len(self)
    }

    fn reserve(&mut self, additional: usize) {
        CArray::reserve(self, additional);
    }
}
