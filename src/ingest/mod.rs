//! Streaming ingestion of lazy sources into chunked containers.
//!
//! The source is pulled one chunk's worth of items at a time, so a dataset
//! never has to be materialized in full:
//!
//! 1. Resolve the target from the requested [`Count`] or the source's
//!    length hint
//! 2. Create the container and read its chunk length once
//! 3. Pull at most one chunk of items, convert them, append the block
//! 4. Stop once the target is reached or the source comes up short
//!
//! # Example
//!
//! ```
//! use carrayrs::{fromiter, ArrayOptions, Count};
//!
//! let options = ArrayOptions::default().with_chunk_size(64);
//!
//! // Unbounded: read until the source ends.
//! let array = fromiter::<i64, _>((0..1000).filter(|i| i % 3 == 0), Count::Unbounded, &options)?;
//! assert_eq!(array.len(), 334);
//!
//! // Bounded: the rest of the source stays unread.
//! let mut source = 0u8..=255;
//! let array = fromiter::<u16, _>(&mut source, Count::Bounded(10), &options)?;
//! assert_eq!(array.len(), 10);
//! assert_eq!(source.next(), Some(10));
//! # Ok::<(), carrayrs::CArrayError>(())
//! ```

use std::fmt;

use tracing::{debug, trace};

use crate::carray::{CArray, ChunkedContainer};
use crate::config::ArrayOptions;
use crate::dtype::Element;
use crate::error::CArrayError;

/// How many items to read from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Count {
    /// Read exactly this many items, or fewer if the source ends first.
    Bounded(usize),
    /// Read until the source is exhausted.
    #[default]
    Unbounded,
}

impl From<usize> for Count {
    fn from(n: usize) -> Self {
        Count::Bounded(n)
    }
}

impl From<Option<usize>> for Count {
    fn from(n: Option<usize>) -> Self {
        n.map_or(Count::Unbounded, Count::Bounded)
    }
}

/// How far a session intends to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    /// Caller asked for exactly this many items.
    Bounded(usize),
    /// Source reported a length hint; it sizes allocations only.
    Estimated(usize),
    /// Nothing known; read until the source runs dry.
    Unbounded,
}

impl Target {
    fn resolve(count: Count, hint: Option<usize>) -> Self {
        match count {
            Count::Bounded(n) => Target::Bounded(n),
            Count::Unbounded => match hint {
                Some(hint) => Target::Estimated(hint),
                None => Target::Unbounded,
            },
        }
    }

    /// Upper bound on the next block's length.
    fn next_bound(self, consumed: usize, chunk_len: usize) -> usize {
        match self {
            Target::Bounded(n) => chunk_len.min(n.saturating_sub(consumed)),
            Target::Estimated(_) | Target::Unbounded => chunk_len,
        }
    }

    /// Number of items worth reserving up front. A bounded count is capped
    /// by the source's own hint, since the source may end first.
    fn reservation(self, hint: Option<usize>) -> Option<usize> {
        match self {
            Target::Bounded(n) => Some(hint.map_or(n, |hint| hint.min(n))),
            Target::Estimated(n) => Some(n),
            Target::Unbounded => None,
        }
    }
}

/// Cheap, possibly inaccurate estimate of how many items remain.
fn length_hint<I: Iterator>(source: &I) -> Option<usize> {
    match source.size_hint() {
        (_, Some(upper)) => Some(upper),
        (0, None) => None,
        (lower, None) => Some(lower),
    }
}

/// One ingestion call: owns the container until the source is drained.
struct Session<C: ChunkedContainer> {
    container: C,
    chunk_len: usize,
    target: Target,
    reservation: Option<usize>,
    consumed: usize,
    // Grows on demand; a short source never pays for a full chunk.
    block: Vec<C::Item>,
}

impl<C: ChunkedContainer> Session<C> {
    fn new(container: C, target: Target, reservation: Option<usize>) -> Self {
        let chunk_len = container.chunk_len().max(1);
        Self {
            container,
            chunk_len,
            target,
            reservation,
            consumed: 0,
            block: Vec::new(),
        }
    }

    fn run<I>(mut self, source: &mut I) -> Result<C, CArrayError>
    where
        I: Iterator,
        I::Item: TryInto<C::Item>,
        <I::Item as TryInto<C::Item>>::Error: fmt::Display,
    {
        if let Some(expected) = self.reservation {
            self.container.reserve(expected);
        }

        let mut nblocks = 0usize;
        loop {
            let bound = self.target.next_bound(self.consumed, self.chunk_len);
            if bound == 0 {
                break;
            }

            let read = self.fill_block(source, bound)?;
            if read > 0 {
                self.container.append(&self.block)?;
                nblocks += 1;
            }
            self.consumed += read;
            trace!(read, consumed = self.consumed, "appended block");

            // A short block means the source is exhausted, whatever the hint said.
            if read < bound {
                break;
            }
        }

        debug!(
            consumed = self.consumed,
            nblocks,
            chunk_len = self.chunk_len,
            "ingestion finished"
        );
        Ok(self.container)
    }

    /// Pulls up to `bound` items into the block buffer, converting each one.
    fn fill_block<I>(&mut self, source: &mut I, bound: usize) -> Result<usize, CArrayError>
    where
        I: Iterator,
        I::Item: TryInto<C::Item>,
        <I::Item as TryInto<C::Item>>::Error: fmt::Display,
    {
        self.block.clear();
        for value in source.take(bound) {
            match <I::Item as TryInto<C::Item>>::try_into(value) {
                Ok(item) => self.block.push(item),
                Err(e) => {
                    return Err(CArrayError::TypeMismatch {
                        index: (self.consumed + self.block.len()) as u64,
                        expected: <C::Item as Element>::DTYPE.name(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(self.block.len())
    }
}

/// Fills a new container of type `C` from `source`.
///
/// With [`Count::Bounded`] at most `n` items are pulled from the source; pass
/// `&mut iter` to keep reading the remainder afterwards. With
/// [`Count::Unbounded`] the source is read until it ends. A length hint from
/// the source is only used to reserve space.
///
/// # Errors
///
/// - [`CArrayError::InvalidArgument`] if `options` are invalid
/// - [`CArrayError::TypeMismatch`] if an item cannot be converted; the
///   partially filled container is dropped
pub fn ingest<C, I>(source: I, count: Count, options: &ArrayOptions) -> Result<C, CArrayError>
where
    C: ChunkedContainer,
    I: IntoIterator,
    I::Item: TryInto<C::Item>,
    <I::Item as TryInto<C::Item>>::Error: fmt::Display,
{
    let mut source = source.into_iter();
    let hint = length_hint(&source);
    let target = Target::resolve(count, hint);
    let container = C::create(options)?;
    debug!(?target, chunk_len = container.chunk_len(), "ingestion started");

    Session::new(container, target, target.reservation(hint)).run(&mut source)
}

/// Builds a [`CArray`] from `source`.
///
/// See [`ingest`] for the reading rules.
pub fn fromiter<E, I>(
    source: I,
    count: Count,
    options: &ArrayOptions,
) -> Result<CArray<E>, CArrayError>
where
    E: Element,
    I: IntoIterator,
    I::Item: TryInto<E>,
    <I::Item as TryInto<E>>::Error: fmt::Display,
{
    ingest::<CArray<E>, I>(source, count, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_conversions() {
        assert_eq!(Count::default(), Count::Unbounded);
        assert_eq!(Count::from(5), Count::Bounded(5));
        assert_eq!(Count::from(None), Count::Unbounded);
        assert_eq!(Count::from(Some(3)), Count::Bounded(3));
    }

    #[test]
    fn test_next_bound() {
        assert_eq!(Target::Bounded(10).next_bound(0, 4), 4);
        assert_eq!(Target::Bounded(10).next_bound(8, 4), 2);
        assert_eq!(Target::Bounded(10).next_bound(10, 4), 0);
        assert_eq!(Target::Estimated(2).next_bound(0, 4), 4);
        assert_eq!(Target::Unbounded.next_bound(1000, 4), 4);
    }

    #[test]
    fn test_length_hint() {
        assert_eq!(length_hint(&(0..10)), Some(10));
        assert_eq!(length_hint(&std::iter::repeat(1).take(3)), Some(3));
        assert_eq!(length_hint(&(0..10).filter(|_| true)), Some(10));
        assert_eq!(length_hint(&std::iter::from_fn(|| Some(1))), None);
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(Target::resolve(Count::Bounded(3), Some(7)), Target::Bounded(3));
        assert_eq!(Target::resolve(Count::Unbounded, Some(7)), Target::Estimated(7));
        assert_eq!(Target::resolve(Count::Unbounded, None), Target::Unbounded);
    }

    #[test]
    fn test_reservation() {
        // A bounded count never reserves more than the source claims to hold.
        assert_eq!(Target::Bounded(usize::MAX).reservation(Some(10)), Some(10));
        assert_eq!(Target::Bounded(5).reservation(Some(10)), Some(5));
        assert_eq!(Target::Bounded(5).reservation(None), Some(5));
        assert_eq!(Target::Estimated(7).reservation(Some(7)), Some(7));
        assert_eq!(Target::Unbounded.reservation(None), None);
    }

    #[test]
    fn test_type_mismatch_reports_index() {
        let options = ArrayOptions::default().with_chunk_size(4);
        let source = vec![1i64, 2, 3, 4, 5, 300, 7];
        let err = fromiter::<u8, _>(source, Count::Unbounded, &options).unwrap_err();
        match err {
            CArrayError::TypeMismatch { index, expected, .. } => {
                assert_eq!(index, 5);
                assert_eq!(expected, "uint8");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
