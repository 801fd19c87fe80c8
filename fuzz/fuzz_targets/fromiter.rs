#![no_main]

use libfuzzer_sys::fuzz_target;
use carrayrs::{fromiter, ArrayOptions, CArrayError, Count};

fuzz_target!(|input: (u16, Option<u16>, Vec<i16>)| {
    let (chunk_size, count, data) = input;
    let options = ArrayOptions::default().with_chunk_size(chunk_size as usize);
    let count = Count::from(count.map(usize::from));

    let mut source = data.iter().copied();
    let result = fromiter::<u8, _>(&mut source, count, &options);

    if chunk_size == 0 {
        assert!(matches!(result, Err(CArrayError::InvalidArgument { .. })));
        return;
    }

    let limit = match count {
        Count::Bounded(n) => n.min(data.len()),
        Count::Unbounded => data.len(),
    };
    let wanted = &data[..limit];

    match wanted.iter().position(|&v| u8::try_from(v).is_err()) {
        Some(bad) => match result {
            // Verify: the first unconvertible item is reported
            Err(CArrayError::TypeMismatch { index, .. }) => assert_eq!(index, bad as u64),
            other => panic!("expected type mismatch, got {:?}", other.map(|a| a.len())),
        },
        None => {
            let array = result.unwrap();

            // Verify: exactly the requested items, in order
            let expected: Vec<u8> = wanted.iter().map(|&v| v as u8).collect();
            assert_eq!(array.to_vec(), expected);

            // Verify: nothing beyond the request was consumed
            assert_eq!(source.len(), data.len() - limit);

            // Verify: sealed chunks are full and contiguous
            for (i, chunk) in array.chunks().iter().enumerate() {
                assert_eq!(chunk.len(), array.chunk_len());
                assert_eq!(chunk.offset, (i * array.chunk_len()) as u64);
            }
            assert!(array.leftover().len() < array.chunk_len());
        }
    }
});
