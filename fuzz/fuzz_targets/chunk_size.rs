#![no_main]

use libfuzzer_sys::fuzz_target;
use carrayrs::{calc_chunk_size, BASE_CHUNK_SIZE};

fuzz_target!(|input: (f64, f64)| {
    let (a, b) = input;

    match calc_chunk_size(a) {
        Ok(size) => {
            // Verify: bounded power-of-two multiples of the base unit
            assert!(size >= 4 * BASE_CHUNK_SIZE && size <= 1024 * BASE_CHUNK_SIZE);
            assert!((size / BASE_CHUNK_SIZE).is_power_of_two());
        }
        Err(_) => assert!(a.is_nan() || a < 0.0),
    }

    // Verify: monotonic in the expected size
    if let (Ok(sa), Ok(sb)) = (calc_chunk_size(a), calc_chunk_size(b)) {
        if a <= b {
            assert!(sa <= sb);
        }
    }
});
