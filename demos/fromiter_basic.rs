//! Builds a chunked array from a lazy source and reports memory use.
//!
//! Run with:
//!     cargo run --example fromiter_basic

use std::time::Instant;

use carrayrs::{
    ArrayOptions, CompressionParams, Count, calc_chunk_size, fromiter, set_num_threads,
    show_stats,
};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    set_num_threads(2)?;
    let tref = show_stats("before", Instant::now());

    // 10 million float64 values is ~76 MB.
    let nitems: u64 = 10_000_000;
    let expected_mb = nitems as f64 * 8.0 / (1024.0 * 1024.0);
    println!(
        "expected {:.1} MB -> chunk size {} bytes",
        expected_mb,
        calc_chunk_size(expected_mb)?
    );

    let options = ArrayOptions::new(CompressionParams::new(5, true)?).with_expected_len(nitems);
    let source = (0..nitems).map(|i| (i as f64).sqrt());
    let array = fromiter::<f64, _>(source, Count::Unbounded, &options)?;

    println!("{}", array);
    for chunk in array.chunks().iter().take(3) {
        println!("  {}", chunk);
    }
    println!("  ... {} chunks, {} leftover items", array.nchunks(), array.leftover().len());

    show_stats("after fromiter", tref);
    Ok(())
}
