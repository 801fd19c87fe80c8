// Process-wide thread-count propagation.
// Kept to a single test: the registry is global to this test binary.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use carrayrs::{ThreadAware, deregister, detect_number_of_cores, num_threads, register, set_num_threads};

#[derive(Default)]
struct Backend {
    threads: AtomicUsize,
}

impl ThreadAware for Backend {
    fn name(&self) -> &str {
        "test-backend"
    }

    fn set_thread_count(&self, n: NonZeroUsize) {
        self.threads.store(n.get(), Ordering::SeqCst);
    }
}

#[test]
fn test_global_registry() {
    assert_eq!(num_threads(), detect_number_of_cores());

    let codec = Arc::new(Backend::default());
    let engine = Arc::new(Backend::default());
    let codec_id = register(codec.clone());
    register(engine.clone());

    assert_eq!(set_num_threads(3).unwrap(), None);
    assert_eq!(codec.threads.load(Ordering::SeqCst), 3);
    assert_eq!(engine.threads.load(Ordering::SeqCst), 3);
    assert_eq!(num_threads(), 3);

    // A deregistered backend keeps its last value.
    assert!(deregister(codec_id));
    assert_eq!(set_num_threads(6).unwrap(), Some(3));
    assert_eq!(codec.threads.load(Ordering::SeqCst), 3);
    assert_eq!(engine.threads.load(Ordering::SeqCst), 6);

    assert!(set_num_threads(0).is_err());
    assert_eq!(num_threads(), 6, "A rejected value must not change the setting");
}
