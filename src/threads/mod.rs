//! Process-wide thread-count propagation.
//!
//! Compression backends and other thread-aware components register with a
//! [`ThreadRegistry`]; setting the thread count pushes the new value to every
//! registered component. The setting persists for the life of the process
//! and the last write wins.
//!
//! # Example
//!
//! ```
//! use std::num::NonZeroUsize;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! use carrayrs::{ThreadAware, ThreadRegistry};
//!
//! #[derive(Default)]
//! struct Backend(AtomicUsize);
//!
//! impl ThreadAware for Backend {
//!     fn name(&self) -> &str {
//!         "backend"
//!     }
//!
//!     fn set_thread_count(&self, n: NonZeroUsize) {
//!         self.0.store(n.get(), Ordering::Relaxed);
//!     }
//! }
//!
//! let registry = ThreadRegistry::new();
//! let backend = Arc::new(Backend::default());
//! registry.register(backend.clone());
//!
//! registry.set_num_threads(4)?;
//! assert_eq!(backend.0.load(Ordering::Relaxed), 4);
//! # Ok::<(), carrayrs::CArrayError>(())
//! ```

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use tracing::debug;

use crate::error::CArrayError;

/// A component whose parallelism follows the process-wide thread count.
pub trait ThreadAware: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Applies a new thread count to all subsequent work.
    fn set_thread_count(&self, n: NonZeroUsize);
}

/// Handle returned by [`ThreadRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(u64);

/// A set of thread-aware components sharing one thread-count setting.
///
/// Components are called without any registry lock held, so a callback may
/// register, deregister or query the registry. Calling
/// [`ThreadRegistry::set_num_threads`] from inside a callback is not
/// supported.
pub struct ThreadRegistry {
    components: RwLock<Vec<(RegistrationId, Arc<dyn ThreadAware>)>>,
    // Serializes setters so every component sees updates in one order.
    update: Mutex<()>,
    next_id: AtomicU64,
    // 0 until a value is set.
    num_threads: AtomicUsize,
}

impl ThreadRegistry {
    /// Creates an empty registry with no thread count set.
    pub fn new() -> Self {
        Self {
            components: RwLock::new(Vec::new()),
            update: Mutex::new(()),
            next_id: AtomicU64::new(0),
            num_threads: AtomicUsize::new(0),
        }
    }

    /// Registers a component.
    ///
    /// If a thread count has already been set, the component receives it
    /// immediately.
    pub fn register(&self, component: Arc<dyn ThreadAware>) -> RegistrationId {
        let id = RegistrationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.components
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, component.clone()));
        debug!(component = component.name(), "registered thread-aware component");

        // A setter racing with us may have missed the push; re-apply until the
        // value we applied is still the current one.
        let mut applied = 0;
        loop {
            let current = self.num_threads.load(Ordering::Acquire);
            if current == applied {
                break;
            }
            if let Some(n) = NonZeroUsize::new(current) {
                component.set_thread_count(n);
            }
            applied = current;
        }
        id
    }

    /// Removes a component. Returns false if it was not registered.
    pub fn deregister(&self, id: RegistrationId) -> bool {
        let mut components = self
            .components
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = components.len();
        components.retain(|(registered, _)| *registered != id);
        components.len() != before
    }

    /// Sets the thread count and pushes it to every registered component.
    ///
    /// Returns the previously set value, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CArrayError::InvalidArgument`] if `n` is zero.
    pub fn set_num_threads(&self, n: usize) -> Result<Option<usize>, CArrayError> {
        let count = NonZeroUsize::new(n)
            .ok_or(CArrayError::invalid("thread count must be positive"))?;

        let _update = self.update.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = self.num_threads.swap(n, Ordering::AcqRel);

        // Snapshot so callbacks run without the component lock held.
        let components: Vec<Arc<dyn ThreadAware>> = self
            .components
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, component)| component.clone())
            .collect();

        for component in &components {
            component.set_thread_count(count);
        }
        debug!(n, ncomponents = components.len(), "thread count updated");

        Ok(NonZeroUsize::new(previous).map(NonZeroUsize::get))
    }

    /// Returns the configured thread count, or the number of cores if unset.
    pub fn num_threads(&self) -> usize {
        match self.num_threads.load(Ordering::Acquire) {
            0 => detect_number_of_cores(),
            n => n,
        }
    }

    /// Number of registered components.
    pub fn len(&self) -> usize {
        self.components
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no components are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ThreadRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ThreadRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadRegistry")
            .field("components", &self.len())
            .field("num_threads", &self.num_threads.load(Ordering::Relaxed))
            .finish()
    }
}

fn global() -> &'static ThreadRegistry {
    static REGISTRY: OnceLock<ThreadRegistry> = OnceLock::new();
    REGISTRY.get_or_init(ThreadRegistry::new)
}

/// Registers a component with the process-wide registry.
pub fn register(component: Arc<dyn ThreadAware>) -> RegistrationId {
    global().register(component)
}

/// Removes a component from the process-wide registry.
pub fn deregister(id: RegistrationId) -> bool {
    global().deregister(id)
}

/// Sets the process-wide thread count. See [`ThreadRegistry::set_num_threads`].
pub fn set_num_threads(n: usize) -> Result<Option<usize>, CArrayError> {
    global().set_num_threads(n)
}

/// Returns the process-wide thread count.
pub fn num_threads() -> usize {
    global().num_threads()
}

/// Detects the number of cores available to this process.
///
/// Falls back to the `NUMBER_OF_PROCESSORS` environment variable, then to 1.
pub fn detect_number_of_cores() -> usize {
    if let Ok(n) = std::thread::available_parallelism() {
        return n.get();
    }

    std::env::var("NUMBER_OF_PROCESSORS")
        .ok()
        .and_then(|v| v.trim().parse::<NonZeroUsize>().ok())
        .map_or(1, NonZeroUsize::get)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<usize>>,
    }

    impl Recorder {
        fn seen(&self) -> Vec<usize> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl ThreadAware for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn set_thread_count(&self, n: NonZeroUsize) {
            self.seen.lock().unwrap().push(n.get());
        }
    }

    #[test]
    fn test_propagates_to_all_components() {
        let registry = ThreadRegistry::new();
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        registry.register(a.clone());
        registry.register(b.clone());

        assert_eq!(registry.set_num_threads(3).unwrap(), None);
        assert_eq!(registry.set_num_threads(5).unwrap(), Some(3));

        assert_eq!(a.seen(), vec![3, 5]);
        assert_eq!(b.seen(), vec![3, 5]);
        assert_eq!(registry.num_threads(), 5);
    }

    #[test]
    fn test_late_registration_receives_current_value() {
        let registry = ThreadRegistry::new();
        registry.set_num_threads(2).unwrap();

        let late = Arc::new(Recorder::default());
        registry.register(late.clone());
        assert_eq!(late.seen(), vec![2]);
    }

    #[test]
    fn test_no_value_pushed_before_first_set() {
        let registry = ThreadRegistry::new();
        let component = Arc::new(Recorder::default());
        registry.register(component.clone());
        assert!(component.seen().is_empty());
        assert_eq!(registry.num_threads(), detect_number_of_cores());
    }

    #[test]
    fn test_deregister() {
        let registry = ThreadRegistry::new();
        let component = Arc::new(Recorder::default());
        let id = registry.register(component.clone());
        assert_eq!(registry.len(), 1);

        assert!(registry.deregister(id));
        assert!(!registry.deregister(id));
        assert!(registry.is_empty());

        registry.set_num_threads(8).unwrap();
        assert!(component.seen().is_empty());
    }

    #[test]
    fn test_zero_threads_rejected() {
        let registry = ThreadRegistry::new();
        assert!(matches!(
            registry.set_num_threads(0),
            Err(CArrayError::InvalidArgument { .. })
        ));
        assert_eq!(registry.num_threads(), detect_number_of_cores());
    }

    /// Calls back into its registry from the callback.
    struct Reentrant {
        registry: Arc<ThreadRegistry>,
        late: Arc<Recorder>,
        seen_len: Mutex<Vec<usize>>,
    }

    impl ThreadAware for Reentrant {
        fn name(&self) -> &str {
            "reentrant"
        }

        fn set_thread_count(&self, _n: NonZeroUsize) {
            let len = self.registry.len();
            self.seen_len.lock().unwrap().push(len);
            if len == 1 {
                let id = self.registry.register(self.late.clone());
                assert!(self.registry.deregister(id));
                self.registry.register(self.late.clone());
            }
            let _ = self.registry.num_threads();
        }
    }

    #[test]
    fn test_callback_may_use_registry() {
        let registry = Arc::new(ThreadRegistry::new());
        let late = Arc::new(Recorder::default());
        let component = Arc::new(Reentrant {
            registry: registry.clone(),
            late: late.clone(),
            seen_len: Mutex::new(Vec::new()),
        });
        registry.register(component.clone());

        let (tx, rx) = std::sync::mpsc::channel();
        let worker = {
            let registry = registry.clone();
            std::thread::spawn(move || {
                let previous = registry.set_num_threads(4).unwrap();
                tx.send(previous).unwrap();
            })
        };
        let previous = rx
            .recv_timeout(std::time::Duration::from_secs(10))
            .expect("set_num_threads must not block on its own callbacks");
        worker.join().unwrap();

        assert_eq!(previous, None);
        assert_eq!(component.seen_len.lock().unwrap().as_slice(), &[1]);
        // Registered from inside the callback, so it received the new value.
        assert_eq!(late.seen(), vec![4, 4]);
        assert_eq!(registry.len(), 2);

        // Registering a reentrant component after a value is set is fine too.
        let again = Arc::new(Reentrant {
            registry: registry.clone(),
            late: Arc::new(Recorder::default()),
            seen_len: Mutex::new(Vec::new()),
        });
        registry.register(again.clone());
        assert_eq!(again.seen_len.lock().unwrap().as_slice(), &[3]);
    }

    #[test]
    fn test_detect_number_of_cores() {
        assert!(detect_number_of_cores() >= 1);
    }
}
