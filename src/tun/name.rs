//! One-shot interface name memoization

use once_cell::sync::OnceCell;
use std::io;

/// Caches the first outcome of an interface name computation
///
/// Whatever the first computation yields, a name or an error, is published
/// once and handed back on every later call. Concurrent first callers block
/// until the single computation finishes.
#[derive(Debug, Default)]
pub struct NameCache {
    cell: OnceCell<std::result::Result<String, (io::ErrorKind, String)>>,
}

impl NameCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached name, running `compute` if nothing is cached yet
    pub fn get_or_compute<F>(&self, compute: F) -> io::Result<&str>
    where
        F: FnOnce() -> io::Result<String>,
    {
        let cached = self
            .cell
            .get_or_init(|| compute().map_err(|e| (e.kind(), e.to_string())));

        match cached {
            Ok(name) => Ok(name.as_str()),
            Err((kind, message)) => Err(io::Error::new(*kind, message.clone())),
        }
    }

    /// Whether a result has been published
    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_value_is_memoized() {
        let cache = NameCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let name = cache
                .get_or_compute(|| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("7".to_string())
                })
                .unwrap();
            assert_eq!(name, "7");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_initialized());
    }

    #[test]
    fn test_error_is_memoized() {
        let cache = NameCache::new();
        let calls = AtomicUsize::new(0);

        let compute = || -> io::Result<String> {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(io::Error::new(io::ErrorKind::NotFound, "no such interface"))
        };

        let first = cache.get_or_compute(compute).unwrap_err();
        let second = cache.get_or_compute(|| Ok("late".to_string())).unwrap_err();

        assert_eq!(first.kind(), io::ErrorKind::NotFound);
        assert_eq!(second.kind(), io::ErrorKind::NotFound);
        assert_eq!(second.to_string(), "no such interface");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_first_calls_compute_once() {
        let cache = Arc::new(NameCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache
                        .get_or_compute(|| {
                            calls.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(std::time::Duration::from_millis(20));
                            Ok("3".to_string())
                        })
                        .map(str::to_string)
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), "3");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
