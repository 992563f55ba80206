//! Compute-once driver slots.

use once_cell::sync::OnceCell;

use crate::drivers::{DriverKind, InvalidDriver};

/// Memoised outcome of resolving one driver.
///
/// The first caller runs the resolver; concurrent callers block until it
/// finishes and then observe the same outcome. Failures are memoised too, so a
/// slot is resolved at most once per bootstrapper.
#[derive(Debug)]
pub(crate) struct DriverSlot<T> {
    kind: DriverKind,
    cell: OnceCell<Result<T, InvalidDriver>>,
}

impl<T: Clone> DriverSlot<T> {
    pub(crate) const fn new(kind: DriverKind) -> Self {
        Self {
            kind,
            cell: OnceCell::new(),
        }
    }

    pub(crate) const fn kind(&self) -> DriverKind {
        self.kind
    }

    /// Returns the memoised outcome, running `resolve` on first use.
    pub(crate) fn get_or_resolve<F>(&self, resolve: F) -> Result<T, InvalidDriver>
    where
        F: FnOnce() -> Result<T, InvalidDriver>,
    {
        self.cell.get_or_init(resolve).clone()
    }

    /// Constructed handle, if resolution has run and succeeded.
    pub(crate) fn constructed(&self) -> Option<&T> {
        self.cell.get().and_then(|outcome| outcome.as_ref().ok())
    }

    /// Returns `true` once resolution has run, whatever its outcome.
    pub(crate) fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    use super::*;
    use crate::registry::DriverError;

    #[test]
    fn resolves_once_and_reuses_the_value() {
        let slot = DriverSlot::new(DriverKind::Cache);
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let value = slot
                .get_or_resolve(|| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Arc::new(7_u8))
                })
                .expect("value");
            assert_eq!(*value, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(slot.constructed().is_some());
    }

    #[test]
    fn memoises_failures() {
        let slot: DriverSlot<Arc<u8>> = DriverSlot::new(DriverKind::Storage);
        let calls = AtomicUsize::new(0);
        for _ in 0..2 {
            let error = slot
                .get_or_resolve(|| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(InvalidDriver::new(
                        DriverKind::Storage,
                        DriverError::construction("proxy.storage", "memory", "boom"),
                    ))
                })
                .expect_err("resolution fails");
            assert_eq!(error.kind, DriverKind::Storage);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(slot.is_resolved());
        assert!(slot.constructed().is_none());
    }

    #[test]
    fn concurrent_first_access_resolves_once() {
        let slot = Arc::new(DriverSlot::new(DriverKind::Cache));
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let slot = Arc::clone(&slot);
                let calls = Arc::clone(&calls);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    slot.get_or_resolve(|| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(std::time::Duration::from_millis(20));
                        Ok(Arc::new(String::from("shared")))
                    })
                    .expect("value")
                })
            })
            .collect();

        let values: Vec<Arc<String>> = workers
            .into_iter()
            .map(|worker| worker.join().expect("worker panicked"))
            .collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let first = values.first().expect("at least one worker");
        assert!(values.iter().all(|value| Arc::ptr_eq(value, first)));
    }
}
