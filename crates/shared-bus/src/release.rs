//! Release hooks for handles.

use std::sync::atomic::{AtomicBool, Ordering};

/// Something `ChannelRuntime::close` can release.
///
/// Types without releasable resources keep the default, which makes closing
/// them a no-op.
pub trait Closeable {
    /// Run the release hook. Returns `true` only for the call that actually
    /// released.
    fn release(&self) -> bool {
        false
    }
}

/// Fires a hook at most once, even under concurrent callers.
#[derive(Debug, Default)]
pub(crate) struct ReleaseGuard {
    released: AtomicBool,
}

impl ReleaseGuard {
    pub(crate) fn fire(&self, hook: impl FnOnce()) -> bool {
        if self
            .released
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            hook();
            true
        } else {
            false
        }
    }

    pub(crate) fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_hook_fires_once_under_contention() {
        let guard = Arc::new(ReleaseGuard::default());
        let fired = Arc::new(AtomicUsize::new(0));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let guard = Arc::clone(&guard);
                let fired = Arc::clone(&fired);
                std::thread::spawn(move || {
                    guard.fire(|| {
                        fired.fetch_add(1, Ordering::SeqCst);
                    })
                })
            })
            .collect();

        let wins = threads
            .into_iter()
            .map(|t| t.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(wins, 1);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(guard.is_released());
    }

    #[test]
    fn test_default_release_is_noop() {
        struct Plain;
        impl Closeable for Plain {}
        assert!(!Plain.release());
    }
}
