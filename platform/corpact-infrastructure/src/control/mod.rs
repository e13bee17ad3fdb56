use corpact_domain::repositories::control::RunControl;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cancellation shared between the harness and whoever may stop it (a signal
/// handler, a test). Sleeps wake as soon as `cancel` is called.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock() = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock()
    }
}

impl RunControl for CancellationFlag {
    fn should_cancel(&self) -> bool {
        self.is_cancelled()
    }

    fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let (lock, cvar) = &*self.inner;
        let mut cancelled = lock.lock();
        while !*cancelled {
            if cvar.wait_until(&mut cancelled, deadline).timed_out() {
                break;
            }
        }
        !*cancelled
    }
}
