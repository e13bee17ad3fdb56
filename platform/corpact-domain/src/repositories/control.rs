use std::time::Duration;

/// Cooperative cancellation, checked between poll iterations.
pub trait RunControl {
    fn should_cancel(&self) -> bool;

    /// Blocks for `duration` unless cancelled first. Returns `false` when the
    /// sleep was cut short by cancellation.
    fn sleep(&self, duration: Duration) -> bool;
}

/// Never cancels; sleeps the full duration.
#[derive(Debug, Default, Clone, Copy)]
pub struct Uncancellable;

impl RunControl for Uncancellable {
    fn should_cancel(&self) -> bool {
        false
    }

    fn sleep(&self, duration: Duration) -> bool {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
        true
    }
}
