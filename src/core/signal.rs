use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::core::error::PullError;

/// One-shot "done" flag with a bounded wait.
///
/// `set_complete` is idempotent and wakes every current and future waiter;
/// the flag never resets.
#[derive(Debug, Default)]
pub struct CompletionSignal {
    complete: Mutex<bool>,
    cond: Condvar,
}

impl CompletionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_complete(&self) {
        let mut complete = self.complete.lock();
        if !*complete {
            *complete = true;
            self.cond.notify_all();
        }
    }

    pub fn is_complete(&self) -> bool {
        *self.complete.lock()
    }

    /// Block until completion or until `timeout` elapses.
    pub fn wait_until_complete(&self, timeout: Duration) -> Result<(), PullError> {
        let deadline = Instant::now() + timeout;
        let mut complete = self.complete.lock();
        while !*complete {
            if self.cond.wait_until(&mut complete, deadline).timed_out() {
                return if *complete { Ok(()) } else { Err(PullError::Timeout) };
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn wait_on_unset_signal_times_out() {
        let signal = CompletionSignal::new();
        let started = Instant::now();
        let result = signal.wait_until_complete(Duration::from_millis(50));
        assert_eq!(result, Err(PullError::Timeout));
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn set_wakes_blocked_waiter() {
        let signal = Arc::new(CompletionSignal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || signal.wait_until_complete(Duration::from_secs(5)))
        };
        thread::sleep(Duration::from_millis(20));
        signal.set_complete();
        assert_eq!(waiter.join().unwrap(), Ok(()));
    }

    #[test]
    fn waiters_after_completion_return_immediately() {
        let signal = CompletionSignal::new();
        signal.set_complete();
        signal.set_complete(); // idempotent
        assert!(signal.is_complete());
        assert_eq!(signal.wait_until_complete(Duration::from_millis(1)), Ok(()));
    }
}
