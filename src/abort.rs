use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::predict::PredictError;

/// Cooperative cancellation for long searches: set explicitly, by a drop
/// guard, or by passing a deadline. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub fn check(&self) -> Result<(), PredictError> {
        if self.is_cancelled() {
            Err(PredictError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Cancels when dropped, e.g. when the request future owning it goes away.
    pub fn guard(&self) -> CancelOnDrop {
        CancelOnDrop(self.clone())
    }
}

pub struct CancelOnDrop(Cancellation);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let cancel = Cancellation::new();
        let worker = cancel.clone();
        assert!(worker.check().is_ok());
        cancel.cancel();
        assert!(matches!(worker.check(), Err(PredictError::Cancelled)));
    }

    #[test]
    fn guard_cancels_on_drop() {
        let cancel = Cancellation::new();
        {
            let _guard = cancel.guard();
            assert!(!cancel.is_cancelled());
        }
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn deadline_expires() {
        let cancel = Cancellation::with_timeout(Duration::ZERO);
        assert!(cancel.is_cancelled());
        assert!(!Cancellation::with_timeout(Duration::from_secs(3600)).is_cancelled());
    }
}
