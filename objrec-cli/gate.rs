use std::sync::{Mutex, MutexGuard, PoisonError};

/// Single-slot buffer between a producer and a polling consumer.
///
/// Holds at most one item; a new arrival replaces the pending one. The lock
/// is only held to swap the slot, never while the item is processed.
#[derive(Debug)]
pub struct FrameGate<T> {
    slot: Mutex<Option<T>>,
}

impl<T> Default for FrameGate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FrameGate<T> {
    pub fn new() -> Self {
        Self { slot: Mutex::new(None) }
    }

    // A panic elsewhere cannot leave the Option half-written
    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `item`, returning the unprocessed item it replaced
    pub fn arrive(&self, item: T) -> Option<T> {
        self.lock().replace(item)
    }

    /// Remove the pending item, leaving the gate empty
    pub fn take(&self) -> Option<T> {
        self.lock().take()
    }

    pub fn is_pending(&self) -> bool {
        self.lock().is_some()
    }

    /// Run `process` on the pending item, if any. Empty gate: no-op.
    pub fn tick<R>(&self, process: impl FnOnce(T) -> R) -> Option<R> {
        let item = self.take()?;
        Some(process(item))
    }
}
