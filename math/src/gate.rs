//! Process-wide lookup tables built once behind an explicit gate.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, PoisonError, RwLock,
};

/// Lazily built, immutable table shared by every thread in the process.
pub(crate) struct TableGate<T> {
    slot: RwLock<Option<Arc<T>>>,
    fills: AtomicUsize,
    build: fn() -> T,
}

impl<T> TableGate<T> {
    pub(crate) const fn new(build: fn() -> T) -> Self {
        Self {
            slot: RwLock::new(None),
            fills: AtomicUsize::new(0),
            build,
        }
    }

    /// Returns the table, filling it exactly once across racing callers.
    pub(crate) fn ensure_ready(&self) -> Arc<T> {
        if let Some(table) = self
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Arc::clone(table);
        }

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(table) = slot.as_ref() {
            return Arc::clone(table);
        }

        let table = Arc::new((self.build)());
        let _ = self.fills.fetch_add(1, Ordering::Relaxed);
        *slot = Some(Arc::clone(&table));
        table
    }

    pub(crate) fn reset(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub(crate) fn fill_count(&self) -> usize {
        self.fills.load(Ordering::Relaxed)
    }
}
