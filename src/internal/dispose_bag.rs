//! Internal disposal bag for managing cleanup hooks.

use std::future::Future;
use std::pin::Pin;

/// Future type for disposal operations.
pub(crate) type BoxFutureUnit = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A cleanup hook produced when a disposable instance is created.
pub(crate) enum Disposer {
    Sync(Box<dyn FnOnce() + Send>),
    Async(Box<dyn FnOnce() -> BoxFutureUnit + Send>),
}

/// Container for disposal hooks with LIFO execution order.
///
/// Owned by the provider (singletons, root-scope services) or by a scope.
/// Async hooks run first in reverse order, then sync hooks in reverse order.
#[derive(Default)]
pub(crate) struct DisposeBag {
    sync: Vec<Box<dyn FnOnce() + Send>>,
    asyncs: Vec<Box<dyn FnOnce() -> BoxFutureUnit + Send>>,
}

impl DisposeBag {
    pub(crate) fn push(&mut self, disposer: Disposer) {
        match disposer {
            Disposer::Sync(f) => self.sync.push(f),
            Disposer::Async(f) => self.asyncs.push(f),
        }
    }

    /// Moves the sync hooks out, leaving the async hooks in place.
    pub(crate) fn take_sync(&mut self) -> DisposeBag {
        DisposeBag {
            sync: std::mem::take(&mut self.sync),
            asyncs: Vec::new(),
        }
    }

    /// Execute all sync hooks in reverse order (LIFO).
    pub(crate) fn run_all_sync_reverse(&mut self) -> usize {
        let mut ran = 0;
        while let Some(f) = self.sync.pop() {
            (f)();
            ran += 1;
        }
        ran
    }

    /// Execute all async hooks in reverse order (LIFO).
    pub(crate) async fn run_all_async_reverse(&mut self) -> usize {
        let mut ran = 0;
        while let Some(f) = self.asyncs.pop() {
            (f)().await;
            ran += 1;
        }
        ran
    }

    pub(crate) fn pending_async(&self) -> usize {
        self.asyncs.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sync.is_empty() && self.asyncs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn sync_hooks_run_in_reverse_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut bag = DisposeBag::default();
        for i in 0..3 {
            let order = order.clone();
            bag.push(Disposer::Sync(Box::new(move || order.lock().unwrap().push(i))));
        }

        assert_eq!(bag.run_all_sync_reverse(), 3);
        assert_eq!(*order.lock().unwrap(), vec![2, 1, 0]);
        assert!(bag.is_empty());
    }
}
