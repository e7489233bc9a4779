//! Circular dependency detection infrastructure.

use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{DiError, DiResult};

const MAX_DEPTH: usize = 1024;

// Contracts currently being resolved on this thread
thread_local! {
    static RESOLUTION_STACK: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
}

/// Panic payload for circular dependency detection.
///
/// Raised from inside a constructor when a contract is requested while it is
/// already being resolved further up the same thread's stack. The
/// `with_circular_catch` that detected the repeat turns it back into
/// [`DiError::Circular`].
///
/// Example path: `["dyn Header", "dyn Layout", "dyn Header"]`
#[derive(Debug)]
pub struct CircularPanic {
    /// The complete circular dependency path showing the cycle.
    pub path: Box<[&'static str]>,
}

/// Pushes a contract on entry and pops it on drop, including during unwinding.
pub(crate) struct StackGuard;

impl StackGuard {
    pub(crate) fn enter(name: &'static str) -> Self {
        RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();

            if stack.iter().any(|&n| n == name) {
                let mut path = stack.clone();
                path.push(name);
                drop(stack);
                panic::panic_any(CircularPanic {
                    path: path.into_boxed_slice(),
                });
            }

            if stack.len() >= MAX_DEPTH {
                let depth = stack.len();
                drop(stack);
                panic::panic_any(DiError::DepthExceeded(depth));
            }

            stack.push(name);
        });

        Self
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RESOLUTION_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Runs `f` with `name` on the resolution stack, converting cycle and depth
/// panics raised anywhere below into errors.
pub(crate) fn with_circular_catch<T, F>(name: &'static str, f: F) -> DiResult<T>
where
    F: FnOnce() -> DiResult<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(|| {
        let _guard = StackGuard::enter(name);
        f()
    })) {
        Ok(result) => result,
        Err(payload) => {
            if let Some(circular) = payload.downcast_ref::<CircularPanic>() {
                Err(DiError::Circular(circular.path.to_vec()))
            } else if let Some(DiError::DepthExceeded(depth)) = payload.downcast_ref::<DiError>() {
                Err(DiError::DepthExceeded(*depth))
            } else {
                panic::resume_unwind(payload);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_distinct_names_succeed() {
        let result = with_circular_catch("a", || with_circular_catch("b", || Ok(7)));
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn repeated_name_reports_path_and_clears_stack() {
        let result: DiResult<()> =
            with_circular_catch("a", || with_circular_catch("b", || with_circular_catch("a", || Ok(()))));
        match result {
            Err(DiError::Circular(path)) => assert_eq!(path, vec!["a", "b", "a"]),
            other => panic!("expected circular error, got {other:?}"),
        }

        // The stack unwound fully, so the same names resolve cleanly afterwards
        assert!(with_circular_catch("a", || Ok(())).is_ok());
        RESOLUTION_STACK.with(|stack| assert!(stack.borrow().is_empty()));
    }
}
