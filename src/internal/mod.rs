//! Internal implementation details.

use std::any::Any;

pub(crate) mod circular;
pub(crate) mod dispose_bag;

pub use circular::CircularPanic;
pub(crate) use circular::with_circular_catch;
pub(crate) use dispose_bag::{BoxFutureUnit, DisposeBag, Disposer};

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
