//! Core traits for the composition runtime.

mod dispose;
mod resolver;

pub use dispose::{AsyncDispose, Dispose};
pub use resolver::{Resolver, ResolverCore};
