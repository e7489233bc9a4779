//! Contract keys for registry storage and lookup.

use std::any::TypeId;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifies a service contract (or a concrete implementation type).
///
/// A key wraps the `TypeId` of a possibly unsized type, so `dyn Trait`
/// contracts and concrete structs are keyed the same way. The type name is
/// carried along for diagnostics only; equality and hashing use the `TypeId`.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::Key;
///
/// trait Greeter: Send + Sync {}
/// struct English;
///
/// let contract = Key::of::<dyn Greeter>();
/// assert!(contract.display_name().contains("Greeter"));
/// assert_eq!(contract, Key::of::<dyn Greeter>());
/// assert_ne!(contract, Key::of::<English>());
/// ```
#[derive(Clone, Copy)]
pub struct Key {
    id: TypeId,
    name: &'static str,
}

impl Key {
    /// Key for the type `T`, sized or not.
    #[inline(always)]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Human-readable type name, as produced by `std::any::type_name`.
    pub fn display_name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Key {}

impl Hash for Key {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// Name first so sorted diagnostics read alphabetically
impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(other.name).then_with(|| self.id.cmp(&other.id))
    }
}

/// Shorthand for [`Key::of`].
#[inline(always)]
pub fn key_of<T: ?Sized + 'static>() -> Key {
    Key::of::<T>()
}
