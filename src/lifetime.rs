//! Service lifetime definitions.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::DiError;

/// Service lifetimes controlling instance caching behavior
///
/// The lifetime is part of every service descriptor and decides how often the
/// descriptor's constructor runs:
///
/// - **Singleton**: once per provider, on first resolution
/// - **Scoped**: once per scope (the provider itself acts as the root scope)
/// - **Transient**: on every resolution
///
/// When injectable metadata or an explicit factory leaves the lifetime
/// unspecified, [`Lifetime::default`] (`Scoped`) applies.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::Lifetime;
///
/// assert_eq!(Lifetime::default(), Lifetime::Scoped);
/// assert_eq!("Singleton".parse::<Lifetime>().unwrap(), Lifetime::Singleton);
/// assert!("forever".parse::<Lifetime>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum Lifetime {
    /// Single instance per provider, created lazily and shared across scopes and threads
    Singleton,
    /// Single instance per scope, released with the scope
    #[default]
    Scoped,
    /// New instance per resolution, never cached
    Transient,
}

impl Lifetime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::Transient => "transient",
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lifetime {
    type Err = DiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "singleton" => Ok(Lifetime::Singleton),
            "scoped" => Ok(Lifetime::Scoped),
            "transient" => Ok(Lifetime::Transient),
            other => Err(DiError::Classification {
                candidate: "Lifetime",
                reason: format!("unknown lifetime '{other}'"),
            }),
        }
    }
}
