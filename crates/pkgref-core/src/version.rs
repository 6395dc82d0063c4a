//! Dotted assembly-version parsing and total ordering.
//!
//! This module provides [`AssemblyVersion`], the comparator used when
//! consolidating binding redirects. Versions are dot-separated non-negative
//! integer components; a version with fewer components compares as if padded
//! with trailing zeros, so `1.2` equals `1.2.0.0`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;

use crate::error::VersionError;

/// A parsed dotted version string with a total order.
///
/// Components are compared left to right; missing trailing components are
/// treated as zero. This matches the ordering the original redirect tables
/// were resolved with.
///
/// # Examples
///
/// ```
/// use pkgref_core::AssemblyVersion;
///
/// let a: AssemblyVersion = "1.2.0.0".parse()?;
/// let b: AssemblyVersion = "1.2".parse()?;
/// assert_eq!(a, b);
///
/// let newer: AssemblyVersion = "2.0.0.0".parse()?;
/// assert!(newer > a);
/// # Ok::<(), pkgref_core::VersionError>(())
/// ```
#[derive(Debug, Clone)]
pub struct AssemblyVersion {
    /// Numeric components in document order. Assembly versions are almost
    /// always four components, so four fit inline.
    components: SmallVec<[u64; 4]>,
}

impl AssemblyVersion {
    /// Returns the numeric components of this version.
    #[inline]
    #[must_use]
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// Returns the component at `index`, treating missing components as zero.
    #[inline]
    #[must_use]
    fn component_or_zero(&self, index: usize) -> u64 {
        self.components.get(index).copied().unwrap_or(0)
    }
}

impl FromStr for AssemblyVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }

        let mut components = SmallVec::new();
        for part in trimmed.split('.') {
            let value: u64 = part
                .parse()
                .map_err(|_| VersionError::invalid_component(part, trimmed))?;
            components.push(value);
        }

        Ok(Self { components })
    }
}

impl PartialEq for AssemblyVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AssemblyVersion {}

impl std::hash::Hash for AssemblyVersion {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Hash with trailing zeros stripped so equal versions hash equally.
        let mut components = self.components.as_slice();
        while let [rest @ .., 0] = components {
            components = rest;
        }
        components.hash(state);
    }
}

impl PartialOrd for AssemblyVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AssemblyVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            match self.component_or_zero(i).cmp(&other.component_or_zero(i)) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl fmt::Display for AssemblyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{component}")?;
        }
        Ok(())
    }
}
