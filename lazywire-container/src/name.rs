//! Dependency names.
//!
//! [`DependencyName`] is the key space of the container. Every producer,
//! every declared factory parameter and every resolution trail entry is a
//! `DependencyName`.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Identifies a dependency in the container.
///
/// Cheap to clone (shared string). Borrows as `str`, so maps keyed by
/// `DependencyName` can be queried with plain string slices.
///
/// # Examples
/// ```
/// use lazywire_container::name::DependencyName;
///
/// let name = DependencyName::from("database_url");
/// assert_eq!(name.as_str(), "database_url");
/// assert_eq!(name, DependencyName::from(String::from("database_url")));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyName(Arc<str>);

impl DependencyName {
    /// Creates a name from anything string-like.
    #[inline]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Returns the name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The empty name is never registrable.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for DependencyName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for DependencyName {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<&String> for DependencyName {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

impl From<&DependencyName> for DependencyName {
    fn from(name: &DependencyName) -> Self {
        name.clone()
    }
}

impl Borrow<str> for DependencyName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DependencyName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for DependencyName {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for DependencyName {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Debug for DependencyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DependencyName({:?})", &*self.0)
    }
}

impl fmt::Display for DependencyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Converts a list of string-likes into owned names, preserving order.
pub fn names<I, S>(names: I) -> Vec<DependencyName>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names.into_iter().map(DependencyName::new).collect()
}
