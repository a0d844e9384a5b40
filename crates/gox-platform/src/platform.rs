//! Build target values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, Result};

/// A target (operating system, architecture) pair, in Go's `GOOS`/`GOARCH` vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Platform {
    /// Operating system (`GOOS`), e.g. "linux".
    pub os: String,
    /// Architecture (`GOARCH`), e.g. "amd64".
    pub arch: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Whether binaries for this platform carry an `.exe` suffix.
    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

impl FromStr for Platform {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || PlatformError::InvalidPlatform {
            input: s.to_string(),
        };
        let (os, arch) = s.trim().split_once('/').ok_or_else(invalid)?;
        if os.is_empty() || arch.is_empty() || arch.contains('/') {
            return Err(invalid());
        }
        Ok(Self::new(os, arch))
    }
}

impl TryFrom<String> for Platform {
    type Error = PlatformError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Platform> for String {
    fn from(p: Platform) -> Self {
        p.to_string()
    }
}

/// An ordered set of platforms.
///
/// Iteration follows insertion order, which fixes the order builds are
/// dispatched in. Inserting a platform that is already present is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformSet {
    platforms: Vec<Platform>,
}

impl PlatformSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a platform, returning `false` if it was already present.
    pub fn insert(&mut self, platform: Platform) -> bool {
        if self.platforms.contains(&platform) {
            return false;
        }
        self.platforms.push(platform);
        true
    }

    pub fn contains(&self, platform: &Platform) -> bool {
        self.platforms.contains(platform)
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Platform> {
        self.platforms.iter()
    }

    /// Whether every platform in `self` is also in `other`.
    pub fn is_subset(&self, other: &PlatformSet) -> bool {
        self.platforms.iter().all(|p| other.contains(p))
    }

    pub fn as_slice(&self) -> &[Platform] {
        &self.platforms
    }
}

impl Extend<Platform> for PlatformSet {
    fn extend<I: IntoIterator<Item = Platform>>(&mut self, iter: I) {
        for p in iter {
            self.insert(p);
        }
    }
}

impl FromIterator<Platform> for PlatformSet {
    fn from_iter<I: IntoIterator<Item = Platform>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for PlatformSet {
    type Item = Platform;
    type IntoIter = std::vec::IntoIter<Platform>;

    fn into_iter(self) -> Self::IntoIter {
        self.platforms.into_iter()
    }
}

impl<'a> IntoIterator for &'a PlatformSet {
    type Item = &'a Platform;
    type IntoIter = std::slice::Iter<'a, Platform>;

    fn into_iter(self) -> Self::IntoIter {
        self.platforms.iter()
    }
}
