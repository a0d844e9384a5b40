//! Go toolchain version parsing and ordering.
//!
//! Go reports its version as `go1.4`, `go1.4.2`, `go1.10rc1` or `go1.21.0`.
//! Ordering is numeric on the release components, so `go1.10` sorts after
//! `go1.9`. Pre-release suffixes (`rc1`, `beta2`) are ignored: a release
//! candidate supports the same platforms as its release.

use std::fmt;
use std::str::FromStr;

use crate::error::{PlatformError, Result};

/// A Go toolchain release, ordered by `(major, minor, patch)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GoVersion(semver::Version);

impl GoVersion {
    pub fn new(major: u64, minor: u64) -> Self {
        Self(semver::Version::new(major, minor, 0))
    }

    /// Parse a `go`-prefixed version string.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || PlatformError::InvalidVersion {
            input: input.to_string(),
        };

        let rest = input.trim().strip_prefix("go").ok_or_else(invalid)?;
        let (major, rest) = take_number(rest).ok_or_else(invalid)?;

        let (minor, rest) = match rest.strip_prefix('.') {
            Some(r) => take_number(r).ok_or_else(invalid)?,
            None => (0, rest),
        };
        let (patch, rest) = match rest.strip_prefix('.') {
            Some(r) => take_number(r).ok_or_else(invalid)?,
            None => (0, rest),
        };

        // Anything left must be a pre-release or build suffix, not more digits.
        match rest.chars().next() {
            None => {}
            Some(c) if c.is_ascii_alphabetic() || matches!(c, '-' | '+' | ' ') => {}
            Some(_) => return Err(invalid()),
        }

        Ok(Self(semver::Version::new(major, minor, patch)))
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    /// The release line this version belongs to, with the patch level dropped.
    pub fn release(&self) -> Self {
        Self::new(self.0.major, self.0.minor)
    }
}

fn take_number(s: &str) -> Option<(u64, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let n = s[..end].parse().ok()?;
    Some((n, &s[end..]))
}

impl fmt::Display for GoVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "go{}.{}", self.0.major, self.0.minor)?;
        if self.0.patch > 0 {
            write!(f, ".{}", self.0.patch)?;
        }
        Ok(())
    }
}

impl FromStr for GoVersion {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> GoVersion {
        GoVersion::parse(s).unwrap()
    }

    #[test]
    fn parse_release_forms() {
        assert_eq!(v("go1"), GoVersion::new(1, 0));
        assert_eq!(v("go1.4"), GoVersion::new(1, 4));
        assert_eq!(v("go1.4.2").patch(), 2);
        assert_eq!(v("go1.21.0").minor(), 21);
        assert_eq!(v("  go1.3\n"), GoVersion::new(1, 3));
    }

    #[test]
    fn prerelease_suffix_is_ignored() {
        assert_eq!(v("go1.10rc1"), GoVersion::new(1, 10));
        assert_eq!(v("go1.4beta1"), GoVersion::new(1, 4));
        assert_eq!(v("go1.22.0 X:nocoverageredesign").release(), GoVersion::new(1, 22));
    }

    #[test]
    fn numeric_not_lexical_ordering() {
        assert!(v("go1.10") > v("go1.9"));
        assert!(v("go1.4.2") > v("go1.4"));
        assert!(v("go1.4rc1") >= GoVersion::new(1, 4));
        assert!(v("go2.0") > v("go1.99"));
    }

    #[test]
    fn rejects_unrecognised() {
        for bad in ["", "foo", "1.4", "go", "go.4", "gox1.4", "go1.", "devel +a1b2c3", "unknown-future"] {
            assert!(GoVersion::parse(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn display_round_trips_release() {
        assert_eq!(v("go1.0").to_string(), "go1.0");
        assert_eq!(v("go1.4.2").to_string(), "go1.4.2");
        assert_eq!(v("go1.10rc1").to_string(), "go1.10");
    }
}
