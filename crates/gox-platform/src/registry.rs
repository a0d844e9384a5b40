//! Which platforms each Go release can target.
//!
//! The table is a list of increments: each names the release that first
//! supported a group of platforms. The supported set for a version is the
//! union of every increment at or below it, in registration order.
//!
//! Version strings that cannot be parsed, or that predate the oldest entry,
//! resolve to the newest known set. Failing a build because the toolchain
//! reports an unfamiliar version string would break CI on every new Go
//! release, so the fallback is permissive and logged at `warn` level.

use tracing::{debug, warn};

use crate::error::{PlatformError, Result};
use crate::platform::{Platform, PlatformSet};
use crate::version::GoVersion;

/// Built-in increments: `((major, minor), [(os, arch)])`.
const BUILTIN_INCREMENTS: &[((u64, u64), &[(&str, &str)])] = &[
    (
        (1, 0),
        &[
            ("linux", "386"),
            ("linux", "amd64"),
            ("darwin", "386"),
            ("darwin", "amd64"),
            ("windows", "386"),
            ("windows", "amd64"),
            ("freebsd", "386"),
            ("freebsd", "amd64"),
        ],
    ),
    ((1, 1), &[]),
    ((1, 3), &[("linux", "arm")]),
    (
        (1, 4),
        &[
            ("darwin", "arm"),
            ("darwin", "arm64"),
            ("linux", "arm64"),
            ("freebsd", "arm"),
            ("netbsd", "386"),
            ("netbsd", "amd64"),
            ("netbsd", "arm"),
            ("openbsd", "386"),
            ("openbsd", "amd64"),
            ("plan9", "386"),
            ("plan9", "amd64"),
            ("solaris", "amd64"),
            ("dragonfly", "amd64"),
            ("android", "arm"),
        ],
    ),
];

/// Platforms first supported by a given Go release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformIncrement {
    pub since: GoVersion,
    pub platforms: Vec<Platform>,
}

/// Ordered table of platform increments, oldest release first.
#[derive(Debug, Clone, Default)]
pub struct VersionPlatformTable {
    increments: Vec<PlatformIncrement>,
}

impl VersionPlatformTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The table of Go releases gox knows about.
    pub fn builtin() -> Self {
        let increments = BUILTIN_INCREMENTS
            .iter()
            .map(|&((major, minor), platforms)| PlatformIncrement {
                since: GoVersion::new(major, minor),
                platforms: platforms
                    .iter()
                    .map(|&(os, arch)| Platform::new(os, arch))
                    .collect(),
            })
            .collect();
        Self { increments }
    }

    /// Append an increment. Versions must be registered in strictly ascending order.
    pub fn register(
        &mut self,
        since: GoVersion,
        platforms: impl IntoIterator<Item = Platform>,
    ) -> Result<()> {
        if let Some(last) = self.increments.last() {
            if since <= last.since {
                return Err(PlatformError::UnorderedIncrement {
                    previous: last.since.to_string(),
                    next: since.to_string(),
                });
            }
        }
        self.increments.push(PlatformIncrement {
            since,
            platforms: platforms.into_iter().collect(),
        });
        Ok(())
    }

    pub fn increments(&self) -> &[PlatformIncrement] {
        &self.increments
    }

    /// The newest release with an entry in the table.
    pub fn newest(&self) -> Option<&GoVersion> {
        self.increments.last().map(|inc| &inc.since)
    }

    /// Every platform in the table, which is the newest release's set.
    pub fn all(&self) -> PlatformSet {
        self.increments
            .iter()
            .flat_map(|inc| inc.platforms.iter().cloned())
            .collect()
    }

    /// Platforms supported by `version`, or `None` if it predates the table.
    pub fn platforms_for(&self, version: &GoVersion) -> Option<PlatformSet> {
        let release = version.release();
        let mut applicable = self
            .increments
            .iter()
            .take_while(|inc| inc.since <= release)
            .peekable();
        applicable.peek()?;
        Some(applicable.flat_map(|inc| inc.platforms.iter().cloned()).collect())
    }

    /// Platforms supported by the toolchain reporting `version`.
    ///
    /// Unparseable or too-old versions get the newest set; see the module docs.
    pub fn supported_platforms(&self, version: &str) -> PlatformSet {
        let parsed = match GoVersion::parse(version) {
            Ok(v) => v,
            Err(_) => {
                warn!(
                    version,
                    newest = ?self.newest().map(ToString::to_string),
                    "unrecognized Go version, assuming the newest known platform set"
                );
                return self.all();
            }
        };
        match self.platforms_for(&parsed) {
            Some(set) => {
                debug!(version = %parsed, platforms = set.len(), "resolved supported platforms");
                set
            }
            None => {
                warn!(
                    version = %parsed,
                    "Go version predates the platform table, assuming the newest known platform set"
                );
                self.all()
            }
        }
    }
}

/// Platforms supported by the toolchain reporting `version`, per the built-in table.
pub fn supported_platforms(version: &str) -> PlatformSet {
    VersionPlatformTable::builtin().supported_platforms(version)
}
