//! `gox.toml` project configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gox_platform::Platform;
use serde::de::value::{Error as ValueError, StrDeserializer};
use serde::de::IntoDeserializer;
use serde::{Deserialize, Serialize};

/// File name searched for from the working directory upward.
pub const CONFIG_FILE: &str = "gox.toml";

/// Top-level configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GoxConfig {
    /// Build defaults; command-line flags take precedence.
    #[serde(default)]
    pub build: BuildConfig,
}

/// The `[build]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Output path template.
    pub output: Option<String>,
    /// Parallel builds; zero or negative means one per CPU.
    pub parallel: Option<i64>,
    /// Operating systems to build for (`!os` excludes).
    pub os: Vec<String>,
    /// Architectures to build for (`!arch` excludes).
    pub arch: Vec<String>,
    /// Exact `os/arch` pairs to build for (`!os/arch` excludes).
    pub osarch: Vec<String>,
    /// Passed to `go build -ldflags`.
    pub ldflags: Option<String>,
    /// Passed to `go build -tags`.
    pub tags: Option<String>,
    /// Build with cgo enabled.
    pub cgo: Option<bool>,
    /// Packages to build when none are given on the command line,
    /// relative to the directory holding `gox.toml`.
    pub packages: Vec<String>,
}

impl GoxConfig {
    /// Search upward from `start_dir` for `gox.toml`, returning it along with
    /// the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let config = Self::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((config, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.build.osarch_rules()?;
        Ok(config)
    }

    /// Configured packages, anchored at the config file's directory.
    pub fn packages_in(&self, config_dir: &Path) -> Vec<String> {
        self.build
            .packages
            .iter()
            .map(|p| {
                let path = Path::new(p);
                if path.is_absolute() || !looks_like_path(p) {
                    p.clone()
                } else {
                    config_dir.join(path).to_string_lossy().into_owned()
                }
            })
            .collect()
    }
}

impl BuildConfig {
    /// The `osarch` entries as platforms, each flagged `true` when it is a `!` exclusion.
    pub fn osarch_rules(&self) -> Result<Vec<(bool, Platform)>> {
        self.osarch
            .iter()
            .map(|entry| {
                let (exclude, pair) = match entry.strip_prefix('!') {
                    Some(pair) => (true, pair),
                    None => (false, entry.as_str()),
                };
                let de: StrDeserializer<'_, ValueError> = pair.into_deserializer();
                let platform = Platform::deserialize(de)
                    .with_context(|| format!("build.osarch entry {entry:?}"))?;
                Ok((exclude, platform))
            })
            .collect()
    }
}

/// Relative filesystem patterns start with `.`; anything else is an import path.
fn looks_like_path(pattern: &str) -> bool {
    pattern == "." || pattern == ".." || pattern.starts_with("./") || pattern.starts_with("../")
}
