//! Finding the `main` packages to build.
//!
//! The actual package listing is delegated to a [`PackageLister`] (normally
//! `go list`). This module prepares the patterns and filters the listing
//! down to executable packages.

use std::path::{Component, Path};

use tracing::{debug, warn};

use crate::error::{BuildError, Result};

/// Something that can list packages for a set of patterns.
///
/// Output is one `name|import-path` line per package, the format produced
/// by `go list -f '{{.Name}}|{{.ImportPath}}'`. A hard failure is reported
/// as `Err` with the lister's error text.
pub trait PackageLister {
    fn list(&self, patterns: &[String]) -> std::result::Result<String, String>;
}

/// Rewrite absolute patterns under `cwd` as `./relative` ones.
///
/// `go list` treats absolute paths inconsistently, so paths inside the
/// working directory are passed relative to it. No patterns means `.`.
pub fn normalize_patterns(patterns: &[String], cwd: &Path) -> Vec<String> {
    if patterns.is_empty() {
        return vec![".".to_string()];
    }
    patterns
        .iter()
        .map(|pattern| {
            let path = Path::new(pattern);
            if !path.is_absolute() {
                return pattern.clone();
            }
            match path.strip_prefix(cwd) {
                Ok(rel) => relative_pattern(rel),
                Err(_) => pattern.clone(),
            }
        })
        .collect()
}

fn relative_pattern(rel: &Path) -> String {
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        ".".to_string()
    } else {
        format!("./{}", parts.join("/"))
    }
}

/// Extract the import paths of `main` packages from a listing.
pub fn parse_listing(output: &str) -> Vec<String> {
    let mut mains: Vec<String> = Vec::new();
    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((name, import_path)) = line.split_once('|') else {
            warn!(line, "bad line reading packages");
            continue;
        };
        if name == "main" && !mains.iter().any(|m| m == import_path) {
            mains.push(import_path.to_string());
        }
    }
    mains
}

/// Resolve `patterns` to the import paths of the `main` packages they name.
pub fn resolve_main_packages(
    lister: &dyn PackageLister,
    patterns: &[String],
    cwd: &Path,
) -> Result<Vec<String>> {
    let patterns = normalize_patterns(patterns, cwd);
    debug!(?patterns, "listing packages");
    let output = lister
        .list(&patterns)
        .map_err(|detail| BuildError::Resolution { detail })?;
    let mains = parse_listing(&output);
    debug!(count = mains.len(), "found main packages");
    Ok(mains)
}
