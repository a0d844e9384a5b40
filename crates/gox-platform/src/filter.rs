//! Narrowing the supported platform set to what the user asked for.
//!
//! Selections come in three lists: operating systems, architectures, and
//! full `os/arch` pairs. An entry prefixed with `!` excludes instead of
//! selects. With no positive entries every supported platform is selected,
//! so `!windows` alone means "everything except Windows".

use crate::error::{PlatformError, Result};
use crate::platform::{Platform, PlatformSet};

/// Split a user-supplied list on whitespace and commas.
pub fn split_list(input: &str) -> Vec<String> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Selection<T> {
    include: Vec<T>,
    exclude: Vec<T>,
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

impl<T: PartialEq> Selection<T> {
    fn push(&mut self, item: T, negated: bool) {
        let list = if negated {
            &mut self.exclude
        } else {
            &mut self.include
        };
        if !list.contains(&item) {
            list.push(item);
        }
    }
}

/// Platform selection built from `-os`, `-arch`, and `-osarch` entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformFilter {
    os: Selection<String>,
    arch: Selection<String>,
    osarch: Selection<Platform>,
}

impl PlatformFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_os<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for item in items {
            let (name, negated) = split_negation(item.as_ref());
            self.os.push(name.to_string(), negated);
        }
        self
    }

    pub fn with_arch<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for item in items {
            let (name, negated) = split_negation(item.as_ref());
            self.arch.push(name.to_string(), negated);
        }
        self
    }

    /// Add `os/arch` entries. Fails on entries that are not valid pairs.
    pub fn with_osarch<I, S>(mut self, items: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for item in items {
            let (name, negated) = split_negation(item.as_ref());
            self.osarch.push(name.parse()?, negated);
        }
        Ok(self)
    }

    /// True when the filter selects everything.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn has_includes(&self) -> bool {
        !(self.os.include.is_empty()
            && self.arch.include.is_empty()
            && self.osarch.include.is_empty())
    }

    /// Apply the filter, preserving the order of `supported`.
    pub fn apply(&self, supported: &PlatformSet) -> Result<PlatformSet> {
        self.check_includes(supported)?;

        let by_parts = !(self.os.include.is_empty() && self.arch.include.is_empty());
        let selected: PlatformSet = supported
            .iter()
            .filter(|p| {
                if !self.has_includes() {
                    return true;
                }
                let pair = self.osarch.include.contains(p);
                let parts = by_parts
                    && (self.os.include.is_empty() || self.os.include.contains(&p.os))
                    && (self.arch.include.is_empty() || self.arch.include.contains(&p.arch));
                pair || parts
            })
            .filter(|p| {
                !(self.os.exclude.contains(&p.os)
                    || self.arch.exclude.contains(&p.arch)
                    || self.osarch.exclude.contains(p))
            })
            .cloned()
            .collect();

        if selected.is_empty() {
            return Err(PlatformError::NoPlatformsSelected);
        }
        Ok(selected)
    }

    /// Every positive entry must name something the toolchain can build.
    fn check_includes(&self, supported: &PlatformSet) -> Result<()> {
        let unsupported = |item: String| PlatformError::UnsupportedFilter { item };
        if let Some(os) = self
            .os
            .include
            .iter()
            .find(|os| !supported.iter().any(|p| &p.os == *os))
        {
            return Err(unsupported(os.clone()));
        }
        if let Some(arch) = self
            .arch
            .include
            .iter()
            .find(|arch| !supported.iter().any(|p| &p.arch == *arch))
        {
            return Err(unsupported(arch.clone()));
        }
        if let Some(pair) = self.osarch.include.iter().find(|p| !supported.contains(p)) {
            return Err(unsupported(pair.to_string()));
        }
        Ok(())
    }
}

fn split_negation(item: &str) -> (&str, bool) {
    let item = item.trim();
    match item.strip_prefix('!') {
        Some(rest) => (rest, true),
        None => (item, false),
    }
}
