//! A gox run: merge settings, check the toolchain, dispatch, report.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use gox_build::{
    resolve_main_packages, BuildReport, CompileOptions, Compiler, Dispatcher, GoTool,
    PackageLister, DEFAULT_OUTPUT_TEMPLATE,
};
use gox_platform::{split_list, supported_platforms, PlatformFilter};
use tracing::{debug, info, warn};

use crate::args::Cli;
use crate::config::GoxConfig;

/// Effective settings after layering flags over `gox.toml` over defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    pub output: String,
    pub parallel: i64,
    pub filter: PlatformFilter,
    pub compile: CompileOptions,
    /// Empty means the current directory.
    pub packages: Vec<String>,
}

impl BuildSettings {
    pub fn resolve(cli: &Cli, config: Option<(&GoxConfig, &Path)>) -> Result<Self> {
        let defaults = GoxConfig::default();
        let (file, config_dir) = match config {
            Some((c, dir)) => (c, Some(dir)),
            None => (&defaults, None),
        };
        let b = &file.build;

        let list = |flag: &Option<String>, configured: &[String]| match flag {
            Some(value) => split_list(value),
            None => configured.to_vec(),
        };
        let filter = PlatformFilter::new()
            .with_os(list(&cli.os, b.os.as_slice()))
            .with_arch(list(&cli.arch, b.arch.as_slice()))
            .with_osarch(list(&cli.osarch, b.osarch.as_slice()))
            .context("invalid -osarch entry")?;

        let packages = if !cli.packages.is_empty() {
            cli.packages.clone()
        } else {
            config_dir
                .map(|dir| file.packages_in(dir))
                .unwrap_or_default()
        };

        Ok(Self {
            output: cli
                .output
                .clone()
                .or_else(|| b.output.clone())
                .unwrap_or_else(|| DEFAULT_OUTPUT_TEMPLATE.to_string()),
            parallel: cli.parallel.or(b.parallel).unwrap_or(-1),
            filter,
            compile: CompileOptions {
                ldflags: cli.ldflags.clone().or_else(|| b.ldflags.clone()),
                tags: cli.tags.clone().or_else(|| b.tags.clone()),
                cgo: cli.cgo.or(b.cgo).unwrap_or(false),
            },
            packages,
        })
    }
}

/// Run gox from `cwd` with the `go` found on `PATH`. Returns whether every build succeeded.
pub fn run(cli: &Cli, cwd: &Path) -> Result<bool> {
    let config = GoxConfig::find_and_load(cwd)?;
    if let Some((_, dir)) = &config {
        debug!(dir = %dir.display(), "loaded gox.toml");
    }
    let settings = BuildSettings::resolve(cli, config.as_ref().map(|(c, d)| (c, d.as_path())))?;

    let go = GoTool::locate()?.with_options(settings.compile.clone());
    let version = go.version()?;
    info!(%version, "using Go toolchain");

    let report = execute(go, &version, &settings, cwd)?;
    if !report.success() {
        write_failures(&report, &mut io::stderr().lock())?;
    }
    Ok(report.success())
}

/// Discover packages and build them with `tool` for the platforms `version` supports.
pub fn execute<T>(tool: T, version: &str, settings: &BuildSettings, cwd: &Path) -> Result<BuildReport>
where
    T: Compiler + PackageLister,
{
    let dispatcher = Dispatcher::new(tool, settings.parallel);
    println!("Number of parallel builds: {}", dispatcher.bound());

    let packages = resolve_main_packages(dispatcher.compiler(), &settings.packages, cwd)?;
    if packages.is_empty() {
        warn!("no main packages found, nothing to build");
    }

    let platforms = settings.filter.apply(&supported_platforms(version))?;
    Ok(dispatcher.run(&packages, &platforms, &settings.output)?)
}

/// The end-of-run failure listing.
pub fn write_failures(report: &BuildReport, out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{} errors occurred:", report.failures.len())?;
    for failure in &report.failures {
        writeln!(out, "--> {failure}")?;
    }
    Ok(())
}
