//! The `go` command, as a package lister and cross-compiler.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use gox_platform::Platform;
use tracing::debug;

use crate::discover::PackageLister;
use crate::error::{BuildError, Result};

/// Builds one package for one platform.
///
/// Implementations are shared across worker threads. A failure carries the
/// message to show the user, normally the compiler's stderr.
pub trait Compiler: Send + Sync {
    fn compile(
        &self,
        package: &str,
        platform: &Platform,
        output: &Path,
    ) -> std::result::Result<(), String>;
}

/// Extra settings forwarded to `go build`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Value for `-ldflags`.
    pub ldflags: Option<String>,
    /// Value for `-tags`.
    pub tags: Option<String>,
    /// Build with `CGO_ENABLED=1` instead of `0`.
    pub cgo: bool,
}

/// Handle on a `go` executable.
#[derive(Debug, Clone)]
pub struct GoTool {
    program: PathBuf,
    options: CompileOptions,
}

impl GoTool {
    /// Use `go` from `PATH`, failing if it cannot be run.
    pub fn locate() -> Result<Self> {
        Self::locate_program("go")
    }

    /// Use a specific executable, failing if it cannot be run.
    pub fn locate_program(program: impl Into<PathBuf>) -> Result<Self> {
        let tool = Self::with_program(program);
        match Command::new(&tool.program).arg("version").output() {
            Ok(_) => Ok(tool),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(BuildError::ToolchainNotFound),
            Err(e) => Err(BuildError::Io(e)),
        }
    }

    /// Wrap an executable path without checking it.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            options: CompileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// The toolchain's version string, e.g. `go1.4.2`.
    pub fn version(&self) -> Result<String> {
        if let Ok(out) = self.exec(&[], None, &["env", "GOVERSION"]) {
            let v = out.trim();
            if v.starts_with("go") {
                return Ok(v.to_string());
            }
        }
        // GOVERSION is not reported by older toolchains.
        let out = self
            .exec(&[], None, &["version"])
            .map_err(|detail| BuildError::VersionUnreadable { detail })?;
        parse_version_output(&out).ok_or_else(|| BuildError::VersionUnreadable {
            detail: format!("unexpected `go version` output: {}", out.trim()),
        })
    }

    /// Arguments for `go build`. The output path is passed through unmodified.
    fn build_args(&self, target: Option<&str>, output: PathBuf) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["build".into(), "-o".into(), output.into_os_string()];
        if let Some(ldflags) = &self.options.ldflags {
            args.extend([OsString::from("-ldflags"), OsString::from(ldflags)]);
        }
        if let Some(tags) = &self.options.tags {
            args.extend([OsString::from("-tags"), OsString::from(tags)]);
        }
        args.extend(target.map(OsString::from));
        args
    }

    fn exec<S>(
        &self,
        envs: &[(&str, &str)],
        dir: Option<&Path>,
        args: &[S],
    ) -> std::result::Result<String, String>
    where
        S: AsRef<OsStr> + fmt::Debug,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        for (k, v) in envs {
            cmd.env(k, v);
        }
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        debug!(program = %self.program.display(), ?args, ?envs, "running go");

        let output = cmd
            .output()
            .map_err(|e| format!("failed to run {}: {e}", self.program.display()))?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if stderr.is_empty() {
            let command: Vec<_> = args.iter().map(|a| a.as_ref().to_string_lossy()).collect();
            Err(format!("go {} exited with {}", command.join(" "), output.status))
        } else {
            Err(stderr.to_string())
        }
    }
}

impl PackageLister for GoTool {
    fn list(&self, patterns: &[String]) -> std::result::Result<String, String> {
        let mut args = vec!["list", "-f", "{{.Name}}|{{.ImportPath}}"];
        args.extend(patterns.iter().map(String::as_str));
        self.exec(&[], None, &args)
    }
}

impl Compiler for GoTool {
    fn compile(
        &self,
        package: &str,
        platform: &Platform,
        output: &Path,
    ) -> std::result::Result<(), String> {
        let output = absolute(output).map_err(|e| format!("resolving output path: {e}"))?;
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("creating {}: {e}", parent.display()))?;
        }

        // `go list` reports packages outside GOPATH as `_/abs/dir`; those
        // only build from inside their directory.
        let (dir, target) = match package.strip_prefix('_') {
            Some(local) => (Some(Path::new(local)), None),
            None => (None, Some(package)),
        };

        let args = self.build_args(target, output);
        let cgo = if self.options.cgo { "1" } else { "0" };
        let envs = [
            ("GOOS", platform.os.as_str()),
            ("GOARCH", platform.arch.as_str()),
            ("CGO_ENABLED", cgo),
        ];
        self.exec(&envs, dir, &args).map(|_| ())
    }
}

fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Output file for a rendered template: Windows binaries get `.exe`.
pub fn binary_path(rendered: &str, platform: &Platform) -> PathBuf {
    if platform.is_windows() {
        PathBuf::from(format!("{rendered}.exe"))
    } else {
        PathBuf::from(rendered)
    }
}

/// Pull `go1.4.2` out of `go version go1.4.2 linux/amd64`.
pub fn parse_version_output(output: &str) -> Option<String> {
    output
        .split_whitespace()
        .find(|word| word.starts_with("go") && word[2..].starts_with(|c: char| c.is_ascii_digit()))
        .map(str::to_string)
}
