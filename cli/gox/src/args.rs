//! Command-line definition.
//!
//! gox takes Go-style flags (`-output=...`, `-parallel 4`). They are
//! rewritten to the double-dash form before clap sees them, so both
//! spellings work.

use std::ffi::OsString;

use clap::builder::BoolishValueParser;
use clap::Parser;

const OUTPUT_HELP: &str = "\
Output path template:

  The output path for the compiled binaries is specified with the
  \"-output\" flag. The value uses Go template syntax; the default is
  \"{{.Dir}}_{{.OS}}_{{.Arch}}\". {{.Dir}} is the last element of the
  package import path, {{.OS}} and {{.Arch}} are the target GOOS and
  GOARCH. Windows binaries get an .exe suffix.

Platform selection:

  -os, -arch and -osarch take space- or comma-separated lists. Prefix
  an entry with ! to exclude it, e.g. -os='!windows' or
  -osarch='!linux/arm'.

Configuration:

  Defaults for every option can be set in the [build] section of a
  gox.toml found in the working directory or any parent. Flags given
  on the command line take precedence.";

/// Cross-compiles Go applications in parallel.
#[derive(Parser, Debug, Default, PartialEq, Eq)]
#[command(name = "gox", version, about, after_help = OUTPUT_HELP)]
pub struct Cli {
    /// Output path template
    #[arg(long, value_name = "TEMPLATE")]
    pub output: Option<String>,
    /// Amount of parallelism, defaults to number of CPUs
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub parallel: Option<i64>,
    /// Operating systems to build for
    #[arg(long, value_name = "LIST")]
    pub os: Option<String>,
    /// Architectures to build for
    #[arg(long, value_name = "LIST")]
    pub arch: Option<String>,
    /// OS/arch pairs to build for
    #[arg(long, value_name = "LIST")]
    pub osarch: Option<String>,
    /// Linker flags passed to go build
    #[arg(long, value_name = "FLAGS", allow_hyphen_values = true)]
    pub ldflags: Option<String>,
    /// Build tags passed to go build
    #[arg(long, value_name = "TAGS")]
    pub tags: Option<String>,
    /// Build with cgo enabled
    #[arg(long, value_name = "BOOL", num_args = 0..=1, require_equals = true,
          default_missing_value = "true", value_parser = BoolishValueParser::new())]
    pub cgo: Option<bool>,
    /// Verbose logging
    #[arg(long, value_name = "BOOL", num_args = 0..=1, require_equals = true,
          default_missing_value = "true", value_parser = BoolishValueParser::new())]
    pub verbose: Option<bool>,
    /// Packages to build (default: the current directory)
    #[arg(value_name = "PACKAGES")]
    pub packages: Vec<String>,
}

/// Flags that take a value in the next argument when written without `=`.
/// Switches only take one as `-cgo=false`, like Go's `flag` package.
const VALUE_FLAGS: &[&str] = &["output", "parallel", "os", "arch", "osarch", "ldflags", "tags"];
const SWITCH_FLAGS: &[&str] = &["cgo", "verbose", "help", "version"];

/// Rewrite single-dash long flags (`-output=x`) as `--output=x`.
///
/// Stops at `--`. The argument following a value flag is left alone so
/// values such as `-ldflags -s` survive.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut out = Vec::new();
    let mut iter = args.into_iter().map(Into::into);
    if let Some(program) = iter.next() {
        out.push(program);
    }

    let mut passthrough = false;
    let mut value_next = false;
    for arg in iter {
        if passthrough || value_next {
            value_next = false;
            out.push(arg);
            continue;
        }
        let Some(s) = arg.to_str() else {
            out.push(arg);
            continue;
        };
        if s == "--" {
            passthrough = true;
            out.push(arg);
            continue;
        }

        let Some(flag) = s.strip_prefix("--").or_else(|| s.strip_prefix('-')) else {
            out.push(arg);
            continue;
        };
        let (name, has_value) = match flag.split_once('=') {
            Some((name, _)) => (name, true),
            None => (flag, false),
        };
        let known_value = VALUE_FLAGS.contains(&name);
        if !(known_value || SWITCH_FLAGS.contains(&name)) {
            out.push(arg);
            continue;
        }

        value_next = known_value && !has_value;
        if s.starts_with("--") {
            out.push(arg);
        } else {
            out.push(OsString::from(format!("-{s}")));
        }
    }
    out
}

impl Cli {
    /// Parse from raw process arguments, accepting Go-style flags.
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_args(args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(args: &[&str]) -> Vec<String> {
        normalize_args(args.iter().copied())
            .into_iter()
            .map(|s| s.into_string().unwrap())
            .collect()
    }

    #[test]
    fn single_dash_flags_are_doubled() {
        assert_eq!(
            norm(&["gox", "-output=bin/{{.OS}}", "-parallel", "4", "-cgo", "./cmd/..."]),
            ["gox", "--output=bin/{{.OS}}", "--parallel", "4", "--cgo", "./cmd/..."]
        );
    }

    #[test]
    fn values_after_flags_are_untouched() {
        assert_eq!(
            norm(&["gox", "-ldflags", "-verbose", "-os", "linux"]),
            ["gox", "--ldflags", "-verbose", "--os", "linux"]
        );
    }

    #[test]
    fn unknown_and_short_flags_pass_through() {
        assert_eq!(norm(&["gox", "-x", "-h", "--os=linux"]), ["gox", "-x", "-h", "--os=linux"]);
    }

    #[test]
    fn double_dash_stops_rewriting() {
        assert_eq!(norm(&["gox", "--", "-os"]), ["gox", "--", "-os"]);
    }

    #[test]
    fn parse_defaults() {
        let cli = Cli::try_parse_args(["gox"]).unwrap();
        assert_eq!(cli, Cli::default());
    }

    #[test]
    fn parse_go_style() {
        let cli = Cli::try_parse_args([
            "gox",
            "-output={{.Dir}}/{{.OS}}_{{.Arch}}",
            "-parallel=-1",
            "-osarch=linux/amd64 !windows/386",
            "-ldflags",
            "-s -w",
            "-verbose",
            "github.com/acme/app",
            "./cmd/tool",
        ])
        .unwrap();
        assert_eq!(cli.output.as_deref(), Some("{{.Dir}}/{{.OS}}_{{.Arch}}"));
        assert_eq!(cli.parallel, Some(-1));
        assert_eq!(cli.osarch.as_deref(), Some("linux/amd64 !windows/386"));
        assert_eq!(cli.ldflags.as_deref(), Some("-s -w"));
        assert_eq!(cli.verbose, Some(true));
        assert_eq!(cli.packages, ["github.com/acme/app", "./cmd/tool"]);
    }

    #[test]
    fn switches_take_an_explicit_value() {
        let cli = Cli::try_parse_args(["gox", "-cgo=false", "-verbose=1"]).unwrap();
        assert_eq!(cli.cgo, Some(false));
        assert_eq!(cli.verbose, Some(true));

        let cli = Cli::try_parse_args(["gox", "-cgo", "./cmd/tool"]).unwrap();
        assert_eq!(cli.cgo, Some(true));
        assert_eq!(cli.packages, ["./cmd/tool"]);

        assert_eq!(Cli::try_parse_args(["gox"]).unwrap().cgo, None);
        assert!(Cli::try_parse_args(["gox", "-cgo=maybe"]).is_err());
    }

    #[test]
    fn negative_parallel_as_separate_argument() {
        let cli = Cli::try_parse_args(["gox", "-parallel", "-1"]).unwrap();
        assert_eq!(cli.parallel, Some(-1));
    }

    #[test]
    fn bad_parallel_is_an_error() {
        assert!(Cli::try_parse_args(["gox", "-parallel=lots"]).is_err());
    }

    #[test]
    fn unknown_flag_is_an_error() {
        assert!(Cli::try_parse_args(["gox", "--nope"]).is_err());
    }
}
