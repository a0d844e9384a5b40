//! Package discovery, output templating, and parallel build dispatch for gox.
//!
//! - [`discover`]: find the `main` packages behind the user's patterns
//! - [`template`]: render per-target output paths like `{{.Dir}}_{{.OS}}_{{.Arch}}`
//! - [`toolchain`]: the `go` command as a package lister and compiler
//! - [`dispatch`]: fan one build per (platform, package) out over a bounded pool

pub mod discover;
pub mod dispatch;
pub mod error;
pub mod template;
pub mod toolchain;

pub use discover::{resolve_main_packages, PackageLister};
pub use dispatch::{resolve_bound, BuildReport, BuildTask, Dispatcher, TaskFailure, TaskOutcome};
pub use error::{BuildError, Result, TemplateError};
pub use template::{OutputTemplate, TemplateData, DEFAULT_OUTPUT_TEMPLATE};
pub use toolchain::{CompileOptions, Compiler, GoTool};
