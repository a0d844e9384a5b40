//! Error types for discovery, templating, and toolchain operations.

/// Errors raised before builds are dispatched.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The `go` executable could not be started.
    #[error("go executable must be on the PATH")]
    ToolchainNotFound,

    /// The toolchain did not report a usable version.
    #[error("error reading Go version: {detail}")]
    VersionUnreadable {
        /// What went wrong.
        detail: String,
    },

    /// Listing packages failed.
    #[error("error reading packages: {detail}")]
    Resolution {
        /// The lister's error output.
        detail: String,
    },

    /// The worker pool could not be created.
    #[error("failed to start build workers: {detail}")]
    WorkerPool {
        /// Reason reported by the thread pool.
        detail: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors in an output path template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// An action was opened with `{{` but never closed.
    #[error("template: unclosed action starting at offset {offset}")]
    Unclosed {
        /// Byte offset of the opening `{{`.
        offset: usize,
    },

    /// An action that is not a field reference, such as `{{}}` or `{{Dir}}`.
    #[error("template: bad action {{{{{action}}}}}: expected a field like {{{{.OS}}}}")]
    BadAction {
        /// The action text between the braces.
        action: String,
    },

    /// A field reference that the template data does not provide.
    #[error("template: unknown field .{field} (available: .Dir, .OS, .Arch)")]
    UnknownField {
        /// Field name without the leading dot.
        field: String,
    },
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;
