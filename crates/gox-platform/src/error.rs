//! Error types for platform and version operations.

/// Errors that can occur while parsing or selecting platforms.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// A platform string was not of the form `os/arch`.
    #[error("invalid platform '{input}': expected OS/ARCH (e.g. linux/amd64)")]
    InvalidPlatform {
        /// The rejected input.
        input: String,
    },

    /// A toolchain version string could not be parsed.
    #[error("invalid Go version '{input}'")]
    InvalidVersion {
        /// The rejected input.
        input: String,
    },

    /// A table increment was registered out of version order.
    #[error("platform increment for {next} must come after {previous}")]
    UnorderedIncrement {
        /// Newest version already in the table.
        previous: String,
        /// Version that was registered after it.
        next: String,
    },

    /// A filter entry names nothing the toolchain supports.
    #[error("'{item}' does not match any supported platform")]
    UnsupportedFilter {
        /// The filter entry, as given.
        item: String,
    },

    /// Filtering left nothing to build.
    #[error("no platforms selected to build for")]
    NoPlatformsSelected,
}

/// Result type for platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;
