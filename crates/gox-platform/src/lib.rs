//! Go target platform model and toolchain compatibility table for gox.
//!
//! A build target is an (OS, architecture) pair. Which pairs a Go toolchain
//! can produce depends on its version:
//! - **Platform / PlatformSet:** the target values and ordered, de-duplicated sets of them
//! - **GoVersion:** numeric `major.minor` ordering of toolchain version strings
//! - **Registry:** the version → platform increments and the supported-set query
//! - **Filter:** narrowing a supported set by `-os`, `-arch`, and `-osarch` selections

pub mod error;
pub mod filter;
pub mod platform;
pub mod registry;
pub mod version;

pub use error::{PlatformError, Result};
pub use filter::{split_list, PlatformFilter};
pub use platform::{Platform, PlatformSet};
pub use registry::{supported_platforms, PlatformIncrement, VersionPlatformTable};
pub use version::GoVersion;
