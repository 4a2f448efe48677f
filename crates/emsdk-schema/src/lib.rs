//! Shared data types for emsdk.
//!
//! Everything in this crate is plain data: the on-disk manifest records, the
//! release/alias table, the host description used for compatibility checks,
//! and the numeric version ordering used across the tool.

pub mod arch;
pub mod manifest;
pub mod releases;
pub mod types;
pub mod version;

// Re-exports
pub use arch::*;
pub use manifest::{
    Category, InstallHook, InstalledCheckHook, ItemDef, ManifestDoc, UninstallHook,
    VersionFilter,
};
pub use releases::ReleasesInfo;
pub use types::*;
pub use version::{CmpOp, VersionKey, parse_emscripten_version, version_key};
