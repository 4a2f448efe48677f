//! Loading the alias/release table and the installed-SDK stamp.

use crate::error::{Error, Result};
use crate::paths::Layout;
use emsdk_schema::ReleasesInfo;
use std::fs;

/// Read `emscripten-releases-tags.json` from the root.
pub fn load_releases_info(layout: &Layout) -> Result<ReleasesInfo> {
    let path = layout.releases_tags_path();
    let text = fs::read_to_string(&path).map_err(|e| Error::Releases(format!("{}: {e}", path.display())))?;
    ReleasesInfo::from_json(&text).map_err(|e| Error::Releases(e.to_string()))
}

/// Hash of the release SDK currently installed under `upstream/`, read from
/// its stamp (`releases-<hash>-64bit`).
pub fn installed_sdk_version(layout: &Layout) -> Option<String> {
    let text = fs::read_to_string(layout.upstream_stamp_path()).ok()?;
    text.trim().split('-').nth(1).map(str::to_string)
}
