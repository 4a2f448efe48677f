use std::path::{Path, PathBuf};

/// On-disk layout of an emsdk root directory.
///
/// Every relative path in the manifest is resolved against the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Root directory with forward slashes, the form used for prefix
    /// comparisons against `PATH` entries and config values.
    pub fn root_str(&self) -> String {
        to_unix_path(&self.root.to_string_lossy())
    }

    /// Resolve `rel` against the root; absolute paths pass through.
    pub fn sdk_path(&self, rel: impl AsRef<Path>) -> PathBuf {
        let rel = rel.as_ref();
        if rel.is_absolute() {
            rel.to_path_buf()
        } else {
            self.root.join(rel)
        }
    }

    /// Download cache: `<root>/downloads`
    pub fn downloads_dir(&self) -> PathBuf {
        self.root.join("downloads")
    }

    /// Persisted activation config: `<root>/.emscripten`
    pub fn config_path(&self) -> PathBuf {
        self.root.join(".emscripten")
    }

    /// Previous activation config: `<root>/.emscripten.old`
    pub fn config_backup_path(&self) -> PathBuf {
        self.root.join(".emscripten.old")
    }

    /// Sanity cache written by emscripten itself.
    pub fn sanity_path(&self) -> PathBuf {
        self.root.join(".emscripten_sanity")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join("emsdk_manifest.json")
    }

    pub fn releases_tags_path(&self) -> PathBuf {
        self.root.join("emscripten-releases-tags.json")
    }

    pub fn legacy_emscripten_tags_path(&self) -> PathBuf {
        self.root.join("legacy-emscripten-tags.txt")
    }

    pub fn legacy_binaryen_tags_path(&self) -> PathBuf {
        self.root.join("legacy-binaryen-tags.txt")
    }

    pub fn llvm_tags_64bit_path(&self) -> PathBuf {
        self.root.join("llvm-tags-64bit.txt")
    }

    /// Version stamp of the installed release SDK.
    pub fn upstream_stamp_path(&self) -> PathBuf {
        self.root.join("upstream").join(STAMP_FILE)
    }

    /// Emscripten tree of the installed release SDK.
    pub fn upstream_emscripten_dir(&self) -> PathBuf {
        self.root.join("upstream").join("emscripten")
    }

    /// Local clone of the emscripten-releases repository.
    pub fn releases_repo_dir(&self) -> PathBuf {
        self.root.join("releases")
    }

    /// Whether the root itself is a git checkout.
    pub fn is_git_checkout(&self) -> bool {
        self.root.join(".git").exists()
    }
}

/// Name of the per-install version stamp.
pub const STAMP_FILE: &str = ".emsdk_version";

/// Directory holding the running executable, used as the default root.
pub fn default_root() -> std::io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let exe = exe.canonicalize().unwrap_or(exe);
    Ok(exe
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf))
}

/// Extract the filename from a URL.
pub fn filename_from_url(url: &str) -> &str {
    url.split('/').next_back().unwrap_or("")
}

/// Replace backslashes with forward slashes.
pub fn to_unix_path(p: &str) -> String {
    p.replace('\\', "/")
}

/// Convert to the separator convention of the host.
pub fn to_native_path(p: &str, windows: bool) -> String {
    let unix = to_unix_path(p);
    if windows { unix.replace('/', "\\") } else { unix }
}

/// Guess from the string alone whether `path` names a directory.
///
/// `a/b/c` and `clang-3.2` are directories; only `.exe`, `.zip` and `.txt`
/// suffixes mark a file.
pub fn path_points_to_directory(path: &str) -> bool {
    if path == "." {
        return true;
    }
    let last_slash = path.rfind(['/', '\\']);
    let last_dot = path.rfind('.');
    match (last_dot, last_slash) {
        (None, _) => true,
        (Some(dot), Some(slash)) if dot < slash => true,
        (Some(dot), _) => !matches!(&path[dot..], ".exe" | ".zip" | ".txt"),
    }
}
