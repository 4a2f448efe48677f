//! Filesystem helpers with emsdk's failure semantics.

use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Delete a directory tree, best effort.
///
/// On a permission error every entry is made writable and the removal is
/// retried once. Whatever still fails is logged and ignored.
pub fn remove_tree(path: &Path) {
    debug!("remove_tree({})", path.display());
    if fs::symlink_metadata(path).is_err() {
        return;
    }
    let first = remove_any(path);
    let Err(err) = first else { return };
    if err.kind() != io::ErrorKind::PermissionDenied {
        debug!("remove_tree failed, ignoring: {err}");
        return;
    }
    make_writable(path);
    if let Err(err) = remove_any(path) {
        debug!("remove_tree failed after clearing read-only bits, ignoring: {err}");
    }
}

fn remove_any(path: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

fn make_writable(path: &Path) {
    for entry in WalkDir::new(path).into_iter().filter_map(Result::ok) {
        if entry.path_is_symlink() {
            continue;
        }
        if let Ok(meta) = entry.metadata() {
            let mut perms = meta.permissions();
            if perms.readonly() {
                #[allow(clippy::permissions_set_readonly_false)]
                perms.set_readonly(false);
                let _ = fs::set_permissions(entry.path(), perms);
            }
        }
    }
}

/// Remove a single file if it exists.
pub fn rmfile(path: &Path) -> io::Result<()> {
    debug!("rmfile({})", path.display());
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// True if `path` is a directory with at least one entry.
pub fn is_nonempty_directory(path: &Path) -> bool {
    fs::read_dir(path).is_ok_and(|mut entries| entries.next().is_some())
}

/// Rename `src` to `dest`, deleting an existing `dest` file first.
pub fn move_with_overwrite(src: &Path, dest: &Path) -> io::Result<()> {
    if fs::symlink_metadata(dest).is_ok_and(|m| !m.is_dir()) {
        fs::remove_file(dest)?;
    }
    fs::rename(src, dest)
}

/// Move the contents of `src` into `dest`, merging directories and
/// overwriting files. `src` is consumed.
pub fn merge_into(src: &Path, dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        let is_dir = entry.file_type()?.is_dir();
        if is_dir && to.is_dir() {
            merge_into(&from, &to)?;
        } else {
            if is_dir && to.exists() {
                fs::remove_file(&to)?;
            } else if !is_dir && to.is_dir() {
                fs::remove_dir_all(&to)?;
            }
            move_with_overwrite(&from, &to)?;
        }
    }
    fs::remove_dir_all(src)
}

/// Copy a directory tree, replacing any existing destination.
pub fn replace_dir(src: &Path, dest: &Path) -> io::Result<()> {
    remove_tree(dest);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let options = fs_extra::dir::CopyOptions::new().copy_inside(true);
    fs_extra::dir::copy(src, dest, &options)
        .map(|_| ())
        .map_err(|e| io::Error::other(e.to_string()))
}

/// Copy a file and set its executable bit.
pub fn copy_executable(src: &Path, dest: &Path) -> io::Result<()> {
    fs::copy(src, dest)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(dest)?.permissions();
        perms.set_mode(perms.mode() | 0o111);
        fs::set_permissions(dest, perms)?;
    }
    Ok(())
}
