//! Archive extraction module
//!
//! Handles zip, tar.gz and plain tar in-process; xz and bzip2 tarballs go
//! through the system `tar`.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::fsutil::merge_into;
use crate::interrupt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
    Tar,
    TarXz,
    TarBz2,
}

/// Detect archive format from file extension
pub fn detect_format(path: &Path) -> Option<ArchiveFormat> {
    let path_str = path.to_string_lossy().to_lowercase();

    if path_str.ends_with(".zip") {
        Some(ArchiveFormat::Zip)
    } else if path_str.ends_with(".tar.gz") || path_str.ends_with(".tgz") {
        Some(ArchiveFormat::TarGz)
    } else if path_str.ends_with(".tar") {
        Some(ArchiveFormat::Tar)
    } else if path_str.ends_with(".tar.xz") || path_str.ends_with(".xz") {
        Some(ArchiveFormat::TarXz)
    } else if path_str.ends_with(".tbz2") || path_str.ends_with(".bz2") {
        Some(ArchiveFormat::TarBz2)
    } else {
        None
    }
}

/// Unpack `archive` into `dest`, merging with whatever is already there.
///
/// Contents are staged next to `dest` first. When the archive wraps
/// everything in one top-level directory, that directory is stripped.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    let fail = |reason: String| Error::Extract {
        path: archive.to_path_buf(),
        reason,
    };
    let format = detect_format(archive).ok_or_else(|| fail("unrecognised archive type".to_string()))?;

    let parent = dest.parent().unwrap_or(dest);
    fs::create_dir_all(parent).map_err(|e| Error::io_at(parent, &e))?;
    let staging = tempfile::Builder::new()
        .prefix(".emsdk-extract-")
        .tempdir_in(parent)?;

    debug!("unpacking {} ({format:?}) into {}", archive.display(), staging.path().display());
    match format {
        ArchiveFormat::Zip => extract_zip(archive, staging.path()),
        ArchiveFormat::TarGz => {
            let file = File::open(archive)?;
            extract_tar(flate2::read::GzDecoder::new(BufReader::new(file)), staging.path())
        }
        ArchiveFormat::Tar => {
            let file = File::open(archive)?;
            extract_tar(BufReader::new(file), staging.path())
        }
        ArchiveFormat::TarXz | ArchiveFormat::TarBz2 => extract_with_system_tar(archive, staging.path()),
    }
    .map_err(|e| match e {
        Error::Io(io) => fail(io.to_string()),
        other => other,
    })?;

    let root = strip_components(staging.path())?;
    merge_into(&root, dest).map_err(|e| Error::io_at(dest, &e))?;
    Ok(())
}

/// Extract a tar archive from a reader
fn extract_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);
    for entry in archive.entries()? {
        interrupt::check()?;
        entry?.unpack_in(dest_dir)?;
    }
    Ok(())
}

/// Extract a zip archive
fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let fail = |reason: String| Error::Extract {
        path: archive_path.to_path_buf(),
        reason,
    };
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| fail(e.to_string()))?;

    for i in 0..archive.len() {
        interrupt::check()?;
        let mut file = archive.by_index(i).map_err(|e| fail(e.to_string()))?;
        let Some(relative_path) = file.enclosed_name() else {
            continue;
        };
        let absolute_path = dest_dir.join(&relative_path);

        if file.is_dir() {
            fs::create_dir_all(&absolute_path)?;
            continue;
        }
        if let Some(p) = absolute_path.parent() {
            fs::create_dir_all(p)?;
        }

        let mut outfile = File::create(&absolute_path)?;
        io::copy(&mut file, &mut outfile)?;

        #[cfg(unix)]
        if let Some(mode) = file.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&absolute_path, fs::Permissions::from_mode(mode))?;
        }
    }

    Ok(())
}

fn extract_with_system_tar(archive: &Path, dest_dir: &Path) -> Result<()> {
    interrupt::check()?;
    let status = Command::new("tar")
        .arg("-xf")
        .arg(archive)
        .arg("-C")
        .arg(dest_dir)
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| Error::MissingProgram(format!("could not run tar: {e}")))?;

    if !status.success() {
        return Err(Error::Extract {
            path: archive.to_path_buf(),
            reason: format!("tar exited with {status}"),
        });
    }
    Ok(())
}

/// If `dir` holds exactly one entry and it is a directory, return that
/// directory; otherwise `dir` itself.
pub fn strip_components(dir: &Path) -> io::Result<PathBuf> {
    let entries: Vec<_> = fs::read_dir(dir)?.filter_map(|e| e.ok()).collect();

    if entries.len() == 1 && entries[0].file_type()?.is_dir() {
        return Ok(entries[0].path());
    }
    Ok(dir.to_path_buf())
}
