use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::info;

use crate::assets::sha256_hex;
use crate::error::{Error, Result, io_error};
use crate::manifest::{EngineSource, Manifest};

/// Makes sure the engine named in the manifest is on disk and executable.
pub fn setup(manifest: &Manifest) -> Result<PathBuf> {
    let path = &manifest.eradication_path;
    if path.is_file() {
        make_executable(path)?;
        info!(engine = %path.display(), "using existing engine");
        return Ok(path.clone());
    }

    let Some(source) = &manifest.engine else {
        return Err(Error::MissingEngine(path.clone()));
    };
    download(source, path)?;
    make_executable(path)?;
    Ok(path.clone())
}

fn download(source: &EngineSource, path: &Path) -> Result<()> {
    info!(url = %source.url, engine = %path.display(), "downloading engine");
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(io_error(parent))?;

    // Staged next to the target; dropped (and deleted) unless persisted.
    let mut staged = NamedTempFile::new_in(parent).map_err(io_error(parent))?;
    let mut response = ureq::get(source.url.as_str()).call()?;
    io::copy(&mut response.body_mut().as_reader(), staged.as_file_mut()).map_err(io_error(path))?;

    if let Some(expected) = &source.sha256 {
        let bytes = fs::read(staged.path()).map_err(io_error(staged.path()))?;
        verify_checksum(path, &bytes, expected)?;
    }

    staged.persist(path).map_err(|e| Error::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Fails when the SHA-256 of `bytes` differs from `expected`.
pub fn verify_checksum(path: &Path, bytes: &[u8], expected: &str) -> Result<()> {
    let actual = sha256_hex(bytes);
    if actual.eq_ignore_ascii_case(expected) {
        return Ok(());
    }
    Err(Error::ChecksumMismatch {
        path: path.to_path_buf(),
        expected: expected.to_string(),
        actual,
    })
}

#[cfg(unix)]
pub(crate) fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path).map_err(io_error(path))?.permissions();
    permissions.set_mode(permissions.mode() | 0o755);
    fs::set_permissions(path, permissions).map_err(io_error(path))
}

#[cfg(not(unix))]
pub(crate) fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
