use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Error, Result, io_error};

#[derive(Debug, Clone, PartialEq)]
pub enum AssetSource {
    File(PathBuf),
    Content(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    /// Destination inside the assets directory, `/`-separated.
    pub destination: String,
    pub source: AssetSource,
    pub checksum: String,
}

impl Asset {
    pub fn from_file(path: &Path, relative_path: Option<&str>) -> Result<Self> {
        let bytes = fs::read(path).map_err(io_error(path))?;
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            destination: join_destination(relative_path, &filename),
            source: AssetSource::File(path.to_path_buf()),
            checksum: sha256_hex(&bytes),
        })
    }

    pub fn from_content(filename: &str, content: Vec<u8>) -> Self {
        Self {
            destination: filename.to_string(),
            checksum: sha256_hex(&content),
            source: AssetSource::Content(content),
        }
    }

    /// Copies or writes the asset below `root`.
    pub fn materialize(&self, root: &Path) -> Result<PathBuf> {
        let target = self
            .destination
            .split('/')
            .fold(root.to_path_buf(), |acc, part| acc.join(part));
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        match &self.source {
            AssetSource::File(path) => {
                fs::copy(path, &target).map_err(io_error(path))?;
            }
            AssetSource::Content(bytes) => {
                fs::write(&target, bytes).map_err(io_error(&target))?;
            }
        }
        Ok(target)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetCollection {
    assets: Vec<Asset>,
}

impl AssetCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn get(&self, destination: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.destination == destination)
    }

    /// Adds an asset; an identical asset at the same destination is ignored.
    pub fn add_asset(&mut self, asset: Asset) -> Result<()> {
        if let Some(existing) = self.get(&asset.destination) {
            if existing.checksum == asset.checksum {
                return Ok(());
            }
            return Err(Error::AssetConflict {
                destination: asset.destination,
                existing: existing.checksum.clone(),
                incoming: asset.checksum,
            });
        }
        debug!(destination = %asset.destination, checksum = %asset.checksum, "asset added");
        self.assets.push(asset);
        Ok(())
    }

    pub fn add_file(&mut self, path: &Path, relative_path: Option<&str>) -> Result<()> {
        self.add_asset(Asset::from_file(path, relative_path)?)
    }

    /// Adds every file below `dir`, keeping the directory structure under
    /// `relative_path`.
    pub fn add_directory(&mut self, dir: &Path, relative_path: Option<&str>) -> Result<()> {
        if !dir.is_dir() {
            return Err(Error::MissingAssetDirectory(dir.to_path_buf()));
        }
        let mut entries: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(io_error(dir))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()
            .map_err(io_error(dir))?;
        entries.sort();

        for path in entries {
            if path.is_dir() {
                let name = path
                    .file_name()
                    .map(|f| f.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let nested = join_destination(relative_path, &name);
                self.add_directory(&path, Some(&nested))?;
            } else {
                self.add_file(&path, relative_path)?;
            }
        }
        Ok(())
    }
}

fn join_destination(relative_path: Option<&str>, filename: &str) -> String {
    match relative_path.map(|p| p.trim_matches('/')) {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}/{filename}"),
        _ => filename.to_string(),
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
