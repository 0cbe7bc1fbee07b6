//! Paths and platform profiles for a run, read from a TOML manifest.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result, io_error};

/// Where to fetch the engine binary when it is not on disk.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineSource {
    pub url: String,
    pub sha256: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    eradication_path: PathBuf,
    schema_file: PathBuf,
    sif_path: Option<PathBuf>,
    input_dir: PathBuf,
    job_directory: PathBuf,
    climate_dir: Option<PathBuf>,
    engine: Option<EngineSource>,
    #[serde(default)]
    platform: toml::Table,
    #[serde(flatten)]
    sections: toml::Table,
}

#[derive(Debug, Clone)]
pub struct Manifest {
    pub eradication_path: PathBuf,
    pub schema_file: PathBuf,
    pub sif_path: Option<PathBuf>,
    pub input_dir: PathBuf,
    pub job_directory: PathBuf,
    pub climate_dir: PathBuf,
    pub engine: Option<EngineSource>,
    platforms: toml::Table,
    sections: toml::Table,
    source: PathBuf,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(io_error(path))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut manifest = Self::from_toml_str(&raw, base_dir).map_err(|source| Error::Manifest {
            path: path.to_path_buf(),
            source,
        })?;
        manifest.source = path.to_path_buf();
        Ok(manifest)
    }

    /// Parses a manifest, resolving relative paths against `base_dir`.
    pub fn from_toml_str(raw: &str, base_dir: &Path) -> std::result::Result<Self, toml::de::Error> {
        let manifest: RawManifest = toml::from_str(raw)?;
        let resolve = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                base_dir.join(p)
            }
        };

        let input_dir = resolve(&manifest.input_dir);
        let climate_dir = match &manifest.climate_dir {
            Some(dir) => resolve(dir),
            None => input_dir.join("example_weather").join("out"),
        };

        Ok(Self {
            eradication_path: resolve(&manifest.eradication_path),
            schema_file: resolve(&manifest.schema_file),
            sif_path: manifest.sif_path.as_deref().map(resolve),
            input_dir,
            job_directory: resolve(&manifest.job_directory),
            climate_dir,
            engine: manifest.engine,
            platforms: manifest.platform,
            sections: manifest.sections,
            source: PathBuf::from("<inline>"),
        })
    }

    /// Profile for `name`, falling back to `default`, then the first profile.
    pub fn platform_profile(&self, name: &str) -> Option<&toml::Value> {
        self.platforms
            .get(name)
            .or_else(|| self.platforms.get("default"))
            .or_else(|| self.platforms.values().next())
    }

    pub fn platform_profile_as<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let profile = self
            .platform_profile(name)
            .ok_or_else(|| Error::MissingProfile(name.to_string()))?;
        profile.clone().try_into().map_err(|source| Error::Manifest {
            path: self.source.clone(),
            source,
        })
    }

    /// Deserializes an application-specific top-level table, if present.
    pub fn section<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        self.sections
            .get(name)
            .map(|value| {
                value.clone().try_into().map_err(|source| Error::Manifest {
                    path: self.source.clone(),
                    source,
                })
            })
            .transpose()
    }
}
