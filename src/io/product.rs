//! Locating a SAFE product and reading the files it lists.
//!
//! A product can be an unpacked `.SAFE` directory, the `manifest.safe` file
//! inside one, a `.zip` archive, or an HTTP(S) URL. File paths taken from the
//! manifest (`./annotation/...`) are resolved relative to the product root.

use crate::types::{SarError, SarResult};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

pub const MANIFEST_NAME: &str = "manifest.safe";

/// Where the files of a product live
#[derive(Debug, Clone)]
pub enum ProductSource {
    /// Unpacked `.SAFE` directory
    Directory { root: PathBuf },
    /// Zip archive; `prefix` is the folder holding `manifest.safe` inside it
    Zip { archive: PathBuf, prefix: String },
    /// Product served over HTTP(S)
    Remote {
        base_url: String,
        client: reqwest::blocking::Client,
    },
}

fn normalise_member(path: &str) -> &str {
    path.trim_start_matches("./").trim_start_matches('/')
}

fn has_glob_magic(path: &str) -> bool {
    path.contains(['*', '?', '['])
}

/// Expand a glob pattern that must match exactly one path
fn resolve_glob(pattern: &str) -> SarResult<PathBuf> {
    let paths = glob::glob(pattern)
        .map_err(|e| SarError::Configuration(format!("Invalid path pattern {:?}: {}", pattern, e)))?;
    let mut matches = Vec::new();
    for entry in paths {
        matches.push(entry.map_err(|e| SarError::Io(e.into_error()))?);
    }
    match matches.len() {
        0 => Err(SarError::NotFound(pattern.to_string())),
        1 => Ok(matches.remove(0)),
        _ => Err(SarError::MultipleFound(pattern.to_string())),
    }
}

fn zip_contains(archive: &Path, name: &str) -> bool {
    let mut zip = match File::open(archive).ok().and_then(|f| ZipArchive::new(f).ok()) {
        Some(zip) => zip,
        None => return false,
    };
    let found = zip.by_name(name).is_ok();
    found
}

impl ProductSource {
    /// Resolve a user supplied product location
    pub fn resolve(location: &str) -> SarResult<Self> {
        if location.starts_with("http://") || location.starts_with("https://") {
            let base = location.trim_end_matches('/');
            let base = base.strip_suffix(MANIFEST_NAME).unwrap_or(base).trim_end_matches('/');
            log::info!("Using remote product at {}", base);
            return Ok(ProductSource::Remote {
                base_url: base.to_string(),
                client: reqwest::blocking::Client::new(),
            });
        }

        let path = if has_glob_magic(location) {
            resolve_glob(location)?
        } else {
            PathBuf::from(location)
        };
        Self::from_path(&path)
    }

    fn from_path(path: &Path) -> SarResult<Self> {
        if !path.exists() {
            return Err(SarError::NotFound(path.display().to_string()));
        }

        if path.is_dir() {
            return Ok(ProductSource::Directory {
                root: path.to_path_buf(),
            });
        }

        let is_zip = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("zip"))
            .unwrap_or(false);

        if is_zip {
            let file = File::open(path)?;
            let archive = ZipArchive::new(file)
                .map_err(|e| SarError::InvalidFormat(format!("Failed to open ZIP archive: {}", e)))?;
            let manifests: Vec<&str> = archive
                .file_names()
                .filter(|name| name.ends_with(MANIFEST_NAME))
                .collect();
            return match manifests.as_slice() {
                [] => Err(SarError::NotFound(format!("{}/{}", path.display(), MANIFEST_NAME))),
                [manifest] => Ok(ProductSource::Zip {
                    archive: path.to_path_buf(),
                    prefix: manifest[..manifest.len() - MANIFEST_NAME.len()].to_string(),
                }),
                _ => Err(SarError::MultipleFound(format!("{}/*/{}", path.display(), MANIFEST_NAME))),
            };
        }

        // a file inside the product, normally manifest.safe itself
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(ProductSource::Directory { root })
    }

    /// Human readable location of a product member, also used as cache key
    pub fn location(&self, member: &str) -> String {
        let member = normalise_member(member);
        match self {
            ProductSource::Directory { root } => root.join(member).display().to_string(),
            ProductSource::Zip { archive, prefix } => {
                format!("{}!{}{}", archive.display(), prefix, member)
            }
            ProductSource::Remote { base_url, .. } => format!("{}/{}", base_url, member),
        }
    }

    /// Path that GDAL understands, using its virtual file systems when needed
    pub fn raster_path(&self, member: &str) -> String {
        let member = normalise_member(member);
        match self {
            ProductSource::Directory { root } => root.join(member).display().to_string(),
            ProductSource::Zip { archive, prefix } => {
                format!("/vsizip/{}/{}{}", archive.display(), prefix, member)
            }
            ProductSource::Remote { base_url, .. } => format!("/vsicurl/{}/{}", base_url, member),
        }
    }

    pub fn exists(&self, member: &str) -> bool {
        let member = normalise_member(member);
        match self {
            ProductSource::Directory { root } => root.join(member).is_file(),
            ProductSource::Zip { archive, prefix } => zip_contains(archive, &format!("{}{}", prefix, member)),
            ProductSource::Remote { base_url, client } => client
                .head(format!("{}/{}", base_url, member))
                .send()
                .map(|r| r.status().is_success())
                .unwrap_or(false),
        }
    }

    pub fn read_to_string(&self, member: &str) -> SarResult<String> {
        let member = normalise_member(member);
        match self {
            ProductSource::Directory { root } => {
                let path = root.join(member);
                if !path.is_file() {
                    return Err(SarError::NotFound(path.display().to_string()));
                }
                Ok(std::fs::read_to_string(path)?)
            }
            ProductSource::Zip { archive, prefix } => {
                let file = File::open(archive)?;
                let mut zip = ZipArchive::new(file)
                    .map_err(|e| SarError::InvalidFormat(format!("Failed to open ZIP archive: {}", e)))?;
                let name = format!("{}{}", prefix, member);
                let mut entry = zip
                    .by_name(&name)
                    .map_err(|_| SarError::NotFound(format!("{}!{}", archive.display(), name)))?;
                let mut content = String::new();
                entry.read_to_string(&mut content)?;
                Ok(content)
            }
            ProductSource::Remote { base_url, client } => {
                let url = format!("{}/{}", base_url, member);
                log::debug!("Fetching {}", url);
                let response = client
                    .get(&url)
                    .send()
                    .map_err(|e| SarError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
                if response.status() == reqwest::StatusCode::NOT_FOUND {
                    return Err(SarError::NotFound(url));
                }
                let response = response
                    .error_for_status()
                    .map_err(|e| SarError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
                response
                    .text()
                    .map_err(|e| SarError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))
            }
        }
    }

    pub fn read_manifest(&self) -> SarResult<String> {
        self.read_to_string(MANIFEST_NAME)
    }
}
