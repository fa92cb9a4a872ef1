//! Group discovery and group path parsing.
//!
//! Groups form a tree: `IW1` (swath) > `IW1/VV` (measurement) >
//! `IW1/VV/orbit` (metadata). A measurement group may be followed by a burst
//! selector, either a numeric index (`IW1/VV/3`) or a burst label
//! (`IW1/VV/R168-N459-E0115`).

use crate::core::metadata::MetadataKind;
use crate::io::manifest::{FileRoleEntry, SchemaType};
use crate::io::product::ProductSource;
use crate::types::{ProductType, SarError, SarResult};
use indexmap::IndexMap;
use regex::{Captures, Regex};

lazy_static::lazy_static! {
    static ref BURST_LABEL: Regex = Regex::new(r"^R\d{3}-[NS]\d{3}-[EW]\d{4}$").unwrap();
    static ref TEMPLATE_FIELD: Regex = Regex::new(r"\{(\w+)\}").unwrap();
}

/// Group key to the product files backing it, in insertion order.
///
/// Swath groups have no files; measurement groups list the measurement
/// raster first and the annotation second; metadata groups list one file.
pub type GroupTable = IndexMap<String, Vec<String>>;

/// Build the group table from the manifest file inventory.
///
/// With `check_files_exist` set, entries whose file is missing from the
/// product are skipped.
pub fn find_available_groups(
    files: &IndexMap<String, FileRoleEntry>,
    source: &ProductSource,
    product_type: ProductType,
    check_files_exist: bool,
) -> GroupTable {
    let mut groups = GroupTable::new();
    for (path, entry) in files {
        if check_files_exist && !source.exists(path) {
            log::debug!("Skipping missing product file {}", path);
            continue;
        }
        let swath = entry.swath.to_uppercase();
        let swath_pol = format!("{}/{}", swath, entry.polarization.to_uppercase());

        match entry.schema_type {
            SchemaType::Annotation => {
                groups.insert(swath, Vec::new());
                groups.entry(swath_pol.clone()).or_default().push(path.clone());
                for kind in MetadataKind::annotation_kinds(product_type) {
                    groups.insert(format!("{}/{}", swath_pol, kind.name()), vec![path.clone()]);
                }
            }
            SchemaType::Calibration => {
                groups.insert(format!("{}/{}", swath_pol, MetadataKind::Calibration.name()), vec![path.clone()]);
            }
            SchemaType::Noise => {
                for kind in [MetadataKind::NoiseRange, MetadataKind::NoiseAzimuth] {
                    groups.insert(format!("{}/{}", swath_pol, kind.name()), vec![path.clone()]);
                }
            }
            SchemaType::Measurement => {
                groups.entry(swath_pol).or_default().insert(0, path.clone());
            }
        }
    }
    log::debug!("Found {} groups", groups.len());
    groups
}

/// Strip a leading `/` and split off a trailing numeric burst index.
///
/// The index is only recognised directly below a measurement group, i.e.
/// when the remaining path has exactly one `/`.
pub fn normalise_group(group: Option<&str>) -> SarResult<(String, Option<usize>)> {
    let group = group.unwrap_or("");
    let group = group.strip_prefix('/').unwrap_or(group);

    if let Some((parent, last)) = group.rsplit_once('/') {
        let numeric = !last.is_empty() && last.chars().all(|c| c.is_ascii_digit());
        if parent.matches('/').count() == 1 && numeric {
            let index = last
                .parse::<usize>()
                .map_err(|e| SarError::Configuration(format!("invalid burst index {:?}: {}", last, e)))?;
            return Ok((parent.to_string(), Some(index)));
        }
    }
    Ok((group.to_string(), None))
}

/// Burst addressed through the group path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BurstSelector {
    Index(usize),
    Label(String),
}

/// A parsed group path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPath {
    /// Group key without any burst selector, "" for the root
    pub key: String,
    pub burst: Option<BurstSelector>,
}

impl GroupPath {
    pub fn parse(group: Option<&str>) -> SarResult<Self> {
        let (key, index) = normalise_group(group)?;
        if let Some(index) = index {
            return Ok(Self {
                key,
                burst: Some(BurstSelector::Index(index)),
            });
        }
        if let Some((parent, last)) = key.rsplit_once('/') {
            if parent.matches('/').count() == 1 && BURST_LABEL.is_match(last) {
                return Ok(Self {
                    key: parent.to_string(),
                    burst: Some(BurstSelector::Label(last.to_string())),
                });
            }
        }
        Ok(Self { key, burst: None })
    }

    /// 0 for the root, 1 for a swath, 2 for a measurement, 3 for metadata
    pub fn depth(&self) -> usize {
        if self.key.is_empty() {
            0
        } else {
            self.key.matches('/').count() + 1
        }
    }

    /// Metadata kind name of a depth 3 group
    pub fn metadata_name(&self) -> Option<&str> {
        if self.depth() == 3 {
            self.key.rsplit('/').next()
        } else {
            None
        }
    }

    /// Absolute group name, as stored in the `group` attribute
    pub fn absolute(&self) -> String {
        format!("/{}", self.key)
    }

    /// Keys strictly below this group, relative to it
    pub fn subgroups(&self, groups: &GroupTable) -> Vec<String> {
        if self.key.is_empty() {
            return groups.keys().cloned().collect();
        }
        let prefix = format!("{}/", self.key);
        groups
            .keys()
            .filter_map(|g| g.strip_prefix(&prefix))
            .map(str::to_string)
            .collect()
    }
}

/// Rename product files through a path template.
///
/// Recognised fields: `{dirname}`, `{path}`, `{type}`, `{prefix}`, `{swath}`,
/// `{polarization}`, `{date}` and `{ext}` (with its leading dot).
pub fn override_product_files(
    template: &str,
    files: &IndexMap<String, FileRoleEntry>,
) -> SarResult<IndexMap<String, FileRoleEntry>> {
    let mut overridden = IndexMap::new();
    for (path, entry) in files {
        let (dirname, basename) = path.rsplit_once('/').unwrap_or(("", path));
        let ext = basename.rfind('.').map(|i| &basename[i..]).unwrap_or("");

        let mut unknown: Option<String> = None;
        let renamed = TEMPLATE_FIELD.replace_all(template, |caps: &Captures| {
            let field = &caps[1];
            match field {
                "dirname" => dirname.to_string(),
                "path" => path.clone(),
                "type" => entry.schema_type.rep_id().to_string(),
                "prefix" => entry.prefix.clone(),
                "swath" => entry.swath.clone(),
                "polarization" => entry.polarization.clone(),
                "date" => entry.date.clone(),
                "ext" => ext.to_string(),
                _ => {
                    unknown.get_or_insert_with(|| field.to_string());
                    String::new()
                }
            }
        });
        if let Some(field) = unknown {
            return Err(SarError::Configuration(format!(
                "unknown field {{{}}} in product file template {:?}",
                field, template
            )));
        }
        overridden.insert(renamed.into_owned(), entry.clone());
    }
    Ok(overridden)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_normalise_group() {
        assert_eq!(normalise_group(None).unwrap(), ("".to_string(), None));
        assert_eq!(normalise_group(Some("/IW1/VV/0")).unwrap(), ("IW1/VV".to_string(), Some(0)));
        assert_eq!(normalise_group(Some("IW1/VV/orbit")).unwrap(), ("IW1/VV/orbit".to_string(), None));
        assert_eq!(normalise_group(Some("IW1/4")).unwrap(), ("IW1/4".to_string(), None));
        assert_eq!(normalise_group(Some("IW1/VV/orbit/2")).unwrap(), ("IW1/VV/orbit/2".to_string(), None));
    }

    #[test]
    fn test_group_path() {
        let path = GroupPath::parse(Some("IW2/VH/R168-N459-E0115")).unwrap();
        assert_eq!(path.key, "IW2/VH");
        assert_eq!(path.burst, Some(BurstSelector::Label("R168-N459-E0115".to_string())));
        assert_eq!(path.depth(), 2);

        let path = GroupPath::parse(Some("/IW2/VH/gcp")).unwrap();
        assert_eq!(path.depth(), 3);
        assert_eq!(path.metadata_name(), Some("gcp"));
        assert_eq!(path.absolute(), "/IW2/VH/gcp");
        assert_eq!(GroupPath::parse(None).unwrap().depth(), 0);
    }

    fn entry(schema_type: SchemaType, prefix: &str, pol: &str) -> FileRoleEntry {
        FileRoleEntry {
            schema_type,
            prefix: prefix.to_string(),
            swath: "iw1".to_string(),
            polarization: pol.to_string(),
            date: "20210401t052624".to_string(),
        }
    }

    fn inventory() -> IndexMap<String, FileRoleEntry> {
        let mut files = IndexMap::new();
        files.insert("./annotation/s1b-iw1-slc-vv.xml".to_string(), entry(SchemaType::Annotation, "", "vv"));
        files.insert(
            "./annotation/calibration/calibration-s1b-iw1-slc-vv.xml".to_string(),
            entry(SchemaType::Calibration, "calibration", "vv"),
        );
        files.insert(
            "./annotation/calibration/noise-s1b-iw1-slc-vv.xml".to_string(),
            entry(SchemaType::Noise, "noise", "vv"),
        );
        files.insert("./measurement/s1b-iw1-slc-vv.tiff".to_string(), entry(SchemaType::Measurement, "", "vv"));
        files
    }

    #[test]
    fn test_find_available_groups() {
        let source = ProductSource::Directory {
            root: PathBuf::from("/nonexistent"),
        };
        let groups = find_available_groups(&inventory(), &source, ProductType::Slc, false);
        assert_eq!(groups["IW1"], Vec::<String>::new());
        assert_eq!(
            groups["IW1/VV"],
            vec!["./measurement/s1b-iw1-slc-vv.tiff", "./annotation/s1b-iw1-slc-vv.xml"]
        );
        for name in ["orbit", "attitude", "gcp", "calibration", "noise_range", "noise_azimuth", "antenna_pattern"] {
            assert!(groups.contains_key(&format!("IW1/VV/{}", name)), "missing {}", name);
        }
        assert!(!groups.contains_key("IW1/VV/coordinate_conversion"));

        let grd = find_available_groups(&inventory(), &source, ProductType::Grd, false);
        assert!(grd.contains_key("IW1/VV/coordinate_conversion"));
        assert!(!grd.contains_key("IW1/VV/antenna_pattern"));

        let checked = find_available_groups(&inventory(), &source, ProductType::Slc, true);
        assert!(checked.is_empty());

        let root = GroupPath::parse(Some("IW1")).unwrap();
        assert!(root.subgroups(&groups).contains(&"VV/orbit".to_string()));
    }

    #[test]
    fn test_override_product_files() {
        let files = override_product_files("{dirname}/{prefix}{swath}-{polarization}{ext}", &inventory()).unwrap();
        let keys: Vec<&String> = files.keys().collect();
        assert_eq!(keys[0], "./annotation/iw1-vv.xml");
        assert_eq!(keys[1], "./annotation/calibration/calibrationiw1-vv.xml");
        assert_eq!(keys[3], "./measurement/iw1-vv.tiff");

        assert!(override_product_files("{bogus}", &inventory()).is_err());
    }
}
