//! Single entry point: open any group of a Sentinel-1 SAFE product.

use crate::core::burst::{crop_burst_dataset, BurstQuery};
use crate::core::conventions;
use crate::core::footprint::burst_labels;
use crate::core::groups::{find_available_groups, override_product_files, BurstSelector, GroupPath, GroupTable};
use crate::core::measurement::open_pol_dataset;
use crate::core::metadata::MetadataKind;
use crate::dataset::Dataset;
use crate::io::manifest::{FileRoleEntry, Manifest, SchemaType};
use crate::io::product::ProductSource;
use crate::io::raster::{GdalRasterReader, RasterReader};
use crate::types::{AttrValue, Attrs, SarError, SarResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Options for [`open_sentinel1_dataset`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenOptions {
    /// Group path, e.g. `IW1/VV`, `IW1/VV/orbit` or `IW1/VV/3`; root when unset
    pub group: Option<String>,
    /// Skip manifest entries whose file is missing from the product
    pub check_files_exist: bool,
    /// Template renaming the product files listed in the manifest
    pub override_product_files: Option<String>,
    /// Read the geolocation grid to add footprint attributes to measurements
    pub parse_geospatial_attrs: bool,
    /// Lines per chunk hint, recorded in the measurement encoding
    pub chunks: Option<usize>,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            group: None,
            check_files_exist: false,
            override_product_files: None,
            parse_geospatial_attrs: true,
            chunks: None,
        }
    }
}

impl OpenOptions {
    pub fn with_group(group: &str) -> Self {
        Self {
            group: Some(group.to_string()),
            ..Default::default()
        }
    }
}

/// Open a product group, reading rasters through GDAL
pub fn open_sentinel1_dataset(location: &str, options: &OpenOptions) -> SarResult<Dataset> {
    open_sentinel1_dataset_with_reader(location, options, &GdalRasterReader::new())
}

/// Files of a group with the given role
fn group_file<'a>(
    group: &GroupPath,
    groups: &'a GroupTable,
    files: &IndexMap<String, FileRoleEntry>,
    schema_type: SchemaType,
) -> SarResult<&'a str> {
    groups
        .get(&group.key)
        .into_iter()
        .flatten()
        .find(|path| files.get(*path).map(|e| e.schema_type) == Some(schema_type))
        .map(String::as_str)
        .ok_or_else(|| SarError::GroupUnavailable {
            group: group.absolute(),
            path: format!("{} file", schema_type.rep_id()),
        })
}

fn unavailable(group: &GroupPath) -> impl Fn(SarError) -> SarError + '_ {
    move |e| match e {
        SarError::NotFound(path) => SarError::GroupUnavailable {
            group: group.absolute(),
            path,
        },
        other => other,
    }
}

/// Open a product group with a caller supplied raster reader.
///
/// The root and swath groups only carry the product attributes, measurement
/// groups (`SWATH/POL`) carry the image, optionally cropped to one burst, and
/// metadata groups (`SWATH/POL/<kind>`) carry the annotation tables.
pub fn open_sentinel1_dataset_with_reader(
    location: &str,
    options: &OpenOptions,
    reader: &dyn RasterReader,
) -> SarResult<Dataset> {
    let source = ProductSource::resolve(location)?;
    let manifest = Manifest::parse(&source.read_manifest()?)?;
    let files = match &options.override_product_files {
        Some(template) => override_product_files(template, &manifest.files)?,
        None => manifest.files.clone(),
    };
    let product_type = manifest.attributes.product_type;
    let groups = find_available_groups(&files, &source, product_type, options.check_files_exist);

    let group = GroupPath::parse(options.group.as_deref())?;
    if !group.key.is_empty() && !groups.contains_key(&group.key) {
        return Err(SarError::GroupNotFound {
            group: group.key,
            available: groups.keys().cloned().collect(),
        });
    }
    log::info!("Opening group {} of {}", group.absolute(), location);

    let common_attrs: Attrs = manifest.attributes.to_attrs();
    let mut gcp: Option<Dataset> = None;
    let mut metadata_name = "";

    let mut ds = match group.depth() {
        0 | 1 => Dataset::new(common_attrs.clone()),
        2 => {
            let annotation = group_file(&group, &groups, &files, SchemaType::Annotation)?;
            let measurement = group_file(&group, &groups, &files, SchemaType::Measurement)?;
            if options.parse_geospatial_attrs || matches!(group.burst, Some(BurstSelector::Label(_))) {
                gcp = Some(
                    MetadataKind::Gcp
                        .build(&source, annotation, common_attrs.clone())
                        .map_err(unavailable(&group))?,
                );
            }
            let geospatial = if options.parse_geospatial_attrs { gcp.as_ref() } else { None };
            let mut ds = open_pol_dataset(&source, measurement, annotation, reader, common_attrs.clone(), geospatial)
                .map_err(unavailable(&group))?;
            if let (Some(lines), Some(variable)) = (options.chunks, ds.data_vars.get_mut("measurement")) {
                variable.encoding.insert("chunks".into(), lines.into());
            }
            ds
        }
        _ => {
            let name = group.metadata_name().unwrap_or_default();
            let kind: MetadataKind = name.parse()?;
            metadata_name = kind.name();
            let path = groups
                .get(&group.key)
                .and_then(|paths| paths.first())
                .ok_or_else(|| SarError::GroupUnavailable {
                    group: group.absolute(),
                    path: String::new(),
                })?;
            kind.build(&source, path, common_attrs.clone())
                .map_err(unavailable(&group))?
        }
    };

    ds.attrs.insert("group".into(), group.absolute().into());
    let subgroups = group.subgroups(&groups);
    if !subgroups.is_empty() {
        ds.attrs.insert("subgroups".into(), AttrValue::StrList(subgroups));
    }

    if let Some(selector) = &group.burst {
        let query = match selector {
            BurstSelector::Index(index) => BurstQuery::index(*index as i64),
            BurstSelector::Label(label) => {
                let gcp = gcp
                    .as_ref()
                    .ok_or_else(|| SarError::Processing("burst labels need the geolocation grid".to_string()))?;
                let labels = burst_labels(gcp, manifest.attributes.relative_orbit)?;
                let index = labels.iter().position(|l| l == label).ok_or_else(|| SarError::BurstIdNotFound {
                    id: label.clone(),
                    available: labels.clone(),
                })?;
                BurstQuery::index(index as i64)
            }
        };
        let footprint_grid = if options.parse_geospatial_attrs { gcp.as_ref() } else { None };
        ds = crop_burst_dataset(&ds, &query, footprint_grid)?;
    }

    conventions::update_attributes(&mut ds, metadata_name);
    Ok(ds)
}
