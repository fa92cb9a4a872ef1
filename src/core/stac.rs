//! STAC item for a product, built from the manifest and the first annotation file.
//!
//! The item carries the `product`, `processing`, `sat`, `view`, `sar` and
//! `eopf` extension properties. Its geometry is the manifest footprint.

use crate::core::footprint::make_geospatial_attributes;
use crate::io::annotation::{parse_record, ImageInformation, ProductInformation};
use crate::io::manifest::{Manifest, SchemaType};
use crate::io::product::ProductSource;
use crate::types::{SarError, SarResult};
use indexmap::IndexMap;
use serde::Serialize;

pub const STAC_VERSION: &str = "1.1.0";

pub const STAC_EXTENSIONS: [&str; 6] = [
    "https://stac-extensions.github.io/product/v0.1.0/schema.json",
    "https://stac-extensions.github.io/processing/v1.2.0/schema.json",
    "https://stac-extensions.github.io/sat/v1.0.0/schema.json",
    "https://stac-extensions.github.io/view/v1.0.0/schema.json",
    "https://stac-extensions.github.io/sar/v1.2.0/schema.json",
    "https://cs-si.github.io/eopf-stac-extension/v1.2.0/schema.json",
];

/// GeoJSON polygon with a single closed (lon, lat) ring
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub geometry_type: String,
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StacProperties {
    /// Always null: the item covers `start_datetime..end_datetime`
    pub datetime: Option<String>,
    pub start_datetime: String,
    pub end_datetime: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    pub platform: String,
    pub instruments: Vec<String>,
    pub constellation: String,
    #[serde(rename = "product:type")]
    pub product_type: String,
    #[serde(rename = "product:timeliness_category", skip_serializing_if = "Option::is_none")]
    pub timeliness_category: Option<String>,
    #[serde(rename = "product:timeliness", skip_serializing_if = "Option::is_none")]
    pub timeliness: Option<String>,
    #[serde(rename = "processing:software")]
    pub processing_software: IndexMap<String, String>,
    #[serde(
        rename = "sat:platform_international_designator",
        skip_serializing_if = "Option::is_none"
    )]
    pub platform_international_designator: Option<String>,
    #[serde(rename = "sat:absolute_orbit")]
    pub absolute_orbit: i64,
    #[serde(rename = "sat:relative_orbit")]
    pub relative_orbit: i64,
    #[serde(rename = "sat:orbit_state")]
    pub orbit_state: String,
    #[serde(rename = "sat:anx_datetime")]
    pub anx_datetime: String,
    #[serde(rename = "view:incidence_angle")]
    pub incidence_angle: f64,
    #[serde(rename = "sar:polarizations")]
    pub polarizations: Vec<String>,
    #[serde(rename = "sar:instrument_mode")]
    pub instrument_mode: String,
    #[serde(rename = "sar:frequency_band")]
    pub frequency_band: String,
    /// GHz
    #[serde(rename = "sar:center_frequency")]
    pub center_frequency: f64,
    #[serde(rename = "sar:pixel_spacing_range")]
    pub pixel_spacing_range: f64,
    #[serde(rename = "sar:pixel_spacing_azimuth")]
    pub pixel_spacing_azimuth: f64,
    #[serde(rename = "sar:observation_direction")]
    pub observation_direction: String,
    #[serde(rename = "sar:beam_ids")]
    pub beam_ids: Vec<String>,
    #[serde(rename = "eopf:datatake_id", skip_serializing_if = "Option::is_none")]
    pub datatake_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StacItem {
    #[serde(rename = "type")]
    pub item_type: String,
    pub stac_version: String,
    pub stac_extensions: Vec<String>,
    pub id: String,
    pub properties: StacProperties,
    pub geometry: Geometry,
    /// [lon_min, lat_min, lon_max, lat_max]
    pub bbox: [f64; 4],
    pub links: Vec<IndexMap<String, String>>,
    pub assets: IndexMap<String, IndexMap<String, String>>,
}

impl StacItem {
    pub fn to_json(&self) -> SarResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SarError::Processing(format!("Failed to serialize STAC item {}: {}", self.id, e)))
    }
}

/// (`product:timeliness_category`, `product:timeliness`) for a manifest timeliness
fn product_timeliness(category: &str) -> Option<(&'static str, &'static str)> {
    match category {
        "Fast-24h" => Some(("STC", "PT24H")),
        "NRT-3h" => Some(("NRT", "PT3H")),
        _ => None,
    }
}

fn with_utc_suffix(time: &str) -> String {
    format!("{}Z", time.trim_end_matches('Z'))
}

/// Closed GeoJSON ring and bounding box of a footprint
fn footprint_geometry(footprint: &[(f64, f64)]) -> SarResult<(Geometry, [f64; 4])> {
    let (first, last) = match (footprint.first(), footprint.last()) {
        (Some(first), Some(last)) if footprint.len() >= 3 => (*first, *last),
        _ => {
            return Err(SarError::Metadata(format!(
                "manifest footprint has {} vertices, a polygon needs at least 3",
                footprint.len()
            )))
        }
    };
    let mut ring: Vec<(f64, f64)> = footprint.to_vec();
    if first != last {
        ring.push(first);
    }

    let attrs = make_geospatial_attributes(&ring);
    let bound = |key: &str| attrs.get(key).and_then(|v| v.as_f64()).unwrap_or(f64::NAN);
    let bbox = [
        bound("geospatial_lon_min"),
        bound("geospatial_lat_min"),
        bound("geospatial_lon_max"),
        bound("geospatial_lat_max"),
    ];
    let geometry = Geometry {
        geometry_type: "Polygon".to_string(),
        coordinates: vec![ring.iter().map(|&(lon, lat)| [lon, lat]).collect()],
    };
    Ok((geometry, bbox))
}

/// STAC item describing the product at `location`.
///
/// Image properties (incidence angle, pixel spacing, radar frequency) come
/// from the first annotation file listed in the manifest.
pub fn make_stac_item(item_id: &str, location: &str) -> SarResult<StacItem> {
    let source = ProductSource::resolve(location)?;
    let manifest = Manifest::parse(&source.read_manifest()?)?;
    let annotation = manifest
        .files
        .iter()
        .find(|(_, entry)| entry.schema_type == SchemaType::Annotation)
        .map(|(href, _)| href.clone())
        .ok_or_else(|| SarError::NotFound(format!("annotation file in {}", source.location("manifest.safe"))))?;
    log::info!("Building STAC item {} from {}", item_id, annotation);

    let product_information: ProductInformation = parse_record(&source, &annotation)?;
    let image_information: ImageInformation = parse_record(&source, &annotation)?;
    make_stac_item_from_parts(item_id, &manifest, &product_information, &image_information)
}

/// STAC item from an already parsed manifest and annotation records
pub fn make_stac_item_from_parts(
    item_id: &str,
    manifest: &Manifest,
    product_information: &ProductInformation,
    image_information: &ImageInformation,
) -> SarResult<StacItem> {
    let attributes = &manifest.attributes;
    let acquisition = &manifest.acquisition;
    let required = |value: &Option<String>, name: &str| {
        value
            .as_deref()
            .map(with_utc_suffix)
            .ok_or_else(|| SarError::Metadata(format!("{} not found in manifest", name)))
    };

    let timeliness = match acquisition.timeliness_category.as_deref() {
        Some(category) => {
            let mapped = product_timeliness(category);
            if mapped.is_none() {
                log::warn!("Unknown product timeliness category {:?}", category);
            }
            mapped
        }
        None => None,
    };
    let (geometry, bbox) = footprint_geometry(&acquisition.footprint)?;

    let properties = StacProperties {
        datetime: None,
        start_datetime: required(&acquisition.start_time, "acquisitionPeriod startTime")?,
        end_datetime: required(&acquisition.stop_time, "acquisitionPeriod stopTime")?,
        created: acquisition.processing_stop.as_deref().map(with_utc_suffix),
        platform: attributes.platform.clone(),
        instruments: vec!["sar".to_string()],
        constellation: attributes.constellation.clone(),
        product_type: attributes.product_type.as_str().to_string(),
        timeliness_category: timeliness.map(|(category, _)| category.to_string()),
        timeliness: timeliness.map(|(_, duration)| duration.to_string()),
        processing_software: acquisition.software.clone(),
        platform_international_designator: acquisition.nssdc_identifier.clone(),
        absolute_orbit: attributes.absolute_orbit,
        relative_orbit: attributes.relative_orbit,
        orbit_state: attributes.orbit_state.clone(),
        anx_datetime: attributes.anx_datetime.clone(),
        incidence_angle: image_information.incidence_angle_mid_swath,
        polarizations: attributes.polarizations.iter().map(|p| p.to_string()).collect(),
        instrument_mode: attributes.instrument_mode.to_string(),
        frequency_band: attributes.frequency_band.clone(),
        center_frequency: product_information.radar_frequency / 1e9,
        pixel_spacing_range: image_information.range_pixel_spacing,
        pixel_spacing_azimuth: image_information.azimuth_pixel_spacing,
        observation_direction: "right".to_string(),
        beam_ids: attributes.swaths.clone(),
        datatake_id: acquisition.datatake_id.clone(),
    };

    Ok(StacItem {
        item_type: "Feature".to_string(),
        stac_version: STAC_VERSION.to_string(),
        stac_extensions: STAC_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        id: item_id.to_string(),
        properties,
        geometry,
        bbox,
        links: Vec::new(),
        assets: IndexMap::new(),
    })
}
