//! Burst selection on TOPS (IW / EW) SLC measurement datasets.

use crate::core::footprint::{get_footprint_linestring, make_geospatial_attributes};
use crate::core::interp::seconds_since;
use crate::core::measurement::burst_layout;
use crate::dataset::Dataset;
use crate::types::{parse_utc, AttrValue, SarError, SarResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lines trimmed from each side of a burst by [`mosaic_slc_iw`] by default
pub const DEFAULT_MOSAIC_CROP: usize = 90;

/// Burst selector; exactly one of `burst_index`, `azimuth_anx_time` and
/// `burst_id` must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BurstQuery {
    /// Zero-based position of the burst in the swath
    pub burst_index: Option<i64>,
    /// Seconds from the ascending node crossing to the burst first line
    pub azimuth_anx_time: Option<f64>,
    /// Match `azimuth_anx_time` against the burst center line instead
    pub use_center: bool,
    /// Relative burst id (IPF 3.40 and later)
    pub burst_id: Option<i64>,
}

impl BurstQuery {
    pub fn index(burst_index: i64) -> Self {
        Self {
            burst_index: Some(burst_index),
            ..Default::default()
        }
    }

    pub fn anx_time(azimuth_anx_time: f64, use_center: bool) -> Self {
        Self {
            azimuth_anx_time: Some(azimuth_anx_time),
            use_center,
            ..Default::default()
        }
    }

    pub fn burst_id(burst_id: i64) -> Self {
        Self {
            burst_id: Some(burst_id),
            ..Default::default()
        }
    }

    /// Resolve the selector to a burst index, not yet bounds checked
    pub fn resolve(&self, ds: &Dataset) -> SarResult<i64> {
        let selectors = [
            self.burst_index.is_some(),
            self.azimuth_anx_time.is_some(),
            self.burst_id.is_some(),
        ]
        .iter()
        .filter(|&&set| set)
        .count();
        if selectors > 1 {
            return Err(SarError::Configuration(
                "only one keyword between 'burst_index' and 'azimuth_anx_time' and 'burst_id' must be defined"
                    .to_string(),
            ));
        }

        if let Some(index) = self.burst_index {
            return Ok(index);
        }
        if let Some(seconds) = self.azimuth_anx_time {
            return Ok(find_bursts_index(ds, seconds, self.use_center)? as i64);
        }
        if let Some(id) = self.burst_id {
            let burst_ids = ds
                .attr("burst_ids")
                .and_then(AttrValue::as_int_list)
                .ok_or(SarError::BurstIdsUnsupported)?;
            return burst_ids
                .iter()
                .position(|&b| b == id)
                .map(|i| i as i64)
                .ok_or_else(|| SarError::BurstIdNotFound {
                    id: id.to_string(),
                    available: burst_ids.iter().map(i64::to_string).collect(),
                });
        }
        Err(SarError::Configuration(
            "one keyword between 'burst_index' and 'azimuth_anx_time' must be defined".to_string(),
        ))
    }
}

/// Line range and timing of one burst
#[derive(Debug, Clone, PartialEq)]
pub struct BurstInfo {
    pub index: usize,
    pub start_line: usize,
    /// One past the last line
    pub end_line: usize,
    pub azimuth_time: DateTime<Utc>,
}

/// Bursts of a measurement dataset, in acquisition order
pub fn burst_info(ds: &Dataset) -> SarResult<Vec<BurstInfo>> {
    let (lines_per_burst, number_of_bursts) = burst_layout(ds)?;
    let azimuth_time = ds.times("azimuth_time")?;
    let number_of_lines = azimuth_time.len();
    Ok((0..number_of_bursts)
        .map(|index| index * lines_per_burst)
        .take_while(|&start| start < number_of_lines)
        .enumerate()
        .map(|(index, start_line)| BurstInfo {
            index,
            start_line,
            end_line: (start_line + lines_per_burst).min(number_of_lines),
            azimuth_time: azimuth_time[start_line],
        })
        .collect())
}

/// Index of the burst whose first (or center) line is closest to
/// `azimuth_anx_seconds` after the ascending node crossing.
pub fn find_bursts_index(ds: &Dataset, azimuth_anx_seconds: f64, use_center: bool) -> SarResult<usize> {
    let (lines_per_burst, _) = burst_layout(ds)?;
    let anx = parse_utc(ds.attr_str("ascending_node_time")?)?;
    let azimuth_time = ds.times("azimuth_time")?;
    if lines_per_burst == 0 {
        return Err(SarError::Metadata("lines_per_burst is zero".to_string()));
    }

    let offset = if use_center { lines_per_burst / 2 } else { 0 };
    let target_ns = (azimuth_anx_seconds * 1e9) as i64;
    azimuth_time
        .iter()
        .skip(offset)
        .step_by(lines_per_burst)
        .map(|t| {
            let ns = (*t - anx).num_nanoseconds().unwrap_or(i64::MAX);
            (ns as i128 - target_ns as i128).abs()
        })
        .enumerate()
        .min_by_key(|&(_, distance)| distance)
        .map(|(index, _)| index)
        .ok_or_else(|| SarError::Processing("dataset has no azimuth times".to_string()))
}

/// Measurement dataset restricted to the selected burst.
///
/// The result is indexed by `(azimuth_time, slant_range_time)` and carries
/// `burst_index`, `azimuth_anx_time` (seconds) and, when known, `burst_id`.
/// With `gcp` the geospatial attributes describe the burst footprint.
pub fn crop_burst_dataset(ds: &Dataset, query: &BurstQuery, gcp: Option<&Dataset>) -> SarResult<Dataset> {
    let index = query.resolve(ds)?;
    let (lines_per_burst, number_of_bursts) = burst_layout(ds)?;
    if index < 0 || index as usize >= number_of_bursts {
        return Err(SarError::BurstIndexOutOfRange {
            index,
            count: number_of_bursts,
        });
    }
    let index = index as usize;
    log::debug!("Cropping burst {} of {}", index, number_of_bursts);

    // the last burst may be cut short by the end of the image
    let number_of_lines = ds.dims().get("line").copied().unwrap_or(0);
    let start = (lines_per_burst * index).min(number_of_lines);
    let end = (start + lines_per_burst).min(number_of_lines);
    let mut burst = ds
        .isel("line", start..end)?
        .swap_dims(&[("line", "azimuth_time"), ("pixel", "slant_range_time")])?;

    let azimuth_time = burst.times("azimuth_time")?;
    let first = azimuth_time
        .first()
        .ok_or_else(|| SarError::Processing(format!("burst {} has no lines", index)))?;
    let anx = parse_utc(ds.attr_str("ascending_node_time")?)?;
    burst
        .attrs
        .insert("azimuth_anx_time".into(), seconds_since(first, &anx).into());
    burst.attrs.insert("burst_index".into(), index.into());
    burst.attrs.shift_remove("subgroups");

    if let Some(gcp) = gcp {
        let slant_range_time: Vec<f64> = burst.floats("slant_range_time")?.iter().cloned().collect();
        let footprint = get_footprint_linestring(&azimuth_time, &slant_range_time, gcp)?;
        burst.attrs.extend(make_geospatial_attributes(&footprint));
    }

    if let Some(AttrValue::IntList(burst_ids)) = burst.attrs.shift_remove("burst_ids") {
        if let Some(id) = burst_ids.get(index) {
            burst.attrs.insert("burst_id".into(), (*id).into());
        }
    }
    Ok(burst)
}

/// Stitch all bursts along azimuth time, dropping `crop` lines at both ends
/// of every burst to remove the overlap.
pub fn mosaic_slc_iw(ds: &Dataset, crop: usize) -> SarResult<Dataset> {
    let (_, number_of_bursts) = burst_layout(ds)?;
    log::info!("Mosaicking {} bursts with crop={}", number_of_bursts, crop);

    let mut bursts = Vec::with_capacity(number_of_bursts);
    for index in 0..number_of_bursts {
        let burst = crop_burst_dataset(ds, &BurstQuery::index(index as i64), None)?;
        let lines = burst.dims().get("azimuth_time").copied().unwrap_or(0);
        let start = crop.min(lines);
        let end = lines.saturating_sub(crop).max(start);
        bursts.push(burst.isel("azimuth_time", start..end)?);
    }
    Dataset::concat(&bursts, "azimuth_time")
}
