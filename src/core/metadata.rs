//! Metadata group builders.
//!
//! Each `SWATH/POL/<kind>` group maps to one builder that reads a list of
//! annotation records and lays them out as a [`Dataset`]. Builders never
//! touch the measurement raster.

use crate::core::footprint::{get_footprint_linestring, make_geospatial_attributes};
use crate::dataset::{Dataset, Variable};
use crate::io::annotation::{
    parse_record, parse_records, AntennaPatternRecord, AttitudeRecord, AzimuthFmRate, CalibrationInformation,
    CalibrationVector, CoordinateConversionRecord, DcEstimate, GeolocationGridPoint, NoiseAzimuthVector,
    NoiseRangeVector, OrbitRecord, ReferenceReplica, ReplicaRecord,
};
use crate::io::product::ProductSource;
use crate::types::{format_utc, AttrValue, Attrs, ProductType, SarError, SarResult};
use chrono::{DateTime, Utc};
use ndarray::Array2;
use std::str::FromStr;

/// Kind of a `SWATH/POL/<kind>` metadata group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    Orbit,
    Attitude,
    AzimuthFmRate,
    DcEstimate,
    Gcp,
    Replica,
    ReferenceReplica,
    AntennaPattern,
    CoordinateConversion,
    Calibration,
    NoiseRange,
    NoiseAzimuth,
}

impl MetadataKind {
    pub const ALL: [MetadataKind; 12] = [
        MetadataKind::Orbit,
        MetadataKind::Attitude,
        MetadataKind::AzimuthFmRate,
        MetadataKind::DcEstimate,
        MetadataKind::Gcp,
        MetadataKind::Replica,
        MetadataKind::ReferenceReplica,
        MetadataKind::AntennaPattern,
        MetadataKind::CoordinateConversion,
        MetadataKind::Calibration,
        MetadataKind::NoiseRange,
        MetadataKind::NoiseAzimuth,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MetadataKind::Orbit => "orbit",
            MetadataKind::Attitude => "attitude",
            MetadataKind::AzimuthFmRate => "azimuth_fm_rate",
            MetadataKind::DcEstimate => "dc_estimate",
            MetadataKind::Gcp => "gcp",
            MetadataKind::Replica => "replica",
            MetadataKind::ReferenceReplica => "reference_replica",
            MetadataKind::AntennaPattern => "antenna_pattern",
            MetadataKind::CoordinateConversion => "coordinate_conversion",
            MetadataKind::Calibration => "calibration",
            MetadataKind::NoiseRange => "noise_range",
            MetadataKind::NoiseAzimuth => "noise_azimuth",
        }
    }

    /// Kinds backed by the product annotation file, in registration order
    pub fn annotation_kinds(product_type: ProductType) -> Vec<MetadataKind> {
        let mut kinds = vec![
            MetadataKind::Orbit,
            MetadataKind::Attitude,
            MetadataKind::AzimuthFmRate,
            MetadataKind::DcEstimate,
            MetadataKind::Gcp,
            MetadataKind::Replica,
            MetadataKind::ReferenceReplica,
        ];
        match product_type {
            ProductType::Slc => kinds.push(MetadataKind::AntennaPattern),
            ProductType::Grd => kinds.push(MetadataKind::CoordinateConversion),
        }
        kinds
    }

    /// Build the group dataset from the file at `path`
    pub fn build(&self, source: &ProductSource, path: &str, attrs: Attrs) -> SarResult<Dataset> {
        log::debug!("Building {} dataset from {}", self.name(), path);
        let ds = match self {
            MetadataKind::Orbit => open_orbit_dataset(source, path, attrs),
            MetadataKind::Attitude => open_attitude_dataset(source, path, attrs),
            MetadataKind::AzimuthFmRate => open_azimuth_fm_rate_dataset(source, path, attrs),
            MetadataKind::DcEstimate => open_dc_estimate_dataset(source, path, attrs),
            MetadataKind::Gcp => open_gcp_dataset(source, path, attrs),
            MetadataKind::Replica => open_replica_dataset(source, path, attrs),
            MetadataKind::ReferenceReplica => open_reference_replica_dataset(source, path, attrs),
            MetadataKind::AntennaPattern => open_antenna_pattern_dataset(source, path, attrs),
            MetadataKind::CoordinateConversion => open_coordinate_conversion_dataset(source, path, attrs),
            MetadataKind::Calibration => open_calibration_dataset(source, path, attrs),
            MetadataKind::NoiseRange => open_noise_range_dataset(source, path, attrs),
            MetadataKind::NoiseAzimuth => open_noise_azimuth_dataset(source, path, attrs),
        }?;
        ds.validate()?;
        Ok(ds)
    }
}

impl std::fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetadataKind {
    type Err = SarError;

    fn from_str(s: &str) -> SarResult<Self> {
        MetadataKind::ALL
            .iter()
            .find(|kind| kind.name() == s)
            .copied()
            .ok_or_else(|| SarError::Configuration(format!("unknown metadata group {:?}", s)))
    }
}

fn azimuth_time_coord(times: Vec<DateTime<Utc>>) -> Variable {
    Variable::from_vec("azimuth_time", times)
}

fn degree_coord(n: usize) -> Variable {
    Variable::from_vec("degree", (0..n as i64).collect::<Vec<_>>())
}

/// Stack equally long rows into a 2-D array
fn stack_rows<T: Clone>(rows: Vec<Vec<T>>, what: &str) -> SarResult<Array2<T>> {
    let ncols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != ncols) {
        return Err(SarError::Metadata(format!("{} rows have different lengths", what)));
    }
    let nrows = rows.len();
    let flat: Vec<T> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((nrows, ncols), flat)
        .map_err(|e| SarError::Metadata(format!("cannot shape {}: {}", what, e)))
}

/// The shared column positions of a set of vectors, which must all agree
fn regular_grid<T: PartialEq + Clone>(columns: &[&Vec<T>], what: &str) -> SarResult<Vec<T>> {
    let first = columns
        .first()
        .ok_or_else(|| SarError::Metadata(format!("no {} vectors found", what)))?;
    if columns.iter().any(|c| c != first) {
        return Err(SarError::Configuration(format!(
            "Unable to organise {} vectors in a regular line-pixel grid",
            what
        )));
    }
    Ok((*first).clone())
}

pub fn open_orbit_dataset(source: &ProductSource, annotation: &str, mut attrs: Attrs) -> SarResult<Dataset> {
    let orbits: Vec<OrbitRecord> = parse_records(source, annotation)?;
    if let Some(first) = orbits.first() {
        attrs.insert("reference_system".into(), first.frame.as_str().into());
        if let Some(other) = orbits.iter().find(|o| o.frame != first.frame) {
            log::warn!(
                "reference_system is not consistent in all the state vectors: {} and {}",
                first.frame,
                other.frame
            );
            attrs.shift_remove("reference_system");
            attrs.insert(
                "warnings".into(),
                "reference_system is not consistent in all the state vectors".into(),
            );
        }
    }

    let n = orbits.len();
    let position = Array2::from_shape_fn((3, n), |(axis, i)| orbits[i].position[axis]);
    let velocity = Array2::from_shape_fn((3, n), |(axis, i)| orbits[i].velocity[axis]);

    let mut ds = Dataset::new(attrs.clone());
    ds.add_coord("azimuth_time", azimuth_time_coord(orbits.iter().map(|o| o.time).collect()));
    ds.add_coord("axis", Variable::from_vec("axis", vec![0i64, 1, 2]));
    ds.add_data_var(
        "position",
        Variable::new(["axis", "azimuth_time"], position)?.with_attrs(attrs.clone()),
    );
    ds.add_data_var(
        "velocity",
        Variable::new(["axis", "azimuth_time"], velocity)?.with_attrs(attrs),
    );
    Ok(ds)
}

pub fn open_attitude_dataset(source: &ProductSource, annotation: &str, attrs: Attrs) -> SarResult<Dataset> {
    let attitudes: Vec<AttitudeRecord> = parse_records(source, annotation)?;

    let mut ds = Dataset::new(attrs);
    ds.add_coord("azimuth_time", azimuth_time_coord(attitudes.iter().map(|a| a.time).collect()));
    for name in AttitudeRecord::VARIABLES {
        let values: Vec<f64> = attitudes.iter().filter_map(|a| a.value(name)).collect();
        ds.add_data_var(name, Variable::from_vec("azimuth_time", values));
    }
    Ok(ds)
}

pub fn open_azimuth_fm_rate_dataset(source: &ProductSource, annotation: &str, attrs: Attrs) -> SarResult<Dataset> {
    let rates: Vec<AzimuthFmRate> = parse_records(source, annotation)?;
    let degree = rates.first().map_or(0, |r| r.polynomial.len());

    let mut ds = Dataset::new(attrs);
    ds.add_coord("azimuth_time", azimuth_time_coord(rates.iter().map(|r| r.azimuth_time).collect()));
    ds.add_coord("degree", degree_coord(degree));
    ds.add_data_var("t0", Variable::from_vec("azimuth_time", rates.iter().map(|r| r.t0).collect()));
    let polynomial = stack_rows(rates.into_iter().map(|r| r.polynomial).collect(), "azimuthFmRatePolynomial")?;
    ds.add_data_var(
        "azimuth_fm_rate_polynomial",
        Variable::new(["azimuth_time", "degree"], polynomial)?,
    );
    Ok(ds)
}

pub fn open_dc_estimate_dataset(source: &ProductSource, annotation: &str, attrs: Attrs) -> SarResult<Dataset> {
    let estimates: Vec<DcEstimate> = parse_records(source, annotation)?;
    let degree = estimates.first().map_or(0, |e| e.data_dc_polynomial.len());

    let mut ds = Dataset::new(attrs);
    ds.add_coord(
        "azimuth_time",
        azimuth_time_coord(estimates.iter().map(|e| e.azimuth_time).collect()),
    );
    ds.add_coord("degree", degree_coord(degree));
    ds.add_data_var("t0", Variable::from_vec("azimuth_time", estimates.iter().map(|e| e.t0).collect()));
    ds.add_data_var(
        "data_dc_polynomial",
        Variable::new(
            ["azimuth_time", "degree"],
            stack_rows(estimates.iter().map(|e| e.data_dc_polynomial.clone()).collect(), "dataDcPolynomial")?,
        )?,
    );
    ds.add_data_var(
        "geometry_dc_polynomial",
        Variable::new(
            ["azimuth_time", "degree"],
            stack_rows(
                estimates.iter().map(|e| e.geometry_dc_polynomial.clone()).collect(),
                "geometryDcPolynomial",
            )?,
        )?,
    );
    ds.add_data_var(
        "data_dc_rms_error",
        Variable::from_vec("azimuth_time", estimates.iter().map(|e| e.data_dc_rms_error).collect()),
    );
    ds.add_data_var(
        "data_dc_rms_error_above_threshold",
        Variable::from_vec(
            "azimuth_time",
            estimates.iter().map(|e| e.data_dc_rms_error_above_threshold).collect(),
        ),
    );
    ds.add_data_var(
        "fine_dce_azimuth_start_time",
        Variable::from_vec(
            "azimuth_time",
            estimates.iter().map(|e| e.fine_dce_azimuth_start_time).collect(),
        ),
    );
    ds.add_data_var(
        "fine_dce_azimuth_stop_time",
        Variable::from_vec(
            "azimuth_time",
            estimates.iter().map(|e| e.fine_dce_azimuth_stop_time).collect(),
        ),
    );
    Ok(ds)
}

/// Geolocation grid on (azimuth_time, slant_range_time) with footprint attributes.
///
/// Grid rows and columns are ordered by annotated line and pixel; cells
/// without a grid point stay NaN.
pub fn open_gcp_dataset(source: &ProductSource, annotation: &str, attrs: Attrs) -> SarResult<Dataset> {
    let points: Vec<GeolocationGridPoint> = parse_records(source, annotation)?;
    if points.is_empty() {
        return Err(SarError::Metadata(format!("no geolocation grid points in {}", annotation)));
    }

    let mut azimuth_time = Vec::new();
    let mut slant_range_time = Vec::new();
    let mut lines: Vec<i64> = Vec::new();
    let mut pixels: Vec<i64> = Vec::new();
    for point in &points {
        if !lines.contains(&point.line) {
            lines.push(point.line);
            azimuth_time.push(point.azimuth_time);
        }
        if !pixels.contains(&point.pixel) {
            pixels.push(point.pixel);
            slant_range_time.push(point.slant_range_time);
        }
    }
    lines.sort_unstable();
    pixels.sort_unstable();

    let shape = (lines.len(), pixels.len());
    let mut grids: Vec<(&str, Array2<f64>)> = ["latitude", "longitude", "height", "incidenceAngle", "elevationAngle"]
        .into_iter()
        .map(|name| (name, Array2::from_elem(shape, f64::NAN)))
        .collect();
    for point in &points {
        // both positions were collected above
        let (Ok(j), Ok(i)) = (lines.binary_search(&point.line), pixels.binary_search(&point.pixel)) else {
            continue;
        };
        let values = [
            point.latitude,
            point.longitude,
            point.height,
            point.incidence_angle,
            point.elevation_angle,
        ];
        for ((_, grid), value) in grids.iter_mut().zip(values) {
            grid[[j, i]] = value;
        }
    }

    let mut ds = Dataset::new(attrs);
    ds.add_coord("azimuth_time", azimuth_time_coord(azimuth_time.clone()));
    ds.add_coord("slant_range_time", Variable::from_vec("slant_range_time", slant_range_time.clone()));
    ds.add_coord("line", Variable::from_vec("azimuth_time", lines));
    ds.add_coord("pixel", Variable::from_vec("slant_range_time", pixels));
    for (name, grid) in grids {
        ds.add_data_var(name, Variable::new(["azimuth_time", "slant_range_time"], grid)?);
    }

    let footprint = get_footprint_linestring(&azimuth_time, &slant_range_time, &ds)?;
    ds.attrs.extend(make_geospatial_attributes(&footprint));
    Ok(ds)
}

pub fn open_replica_dataset(source: &ProductSource, annotation: &str, attrs: Attrs) -> SarResult<Dataset> {
    let replicas: Vec<ReplicaRecord> = parse_records(source, annotation)?;

    let floats = |f: fn(&ReplicaRecord) -> f64| -> Variable {
        Variable::from_vec("azimuth_time", replicas.iter().map(f).collect::<Vec<f64>>())
    };
    let flags = |f: fn(&ReplicaRecord) -> bool| -> Variable {
        Variable::from_vec("azimuth_time", replicas.iter().map(f).collect::<Vec<bool>>())
    };

    let mut ds = Dataset::new(attrs);
    ds.add_coord("azimuth_time", azimuth_time_coord(replicas.iter().map(|r| r.azimuth_time).collect()));
    ds.add_data_var("crossCorrelationBandwidth", floats(|r| r.cross_correlation_bandwidth));
    ds.add_data_var("crossCorrelationPslr", floats(|r| r.cross_correlation_pslr));
    ds.add_data_var("crossCorrelationPeakLocation", floats(|r| r.cross_correlation_peak_location));
    ds.add_data_var("reconstructedReplicaValidFlag", flags(|r| r.reconstructed_replica_valid_flag));
    ds.add_data_var("pgProductAmplitude", floats(|r| r.pg_product_amplitude));
    ds.add_data_var("pgProductPhase", floats(|r| r.pg_product_phase));
    ds.add_data_var("modelPgProductAmplitude", floats(|r| r.model_pg_product_amplitude));
    ds.add_data_var("modelPgProductPhase", floats(|r| r.model_pg_product_phase));
    ds.add_data_var("relativePgProductValidFlag", flags(|r| r.relative_pg_product_valid_flag));
    ds.add_data_var("absolutePgProductValidFlag", flags(|r| r.absolute_pg_product_valid_flag));
    ds.add_data_var("internalTimeDelay", floats(|r| r.internal_time_delay));
    Ok(ds)
}

pub fn open_reference_replica_dataset(
    source: &ProductSource,
    annotation: &str,
    mut attrs: Attrs,
) -> SarResult<Dataset> {
    let replica: ReferenceReplica = parse_record(source, annotation)?;
    attrs.insert("azimuth_time".into(), format_utc(&replica.azimuth_time).into());
    attrs.insert("chirpSource".into(), replica.chirp_source.into());
    attrs.insert("pgSource".into(), replica.pg_source.into());
    attrs.insert("timeDelay".into(), replica.time_delay.into());
    attrs.insert("gain_re".into(), replica.gain.0.into());
    attrs.insert("gain_im".into(), replica.gain.1.into());

    let mut ds = Dataset::new(attrs);
    ds.add_coord("degree", degree_coord(replica.amplitude_coefficients.len()));
    ds.add_data_var("amplitudeCoefficients", Variable::from_vec("degree", replica.amplitude_coefficients));
    ds.add_data_var("phaseCoefficients", Variable::from_vec("degree", replica.phase_coefficients));
    Ok(ds)
}

pub fn open_antenna_pattern_dataset(source: &ProductSource, annotation: &str, attrs: Attrs) -> SarResult<Dataset> {
    let patterns: Vec<AntennaPatternRecord> = parse_records(source, annotation)?;
    let slant_range_time = regular_grid(
        &patterns.iter().map(|p| &p.slant_range_time).collect::<Vec<_>>(),
        "antenna pattern",
    )?;
    let dims = ["azimuth_time", "slant_range_time"];

    let mut ds = Dataset::new(attrs);
    ds.add_coord("azimuth_time", azimuth_time_coord(patterns.iter().map(|p| p.azimuth_time).collect()));
    ds.add_coord("slant_range_time", Variable::from_vec("slant_range_time", slant_range_time));
    ds.add_data_var(
        "elevationAngle",
        Variable::new(dims, stack_rows(patterns.iter().map(|p| p.elevation_angle.clone()).collect(), "elevationAngle")?)?,
    );
    ds.add_data_var(
        "incidenceAngle",
        Variable::new(dims, stack_rows(patterns.iter().map(|p| p.incidence_angle.clone()).collect(), "incidenceAngle")?)?,
    );
    ds.add_data_var(
        "terrainHeight",
        Variable::from_vec("azimuth_time", patterns.iter().map(|p| p.terrain_height).collect()),
    );
    ds.add_data_var("roll", Variable::from_vec("azimuth_time", patterns.iter().map(|p| p.roll).collect()));
    Ok(ds)
}

pub fn open_coordinate_conversion_dataset(
    source: &ProductSource,
    annotation: &str,
    attrs: Attrs,
) -> SarResult<Dataset> {
    let records: Vec<CoordinateConversionRecord> = parse_records(source, annotation)?;
    let first = records
        .first()
        .ok_or_else(|| SarError::Metadata("coordinateConversion tag not present in annotations".to_string()))?;
    let degree = first.srgr_coefficients.len();

    let mut ds = Dataset::new(attrs);
    ds.add_coord("azimuth_time", azimuth_time_coord(records.iter().map(|r| r.azimuth_time).collect()));
    ds.add_coord("degree", degree_coord(degree));
    ds.add_data_var("gr0", Variable::from_vec("azimuth_time", records.iter().map(|r| r.gr0).collect()));
    ds.add_data_var("sr0", Variable::from_vec("azimuth_time", records.iter().map(|r| r.sr0).collect()));
    ds.add_data_var(
        "slant_range_time",
        Variable::from_vec("azimuth_time", records.iter().map(|r| r.slant_range_time).collect()),
    );
    ds.add_data_var(
        "srgrCoefficients",
        Variable::new(
            ["azimuth_time", "degree"],
            stack_rows(records.iter().map(|r| r.srgr_coefficients.clone()).collect(), "srgrCoefficients")?,
        )?,
    );
    ds.add_data_var(
        "grsrCoefficients",
        Variable::new(
            ["azimuth_time", "degree"],
            stack_rows(records.iter().map(|r| r.grsr_coefficients.clone()).collect(), "grsrCoefficients")?,
        )?,
    );
    Ok(ds)
}

pub fn open_calibration_dataset(source: &ProductSource, calibration: &str, mut attrs: Attrs) -> SarResult<Dataset> {
    let information: CalibrationInformation = parse_record(source, calibration)?;
    attrs.insert(
        "absoluteCalibrationConstant".into(),
        AttrValue::Float(information.absolute_calibration_constant),
    );
    let vectors: Vec<CalibrationVector> = parse_records(source, calibration)?;
    let pixel = regular_grid(&vectors.iter().map(|v| &v.pixel).collect::<Vec<_>>(), "calibration")?;
    let dims = ["line", "pixel"];
    let lut = |rows: Vec<Vec<f32>>, name: &str| -> SarResult<Variable> { Variable::new(dims, stack_rows(rows, name)?) };

    let mut ds = Dataset::new(attrs);
    ds.add_coord("line", Variable::from_vec("line", vectors.iter().map(|v| v.line).collect()));
    ds.add_coord("pixel", Variable::from_vec("pixel", pixel));
    ds.add_data_var(
        "azimuth_time",
        Variable::from_vec("line", vectors.iter().map(|v| v.azimuth_time).collect()),
    );
    ds.add_data_var("sigmaNought", lut(vectors.iter().map(|v| v.sigma_nought.clone()).collect(), "sigmaNought")?);
    ds.add_data_var("betaNought", lut(vectors.iter().map(|v| v.beta_nought.clone()).collect(), "betaNought")?);
    ds.add_data_var("gamma", lut(vectors.iter().map(|v| v.gamma.clone()).collect(), "gamma")?);
    ds.add_data_var("dn", lut(vectors.iter().map(|v| v.dn.clone()).collect(), "dn")?);
    Ok(ds)
}

pub fn open_noise_range_dataset(source: &ProductSource, noise: &str, attrs: Attrs) -> SarResult<Dataset> {
    let vectors: Vec<NoiseRangeVector> = parse_records(source, noise)?;
    let pixel = regular_grid(&vectors.iter().map(|v| &v.pixel).collect::<Vec<_>>(), "noise")?;

    let mut ds = Dataset::new(attrs);
    ds.add_coord("line", Variable::from_vec("line", vectors.iter().map(|v| v.line).collect()));
    ds.add_coord("pixel", Variable::from_vec("pixel", pixel));
    ds.add_data_var(
        "azimuth_time",
        Variable::from_vec("line", vectors.iter().map(|v| v.azimuth_time).collect()),
    );
    let lut = stack_rows(vectors.into_iter().map(|v| v.noise_range_lut).collect(), "noiseRangeLut")?;
    ds.add_data_var("noiseRangeLut", Variable::new(["line", "pixel"], lut)?);
    Ok(ds)
}

/// Azimuth noise profile of the first annotated block.
///
/// GRD products split the profile into several blocks of different length;
/// only the first one is exposed. No vectors gives an empty dataset.
pub fn open_noise_azimuth_dataset(source: &ProductSource, noise: &str, attrs: Attrs) -> SarResult<Dataset> {
    let vectors: Vec<NoiseAzimuthVector> = parse_records(source, noise)?;

    let mut ds = Dataset::new(attrs);
    if let Some(first) = vectors.into_iter().next() {
        if first.line.len() != first.noise_azimuth_lut.len() {
            return Err(SarError::Metadata(format!(
                "noiseAzimuthLut has {} values for {} lines",
                first.noise_azimuth_lut.len(),
                first.line.len()
            )));
        }
        ds.add_coord("line", Variable::from_vec("line", first.line));
        ds.add_data_var("noiseAzimuthLut", Variable::from_vec("line", first.noise_azimuth_lut));
    }
    Ok(ds)
}
