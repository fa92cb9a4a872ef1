//! Measurement dataset builder.
//!
//! Combines a measurement raster with the image, product and swath timing
//! annotation of the same swath and polarization into one dataset with a
//! `measurement` variable on `(line, pixel)` and the azimuth / range
//! coordinates of every line and pixel.

use crate::dataset::{Dataset, Values, Variable};
use crate::io::annotation::{parse_record, ImageInformation, ProductInformation, SwathTiming};
use crate::io::product::ProductSource;
use crate::io::raster::{RasterData, RasterReader};
use crate::types::{format_utc, AttrValue, Attrs, SarError, SarResult};
use chrono::{DateTime, Duration, Utc};
use ndarray::Array1;

/// Range parameterization of the image columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    SlantRange,
    GroundRange,
}

impl Projection {
    pub fn from_annotation(projection: &str) -> SarResult<Self> {
        match projection {
            "Slant Range" => Ok(Projection::SlantRange),
            "Ground Range" => Ok(Projection::GroundRange),
            other => Err(SarError::Configuration(format!("unknown projection {}", other))),
        }
    }
}

/// `n` evenly spaced times from `first` to `last`, both included exactly
pub fn make_azimuth_time(first: DateTime<Utc>, last: DateTime<Utc>, n: usize) -> Vec<DateTime<Utc>> {
    if n <= 1 {
        return std::iter::repeat(first).take(n).collect();
    }
    let span = (last - first).num_nanoseconds().unwrap_or(i64::MAX) as i128;
    let steps = (n - 1) as i128;
    (0..n)
        .map(|i| first + Duration::nanoseconds((span * i as i128 / steps) as i64))
        .collect()
}

/// `n` times from `start` stepped by `interval` seconds, rounded to the nanosecond
pub fn burst_azimuth_time(start: DateTime<Utc>, interval: f64, n: usize) -> Vec<DateTime<Utc>> {
    let step = (interval * 1e9).round() as i64;
    (0..n as i64)
        .map(|k| start + Duration::nanoseconds(step * k))
        .collect()
}

fn annotation_attrs(product: &ProductInformation, image: &ImageInformation) -> Attrs {
    let mut attrs = Attrs::new();
    attrs.insert("radar_frequency".into(), (product.radar_frequency / 1e9).into());
    attrs.insert("ascending_node_time".into(), format_utc(&image.ascending_node_time).into());
    attrs.insert("azimuth_pixel_spacing".into(), image.azimuth_pixel_spacing.into());
    attrs.insert("range_pixel_spacing".into(), image.range_pixel_spacing.into());
    attrs.insert(
        "product_first_line_utc_time".into(),
        format_utc(&image.product_first_line_utc_time).into(),
    );
    attrs.insert(
        "product_last_line_utc_time".into(),
        format_utc(&image.product_last_line_utc_time).into(),
    );
    attrs.insert("azimuth_time_interval".into(), image.azimuth_time_interval.into());
    attrs.insert("image_slant_range_time".into(), image.slant_range_time.into());
    attrs.insert("range_sampling_rate".into(), product.range_sampling_rate.into());
    attrs.insert("incidence_angle_mid_swath".into(), image.incidence_angle_mid_swath.into());
    attrs
}

/// Open one swath / polarization image.
///
/// IW and EW SLC images keep `(line, pixel)` dimensions so bursts can be cut
/// by line number; every other product is indexed directly by
/// `(azimuth_time, slant_range_time)` or `(azimuth_time, ground_range)`.
pub fn open_pol_dataset(
    source: &ProductSource,
    measurement: &str,
    annotation: &str,
    reader: &dyn RasterReader,
    attrs: Attrs,
    gcp: Option<&Dataset>,
) -> SarResult<Dataset> {
    let product: ProductInformation = parse_record(source, annotation)?;
    let image: ImageInformation = parse_record(source, annotation)?;
    let timing: SwathTiming = parse_record(source, annotation)?;
    let projection = Projection::from_annotation(&product.projection)?;

    let number_of_lines = image.number_of_lines;
    let number_of_samples = image.number_of_samples;
    let number_of_bursts = timing.bursts.len();

    let mut attrs = attrs;
    attrs.extend(annotation_attrs(&product, &image));

    let mut azimuth_time = make_azimuth_time(
        image.product_first_line_utc_time,
        image.product_last_line_utc_time,
        number_of_lines,
    );
    let mut swap: Vec<(&str, &str)> = Vec::new();
    let mut encoding = Attrs::new();

    if number_of_bursts == 0 {
        swap.push(("line", "azimuth_time"));
        swap.push(("pixel", "slant_range_time"));
    } else {
        let lines_per_burst = timing.lines_per_burst;
        let burst_ids: Option<Vec<i64>> = timing.bursts.iter().map(|b| b.burst_id).collect();
        if let Some(burst_ids) = burst_ids {
            attrs.insert("burst_ids".into(), burst_ids.into());
        }
        attrs.insert("azimuth_steering_rate".into(), product.azimuth_steering_rate.into());
        attrs.insert("number_of_bursts".into(), number_of_bursts.into());
        attrs.insert("lines_per_burst".into(), lines_per_burst.into());

        for (index, burst) in timing.bursts.iter().enumerate() {
            let start = lines_per_burst * index;
            let end = (start + lines_per_burst).min(azimuth_time.len());
            if start >= end {
                log::warn!("burst {} starts past the last image line {}", index, number_of_lines);
                break;
            }
            let times = burst_azimuth_time(burst.azimuth_time, image.azimuth_time_interval, end - start);
            azimuth_time.splice(start..end, times);
        }
        encoding.insert("preferred_chunks".into(), lines_per_burst.into());
    }

    let mut ds = Dataset::new(Attrs::new());
    ds.add_coord(
        "pixel",
        Variable::from_vec("pixel", (0..number_of_samples as i64).collect::<Vec<_>>()),
    );
    ds.add_coord(
        "line",
        Variable::from_vec("line", (0..number_of_lines as i64).collect::<Vec<_>>()),
    );
    let mut time_coord = Variable::from_vec("line", azimuth_time.clone());
    if let Some(first) = azimuth_time.first() {
        time_coord
            .encoding
            .insert("units".into(), format!("microseconds since {}", format_utc(first)).into());
    }
    ds.add_coord("azimuth_time", time_coord);

    match projection {
        Projection::SlantRange => {
            let last = image.slant_range_time + (number_of_samples as f64 - 1.0) / product.range_sampling_rate;
            let slant_range_time = Array1::linspace(image.slant_range_time, last, number_of_samples);
            ds.add_coord("slant_range_time", Variable::new(["pixel"], slant_range_time)?);
        }
        Projection::GroundRange => {
            let last = image.range_pixel_spacing * (number_of_samples as f64 - 1.0);
            let ground_range = Array1::linspace(0.0, last, number_of_samples);
            ds.add_coord("ground_range", Variable::new(["pixel"], ground_range)?);
            swap = vec![("line", "azimuth_time"), ("pixel", "ground_range")];
        }
    }

    let location = source.raster_path(measurement);
    log::info!("Reading measurement raster {}", location);
    let raster = reader.read(&location)?;
    if raster.dim() != (number_of_lines, number_of_samples) {
        return Err(SarError::InvalidFormat(format!(
            "raster {} has shape {:?}, annotation declares ({}, {})",
            location,
            raster.dim(),
            number_of_lines,
            number_of_samples
        )));
    }
    let values = match raster {
        RasterData::Real(data) => Values::from(data),
        RasterData::Complex(data) => Values::from(data),
    };

    if let Some(gcp) = gcp {
        for (key, value) in &gcp.attrs {
            attrs.insert(key.clone(), value.clone());
        }
    }

    let mut variable = Variable::new(["line", "pixel"], values)?.with_attrs(attrs.clone());
    variable.encoding = encoding;
    ds.add_data_var("measurement", variable);
    ds.attrs = attrs;

    let ds = if swap.is_empty() { ds } else { ds.swap_dims(&swap)? };
    log::debug!("Measurement dataset dims {:?}", ds.dims());
    Ok(ds)
}

/// Lines per burst and burst count of a measurement dataset with bursts
pub fn burst_layout(ds: &Dataset) -> SarResult<(usize, usize)> {
    let as_count = |key: &str| -> SarResult<usize> {
        match ds.attr(key) {
            Some(AttrValue::Int(v)) if *v >= 0 => Ok(*v as usize),
            _ => Err(SarError::Metadata(format!("dataset has no {:?} attribute", key))),
        }
    };
    Ok((as_count("lines_per_burst")?, as_count("number_of_bursts")?))
}
