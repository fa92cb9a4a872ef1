//! Geographic footprints and burst identifiers from the geolocation grid.

use crate::core::interp::{interp2d, seconds_since, time_axis};
use crate::dataset::Dataset;
use crate::types::{AttrValue, Attrs, SarError, SarResult};
use chrono::{DateTime, Utc};
use ndarray::{Array2, Axis, Ix2};

/// Closed (lon, lat) ring
pub type Footprint = Vec<(f64, f64)>;

/// Geolocation grid as interpolation tables
struct GcpGrid {
    origin: DateTime<Utc>,
    azimuth_axis: Vec<f64>,
    slant_range_time: Vec<f64>,
    latitude: Array2<f64>,
    longitude: Array2<f64>,
}

impl GcpGrid {
    fn from_dataset(gcp: &Dataset) -> SarResult<Self> {
        let azimuth_time = gcp.times("azimuth_time")?;
        let origin = *azimuth_time
            .first()
            .ok_or_else(|| SarError::Metadata("geolocation grid is empty".to_string()))?;
        let to_grid = |name: &str| -> SarResult<Array2<f64>> {
            gcp.floats(name)?
                .into_dimensionality::<Ix2>()
                .map_err(|e| SarError::Metadata(format!("{} is not a 2-D grid: {}", name, e)))
        };
        Ok(Self {
            origin,
            azimuth_axis: time_axis(&azimuth_time, &origin),
            slant_range_time: gcp.floats("slant_range_time")?.iter().cloned().collect(),
            latitude: to_grid("latitude")?,
            longitude: to_grid("longitude")?,
        })
    }

    fn lon_lat(&self, azimuth_time: &DateTime<Utc>, slant_range_time: f64) -> (f64, f64) {
        let t = seconds_since(azimuth_time, &self.origin);
        let lat = interp2d(&self.azimuth_axis, &self.slant_range_time, self.latitude.view(), t, slant_range_time, true);
        let lon = interp2d(&self.azimuth_axis, &self.slant_range_time, self.longitude.view(), t, slant_range_time, true);
        (lon, lat)
    }
}

/// True when the first three vertices turn clockwise
pub fn is_clockwise(poly: &[(f64, f64)]) -> bool {
    if poly.len() < 3 {
        return false;
    }
    let (x0, y0) = poly[0];
    let (ax, ay) = (poly[1].0 - x0, poly[1].1 - y0);
    let (bx, by) = (poly[2].0 - x0, poly[2].1 - y0);
    ax * by - ay * bx < 0.0
}

/// Counter-clockwise closed footprint of the area spanned by the given axes.
///
/// The corners at the extremes of `azimuth_time` and `slant_range_time` are
/// located on the geolocation grid by bilinear interpolation, extrapolating
/// past its edges when needed.
pub fn get_footprint_linestring(
    azimuth_time: &[DateTime<Utc>],
    slant_range_time: &[f64],
    gcp: &Dataset,
) -> SarResult<Footprint> {
    let grid = GcpGrid::from_dataset(gcp)?;

    let az_min = azimuth_time.iter().min();
    let az_max = azimuth_time.iter().max();
    let (az_min, az_max) = match (az_min, az_max) {
        (Some(lo), Some(hi)) => (*lo, *hi),
        _ => return Err(SarError::Processing("footprint needs azimuth times".to_string())),
    };
    if slant_range_time.is_empty() {
        return Err(SarError::Processing("footprint needs slant range times".to_string()));
    }
    let srt_min = slant_range_time.iter().cloned().fold(f64::INFINITY, f64::min);
    let srt_max = slant_range_time.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let azimuth = [az_min, az_max];
    let range = [srt_min, srt_max];
    let mut footprint: Footprint = [(0, 0), (1, 0), (1, 1), (0, 1)]
        .iter()
        .map(|&(j, i)| grid.lon_lat(&azimuth[j], range[i]))
        .collect();

    if is_clockwise(&footprint) {
        footprint.reverse();
    }
    footprint.push(footprint[0]);
    Ok(footprint)
}

/// WKT polygon and bounding box attributes for a footprint
pub fn make_geospatial_attributes(footprint: &[(f64, f64)]) -> Attrs {
    let wkt = format!(
        "POLYGON(({}))",
        footprint
            .iter()
            .map(|(lon, lat)| format!("{} {}", lon, lat))
            .collect::<Vec<_>>()
            .join(",")
    );
    let lats = footprint.iter().map(|p| p.1);
    let lons = footprint.iter().map(|p| p.0);

    let mut attrs = Attrs::new();
    attrs.insert("geospatial_bounds".into(), AttrValue::Str(wkt));
    attrs.insert("geospatial_lat_min".into(), lats.clone().fold(f64::INFINITY, f64::min).into());
    attrs.insert("geospatial_lat_max".into(), lats.fold(f64::NEG_INFINITY, f64::max).into());
    attrs.insert("geospatial_lon_min".into(), lons.clone().fold(f64::INFINITY, f64::min).into());
    attrs.insert("geospatial_lon_max".into(), lons.fold(f64::NEG_INFINITY, f64::max).into());
    attrs
}

/// Human readable burst identifier, e.g. `R168-N118-E0472`.
///
/// Latitude and longitude are rounded to a tenth of a degree, so two bursts
/// closer than that would share an id.
pub fn build_burst_id(lat: f64, lon: f64, relative_orbit: i64) -> String {
    let lat_int = (lat.abs() * 10.0).round() as i64;
    let lon_int = (lon.abs() * 10.0).round() as i64;
    let n_or_s = if lat >= 0.0 { 'N' } else { 'S' };
    let e_or_w = if lon >= 0.0 { 'E' } else { 'W' };
    format!("R{:03}-{}{:03}-{}{:04}", relative_orbit, n_or_s, lat_int, e_or_w, lon_int)
}

/// Approximate (lat, lon) centre of each burst.
///
/// Geolocation grid rows sit on burst boundaries, so the mean of each row
/// averaged with the next one gives one centre per burst.
pub fn compute_burst_centres(gcp: &Dataset) -> SarResult<Vec<(f64, f64)>> {
    let grid = GcpGrid::from_dataset(gcp)?;
    let row_means = |values: &Array2<f64>| -> SarResult<Vec<f64>> {
        values
            .mean_axis(Axis(1))
            .map(|m| m.to_vec())
            .ok_or_else(|| SarError::Metadata("geolocation grid has no columns".to_string()))
    };
    let lat = row_means(&grid.latitude)?;
    let lon = row_means(&grid.longitude)?;

    Ok(lat
        .windows(2)
        .zip(lon.windows(2))
        .map(|(la, lo)| ((la[0] + la[1]) / 2.0, (lo[0] + lo[1]) / 2.0))
        .collect())
}

/// One [`build_burst_id`] label per burst
pub fn burst_labels(gcp: &Dataset, relative_orbit: i64) -> SarResult<Vec<String>> {
    Ok(compute_burst_centres(gcp)?
        .into_iter()
        .map(|(lat, lon)| build_burst_id(lat, lon, relative_orbit))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Variable;
    use crate::types::parse_utc;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_build_burst_id() {
        assert_eq!(build_burst_id(11.8475875, 47.16626783, 168), "R168-N118-E0472");
        assert_eq!(build_burst_id(-33.04, -70.51, 3), "R003-S330-W0705");
    }

    #[test]
    fn test_is_clockwise() {
        let ccw = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        assert!(!is_clockwise(&ccw));
        let cw: Vec<_> = ccw.iter().rev().cloned().collect();
        assert!(is_clockwise(&cw));
    }

    fn grid() -> Dataset {
        let mut ds = Dataset::new(Attrs::new());
        ds.add_coord(
            "azimuth_time",
            Variable::from_vec(
                "azimuth_time",
                vec![
                    parse_utc("2021-04-01T05:26:24.000000").unwrap(),
                    parse_utc("2021-04-01T05:26:27.000000").unwrap(),
                    parse_utc("2021-04-01T05:26:30.000000").unwrap(),
                ],
            ),
        );
        ds.add_coord("slant_range_time", Variable::from_vec("slant_range_time", vec![0.005, 0.006]));
        let dims = ["azimuth_time", "slant_range_time"];
        ds.add_data_var(
            "latitude",
            Variable::new(dims, array![[46.4, 46.38], [46.3, 46.28], [46.2, 46.18]]).unwrap(),
        );
        ds.add_data_var(
            "longitude",
            Variable::new(dims, array![[11.0, 11.5], [10.99, 11.49], [10.98, 11.48]]).unwrap(),
        );
        ds
    }

    #[test]
    fn test_footprint_is_closed_counter_clockwise() {
        let gcp = grid();
        let times = gcp.times("azimuth_time").unwrap();
        let footprint = get_footprint_linestring(&times, &[0.005, 0.006], &gcp).unwrap();
        assert_eq!(footprint.len(), 5);
        assert_eq!(footprint[0], footprint[4]);
        assert!(!is_clockwise(&footprint));

        let attrs = make_geospatial_attributes(&footprint);
        assert_relative_eq!(attrs["geospatial_lat_min"].as_f64().unwrap(), 46.18);
        assert_relative_eq!(attrs["geospatial_lat_max"].as_f64().unwrap(), 46.4);
        assert_relative_eq!(attrs["geospatial_lon_min"].as_f64().unwrap(), 10.98);
        assert!(attrs["geospatial_bounds"].as_str().unwrap().starts_with("POLYGON(("));
    }

    #[test]
    fn test_burst_centres() {
        let centres = compute_burst_centres(&grid()).unwrap();
        assert_eq!(centres.len(), 2);
        assert_relative_eq!(centres[0].0, 46.34, epsilon = 1e-9);
        assert_relative_eq!(centres[0].1, 11.245, epsilon = 1e-9);
        assert_eq!(burst_labels(&grid(), 168).unwrap(), vec!["R168-N463-E0112", "R168-N462-E0112"]);
    }
}
