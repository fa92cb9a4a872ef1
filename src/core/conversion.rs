//! Slant range / ground range conversion for GRD products.
//!
//! Uses the `coordinate_conversion` group: per azimuth time a reference slant
//! range `sr0` and polynomial coefficients in both directions. Coefficients are
//! interpolated linearly in azimuth time before the polynomial is evaluated.

use crate::core::interp::{interp1d, seconds_since, time_axis};
use crate::dataset::Dataset;
use crate::types::{SarError, SarResult, SPEED_OF_LIGHT};
use chrono::{DateTime, Utc};
use ndarray::{Array2, Ix2};

/// Coordinate conversion polynomials indexed by azimuth time
#[derive(Debug, Clone)]
pub struct CoordinateConversion {
    azimuth_time: Vec<DateTime<Utc>>,
    axis: Vec<f64>,
    sr0: Vec<f64>,
    gr0: Vec<f64>,
    srgr_coefficients: Array2<f64>,
    grsr_coefficients: Array2<f64>,
}

fn coefficients(ds: &Dataset, name: &str) -> SarResult<Array2<f64>> {
    ds.floats(name)?
        .into_dimensionality::<Ix2>()
        .map_err(|e| SarError::Processing(format!("{} is not 2-D: {}", name, e)))
}

fn evaluate_polynomial(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

impl CoordinateConversion {
    pub fn from_dataset(ds: &Dataset) -> SarResult<Self> {
        let azimuth_time = ds.times("azimuth_time")?;
        if azimuth_time.is_empty() {
            return Err(SarError::Processing("empty coordinate conversion".to_string()));
        }
        Ok(Self {
            sr0: ds.floats("sr0")?.iter().cloned().collect(),
            gr0: ds.floats("gr0")?.iter().cloned().collect(),
            srgr_coefficients: coefficients(ds, "srgrCoefficients")?,
            grsr_coefficients: coefficients(ds, "grsrCoefficients")?,
            axis: time_axis(&azimuth_time, &azimuth_time[0]),
            azimuth_time,
        })
    }

    fn interpolate(&self, table: &[f64], t: f64) -> f64 {
        interp1d(&self.axis, table, t, false)
    }

    fn coefficients_at(&self, table: &Array2<f64>, t: f64) -> Vec<f64> {
        table
            .columns()
            .into_iter()
            .map(|column| self.interpolate(&column.to_vec(), t))
            .collect()
    }

    fn offset(&self, time: &DateTime<Utc>) -> f64 {
        seconds_since(time, &self.azimuth_time[0])
    }

    /// Ground range in metres for every (azimuth time, slant range time) pair.
    ///
    /// Result has shape `(azimuth_time.len(), slant_range_time.len())`; times
    /// outside the annotated azimuth span give NaN.
    pub fn slant_range_time_to_ground_range(
        &self,
        azimuth_time: &[DateTime<Utc>],
        slant_range_time: &[f64],
    ) -> Array2<f64> {
        let mut out = Array2::zeros((azimuth_time.len(), slant_range_time.len()));
        for (i, time) in azimuth_time.iter().enumerate() {
            let t = self.offset(time);
            let sr0 = self.interpolate(&self.sr0, t);
            let coefficients = self.coefficients_at(&self.srgr_coefficients, t);
            for (j, &srt) in slant_range_time.iter().enumerate() {
                let slant_range = SPEED_OF_LIGHT / 2.0 * srt;
                out[[i, j]] = evaluate_polynomial(&coefficients, slant_range - sr0);
            }
        }
        out
    }

    /// Two-way slant range time for every (azimuth time, ground range) pair.
    ///
    /// Fails unless every `gr0` is zero, which is the case for all products
    /// the ground-to-slant polynomial is defined for.
    pub fn ground_range_to_slant_range_time(
        &self,
        azimuth_time: &[DateTime<Utc>],
        ground_range: &[f64],
    ) -> SarResult<Array2<f64>> {
        if self.gr0.iter().any(|&g| g != 0.0) {
            return Err(SarError::Processing(format!(
                "ground to slant range conversion needs gr0 == 0, found {:?}",
                self.gr0
            )));
        }
        let mut out = Array2::zeros((azimuth_time.len(), ground_range.len()));
        for (i, time) in azimuth_time.iter().enumerate() {
            let coefficients = self.coefficients_at(&self.grsr_coefficients, self.offset(time));
            for (j, &gr) in ground_range.iter().enumerate() {
                out[[i, j]] = 2.0 / SPEED_OF_LIGHT * evaluate_polynomial(&coefficients, gr);
            }
        }
        Ok(out)
    }
}

/// Convenience wrapper over [`CoordinateConversion::slant_range_time_to_ground_range`]
pub fn slant_range_time_to_ground_range(
    azimuth_time: &[DateTime<Utc>],
    slant_range_time: &[f64],
    coordinate_conversion: &Dataset,
) -> SarResult<Array2<f64>> {
    Ok(CoordinateConversion::from_dataset(coordinate_conversion)?
        .slant_range_time_to_ground_range(azimuth_time, slant_range_time))
}

/// Convenience wrapper over [`CoordinateConversion::ground_range_to_slant_range_time`]
pub fn ground_range_to_slant_range_time(
    azimuth_time: &[DateTime<Utc>],
    ground_range: &[f64],
    coordinate_conversion: &Dataset,
) -> SarResult<Array2<f64>> {
    CoordinateConversion::from_dataset(coordinate_conversion)?
        .ground_range_to_slant_range_time(azimuth_time, ground_range)
}
