//! Radiometric calibration and thermal noise removal of measurement datasets.
//!
//! Calibration LUTs are sparse (line, pixel) grids interpolated bilinearly
//! onto the measurement grid, or broadcast when they are constant within a
//! tolerance. Calibrated amplitude is |DN| / LUT and intensity its square.

use crate::core::interp::interp2d;
use crate::dataset::{Dataset, Values, Variable};
use crate::types::{AttrValue, Attrs, SarError, SarResult};
use ndarray::{Array2, ArrayD, Ix2, Zip};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Types of radiometric calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationType {
    Sigma0, // Radar cross section per unit area
    Beta0,  // Radar brightness
    Gamma0, // Backscatter coefficient
    Dn,     // Digital numbers (uncalibrated)
}

impl CalibrationType {
    /// Name of the LUT variable in the `calibration` group
    pub fn lut_name(&self) -> &'static str {
        match self {
            CalibrationType::Sigma0 => "sigmaNought",
            CalibrationType::Beta0 => "betaNought",
            CalibrationType::Gamma0 => "gamma",
            CalibrationType::Dn => "dn",
        }
    }
}

impl FromStr for CalibrationType {
    type Err = SarError;

    fn from_str(s: &str) -> SarResult<Self> {
        match s {
            "sigma0" | "sigmaNought" => Ok(CalibrationType::Sigma0),
            "beta0" | "betaNought" => Ok(CalibrationType::Beta0),
            "gamma0" | "gamma" => Ok(CalibrationType::Gamma0),
            "dn" => Ok(CalibrationType::Dn),
            _ => Err(SarError::Configuration(format!("unknown calibration type {:?}", s))),
        }
    }
}

/// Closeness test used to decide whether a LUT is constant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self { rtol: 1e-5, atol: 1e-8 }
    }
}

impl Tolerance {
    pub fn is_close(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.atol + self.rtol * b.abs()
    }
}

/// A calibration or noise lookup table sampled on a sparse line/pixel grid
#[derive(Debug, Clone, PartialEq)]
pub struct LookupTable {
    pub line: Vec<f64>,
    pub pixel: Vec<f64>,
    pub values: Array2<f64>,
    pub attrs: Attrs,
}

fn coord_values(ds: &Dataset, name: &str) -> SarResult<Vec<f64>> {
    Ok(ds.floats(name)?.iter().cloned().collect())
}

impl LookupTable {
    /// Extract the `(line, pixel)` variable `name` from a calibration or noise dataset
    pub fn from_dataset(ds: &Dataset, name: &str) -> SarResult<Self> {
        let variable = ds
            .data_vars
            .get(name)
            .ok_or_else(|| SarError::Metadata(format!("LUT {:?} not found", name)))?;
        if variable.dims != ["line", "pixel"] {
            return Err(SarError::Metadata(format!(
                "LUT {:?} has dims {:?}, expected (line, pixel)",
                name, variable.dims
            )));
        }
        let values = variable
            .values
            .to_f64()
            .ok_or_else(|| SarError::Metadata(format!("LUT {:?} is not numeric", name)))?
            .into_dimensionality::<Ix2>()
            .map_err(|e| SarError::Metadata(format!("LUT {:?}: {}", name, e)))?;
        Ok(Self {
            line: coord_values(ds, "line")?,
            pixel: coord_values(ds, "pixel")?,
            values,
            attrs: variable.attrs.clone(),
        })
    }

    pub fn calibration(ds: &Dataset, calibration_type: CalibrationType) -> SarResult<Self> {
        Self::from_dataset(ds, calibration_type.lut_name())
    }

    pub fn noise_range(ds: &Dataset) -> SarResult<Self> {
        Self::from_dataset(ds, "noiseRangeLut")
    }

    /// The mean value, if every entry is close to it
    pub fn constant(&self, tolerance: Tolerance) -> Option<f64> {
        let mean = self.values.mean()?;
        if self.values.iter().all(|&v| tolerance.is_close(mean, v)) {
            Some(mean)
        } else {
            None
        }
    }

    /// Bilinear interpolation onto full resolution lines and pixels.
    ///
    /// Positions outside the LUT grid are NaN.
    pub fn interpolate(&self, lines: &[f64], pixels: &[f64]) -> Array2<f64> {
        Array2::from_shape_fn((lines.len(), pixels.len()), |(i, j)| {
            interp2d(&self.line, &self.pixel, self.values.view(), lines[i], pixels[j], false)
        })
    }

    /// Either a single value or a full resolution grid
    fn resolve(&self, lines: &[f64], pixels: &[f64], tolerance: Tolerance) -> CalibrationGrid {
        match self.constant(tolerance) {
            Some(value) => {
                log::debug!("Calibration LUT is constant: {}", value);
                CalibrationGrid::Constant(value as f32)
            }
            None => CalibrationGrid::Varying(self.interpolate(lines, pixels).mapv(|v| v as f32)),
        }
    }
}

enum CalibrationGrid {
    Constant(f32),
    Varying(Array2<f32>),
}

impl CalibrationGrid {
    fn divide<T>(&self, data: &Array2<T>) -> Array2<T>
    where
        T: Copy + std::ops::Div<f32, Output = T>,
    {
        match self {
            CalibrationGrid::Constant(c) => data.mapv(|v| v / *c),
            CalibrationGrid::Varying(grid) => Zip::from(data).and(grid).map_collect(|&v, &c| v / c),
        }
    }

    fn at(&self, i: usize, j: usize) -> f32 {
        match self {
            CalibrationGrid::Constant(c) => *c,
            CalibrationGrid::Varying(grid) => grid[[i, j]],
        }
    }
}

/// Digital numbers of a measurement dataset with their line and pixel positions
struct DigitalNumbers<'a> {
    variable: &'a Variable,
    lines: Vec<f64>,
    pixels: Vec<f64>,
}

impl<'a> DigitalNumbers<'a> {
    fn from_dataset(ds: &'a Dataset) -> SarResult<Self> {
        let variable = ds
            .data_vars
            .get("measurement")
            .ok_or_else(|| SarError::Processing("dataset has no measurement variable".to_string()))?;
        if variable.dims.len() != 2 {
            return Err(SarError::Processing(format!(
                "measurement must be 2-D, found dims {:?}",
                variable.dims
            )));
        }
        for (coord, dim) in [("line", &variable.dims[0]), ("pixel", &variable.dims[1])] {
            match ds.coords.get(coord) {
                Some(c) if c.dims.len() == 1 && &c.dims[0] == dim => {}
                _ => {
                    return Err(SarError::Processing(format!(
                        "coordinate {:?} must run along measurement dimension {:?}",
                        coord, dim
                    )))
                }
            }
        }
        Ok(Self {
            variable,
            lines: coord_values(ds, "line")?,
            pixels: coord_values(ds, "pixel")?,
        })
    }

    fn grid(&self, lut: &LookupTable, tolerance: Tolerance) -> CalibrationGrid {
        lut.resolve(&self.lines, &self.pixels, tolerance)
    }

    fn output(&self, values: impl Into<Values>, attrs: Attrs) -> Variable {
        Variable {
            dims: self.variable.dims.clone(),
            values: values.into(),
            attrs,
            encoding: Attrs::new(),
        }
    }
}

fn as_2d<T>(array: &ArrayD<T>) -> SarResult<Array2<T>>
where
    T: Clone,
{
    array
        .clone()
        .into_dimensionality::<Ix2>()
        .map_err(|e| SarError::Processing(format!("measurement is not 2-D: {}", e)))
}

/// Squared modulus of the digital numbers
fn power(dn: &Values) -> SarResult<Array2<f32>> {
    match dn {
        Values::Complex(a) => Ok(as_2d(a)?.mapv(|v| v.norm_sqr())),
        Values::Float32(a) => Ok(as_2d(a)?.mapv(|v| v * v)),
        other => Err(SarError::Processing(format!(
            "cannot calibrate {} measurement",
            other.dtype()
        ))),
    }
}

fn long_name(attrs: &Attrs) -> Option<&str> {
    attrs.get("long_name").and_then(AttrValue::as_str)
}

/// Radiometric calibration of one measurement against one LUT
#[derive(Debug, Clone)]
pub struct CalibrationProcessor {
    lut: LookupTable,
    tolerance: Tolerance,
}

impl CalibrationProcessor {
    /// Create a processor from a `calibration` group dataset
    pub fn new(calibration: &Dataset, calibration_type: CalibrationType) -> SarResult<Self> {
        Ok(Self::from_lut(LookupTable::calibration(calibration, calibration_type)?))
    }

    pub fn from_lut(lut: LookupTable) -> Self {
        Self {
            lut,
            tolerance: Tolerance::default(),
        }
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// DN / LUT, keeping the measurement's data type
    pub fn amplitude(&self, measurement: &Dataset) -> SarResult<Variable> {
        let dn = DigitalNumbers::from_dataset(measurement)?;
        let grid = dn.grid(&self.lut, self.tolerance);

        let values = match &dn.variable.values {
            Values::Complex(a) => Values::from(grid.divide(&as_2d(a)?)),
            Values::Float32(a) => Values::from(grid.divide(&as_2d(a)?)),
            other => {
                return Err(SarError::Processing(format!(
                    "cannot calibrate {} measurement",
                    other.dtype()
                )))
            }
        };

        let mut attrs = dn.variable.attrs.clone();
        if let Some(name) = long_name(&self.lut.attrs) {
            let lut_name = name.split("calibration LUT").next().unwrap_or(name);
            attrs.insert(
                "long_name".into(),
                format!("amplitude for {}", lut_name).trim().to_string().into(),
            );
        }
        if let Some(units) = self.lut.attrs.get("units") {
            attrs.insert("units".into(), units.clone());
        }
        Ok(dn.output(values, attrs))
    }

    /// |amplitude|², optionally in dB floored at `min_db`
    pub fn intensity(&self, measurement: &Dataset, as_db: bool, min_db: Option<f32>) -> SarResult<Variable> {
        let amplitude = self.amplitude(measurement)?;
        let intensity = power(&amplitude.values)?;
        let mut attrs = amplitude.attrs.clone();

        let intensity = if as_db {
            attrs.insert("units".into(), "dB".into());
            Self::to_db(&intensity, min_db)
        } else {
            attrs.insert("units".into(), "m2 m-2".into());
            intensity
        };
        if let Some(name) = long_name(&amplitude.attrs).map(str::to_string) {
            if let Some((_, lut_name)) = name.split_once("amplitude for ") {
                attrs.insert("long_name".into(), lut_name.to_string().into());
            }
        }

        Ok(Variable {
            dims: amplitude.dims,
            values: Values::from(intensity),
            attrs,
            encoding: Attrs::new(),
        })
    }

    /// Thermal noise corrected intensity: (|DN|² - noise) / LUT², floored at zero
    pub fn denoised_intensity(&self, measurement: &Dataset, noise: &LookupTable) -> SarResult<Variable> {
        let dn = DigitalNumbers::from_dataset(measurement)?;
        let calibration = dn.grid(&self.lut, self.tolerance);
        let noise = dn.grid(noise, self.tolerance);
        let power = power(&dn.variable.values)?;

        let denoised = Array2::from_shape_fn(power.dim(), |(i, j)| {
            let c = calibration.at(i, j);
            ((power[[i, j]] - noise.at(i, j)) / (c * c)).max(0.0)
        });

        let mut attrs = dn.variable.attrs.clone();
        attrs.insert("units".into(), "m2 m-2".into());
        if let Some(name) = long_name(&self.lut.attrs) {
            let lut_name = name.split("calibration LUT").next().unwrap_or(name).trim();
            attrs.insert("long_name".into(), format!("denoised {}", lut_name).trim().to_string().into());
        }
        Ok(dn.output(denoised, attrs))
    }

    /// Convert linear power to dB
    pub fn to_db(linear: &Array2<f32>, min_db: Option<f32>) -> Array2<f32> {
        log::debug!("Converting to dB scale");
        linear.mapv(|x| {
            let db = 10.0 * x.log10();
            match min_db {
                Some(floor) => db.max(floor),
                None => db,
            }
        })
    }
}

/// Calibrated amplitude of `measurement` using a LUT variable of the calibration group
pub fn calibrate_amplitude(measurement: &Dataset, lut: &LookupTable, tolerance: Tolerance) -> SarResult<Variable> {
    CalibrationProcessor::from_lut(lut.clone())
        .with_tolerance(tolerance)
        .amplitude(measurement)
}

/// Calibrated intensity, linear or in dB.
///
/// dB values are floored at `min_db`, or at [`DEFAULT_MIN_DB`] when `None`.
/// Use [`CalibrationProcessor::intensity`] for an unfloored dB scale.
pub fn calibrate_intensity(
    measurement: &Dataset,
    lut: &LookupTable,
    as_db: bool,
    min_db: Option<f32>,
    tolerance: Tolerance,
) -> SarResult<Variable> {
    CalibrationProcessor::from_lut(lut.clone())
        .with_tolerance(tolerance)
        .intensity(measurement, as_db, Some(min_db.unwrap_or(DEFAULT_MIN_DB)))
}

/// Thermal noise corrected intensity of `measurement`
pub fn denoise_intensity(
    measurement: &Dataset,
    calibration: &LookupTable,
    noise: &LookupTable,
    tolerance: Tolerance,
) -> SarResult<Variable> {
    CalibrationProcessor::from_lut(calibration.clone())
        .with_tolerance(tolerance)
        .denoised_intensity(measurement, noise)
}

/// Default floor applied to dB intensities
pub const DEFAULT_MIN_DB: f32 = -40.0;
