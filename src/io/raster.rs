//! Measurement raster access through GDAL.

use crate::types::{SarComplex, SarError, SarResult};
use gdal::raster::GdalDataType;
use gdal::Dataset;
use ndarray::Array2;
use std::path::Path;

/// Pixel data of a single-band measurement file, indexed `[line, pixel]`
#[derive(Debug, Clone, PartialEq)]
pub enum RasterData {
    Real(Array2<f32>),
    Complex(Array2<SarComplex>),
}

impl RasterData {
    /// (lines, pixels)
    pub fn dim(&self) -> (usize, usize) {
        match self {
            RasterData::Real(a) => a.dim(),
            RasterData::Complex(a) => a.dim(),
        }
    }
}

/// Source of measurement pixels.
///
/// The default implementation goes through GDAL; tests and callers with
/// their own storage can plug in anything that yields the same arrays.
pub trait RasterReader {
    fn read(&self, path: &str) -> SarResult<RasterData>;
}

/// GDAL backed reader, handling local, `/vsizip/` and `/vsicurl/` paths
#[derive(Debug, Clone, Copy, Default)]
pub struct GdalRasterReader;

impl GdalRasterReader {
    pub fn new() -> Self {
        Self
    }

    /// Whole band `index` of `dataset` as f32 samples, indexed `[line, pixel]`
    fn read_band(dataset: &Dataset, index: isize) -> SarResult<Array2<f32>> {
        let (width, height) = dataset.raster_size();
        let size = (width, height);
        let buffer = dataset.rasterband(index)?.read_as::<f32>((0, 0), size, size, None)?;
        Array2::from_shape_vec((height, width), buffer.data)
            .map_err(|e| SarError::Processing(format!("Failed to reshape band {}: {}", index, e)))
    }

    fn to_complex(i_data: Array2<f32>, q_data: &Array2<f32>) -> SarResult<Array2<SarComplex>> {
        if i_data.dim() != q_data.dim() {
            return Err(SarError::Processing(format!(
                "I/Q shape mismatch: {:?} vs {:?}",
                i_data.dim(),
                q_data.dim()
            )));
        }
        Ok(ndarray::Zip::from(&i_data)
            .and(q_data)
            .map_collect(|&i, &q| SarComplex::new(i, q)))
    }
}

impl RasterReader for GdalRasterReader {
    fn read(&self, path: &str) -> SarResult<RasterData> {
        if !path.starts_with("/vsi") && !Path::new(path).exists() {
            return Err(SarError::NotFound(path.to_string()));
        }

        log::info!("Reading measurement raster: {}", path);
        let dataset = Dataset::open(path)?;
        let (width, height) = dataset.raster_size();
        let band_count = dataset.raster_count();
        // complex pixel types (CInt16 for SLC) have no GdalDataType
        let is_complex = dataset.rasterband(1)?.band_type() == GdalDataType::Unknown;
        log::debug!("Raster {}x{} bands={} complex={}", width, height, band_count, is_complex);

        if is_complex {
            // GDAL exposes the real and imaginary parts as derived subdatasets
            let real = Dataset::open(format!("DERIVED_SUBDATASET:REAL:{}", path))?;
            let imag = Dataset::open(format!("DERIVED_SUBDATASET:IMAG:{}", path))?;
            let i_data = Self::read_band(&real, 1)?;
            let q_data = Self::read_band(&imag, 1)?;
            return Ok(RasterData::Complex(Self::to_complex(i_data, &q_data)?));
        }

        if band_count >= 2 {
            // separate I and Q bands
            let i_data = Self::read_band(&dataset, 1)?;
            let q_data = Self::read_band(&dataset, 2)?;
            return Ok(RasterData::Complex(Self::to_complex(i_data, &q_data)?));
        }

        Ok(RasterData::Real(Self::read_band(&dataset, 1)?))
    }
}
