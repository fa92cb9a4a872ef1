use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Complex-valued SAR sample (I + jQ)
pub type SarComplex = Complex<f32>;

/// Speed of light in vacuum (m/s)
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Polarization modes for Sentinel-1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarization {
    VV,
    VH,
    HV,
    HH,
}

impl std::fmt::Display for Polarization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarization::VV => write!(f, "VV"),
            Polarization::VH => write!(f, "VH"),
            Polarization::HV => write!(f, "HV"),
            Polarization::HH => write!(f, "HH"),
        }
    }
}

impl FromStr for Polarization {
    type Err = SarError;

    fn from_str(s: &str) -> SarResult<Self> {
        match s.to_uppercase().as_str() {
            "VV" => Ok(Polarization::VV),
            "VH" => Ok(Polarization::VH),
            "HV" => Ok(Polarization::HV),
            "HH" => Ok(Polarization::HH),
            _ => Err(SarError::InvalidFormat(format!("Invalid polarization: {}", s))),
        }
    }
}

/// Sentinel-1 acquisition mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquisitionMode {
    IW, // Interferometric Wide swath
    EW, // Extra Wide swath
    SM, // StripMap
    WV, // Wave
}

impl std::fmt::Display for AcquisitionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for AcquisitionMode {
    type Err = SarError;

    fn from_str(s: &str) -> SarResult<Self> {
        match s.to_uppercase().as_str() {
            "IW" => Ok(AcquisitionMode::IW),
            "EW" => Ok(AcquisitionMode::EW),
            "SM" => Ok(AcquisitionMode::SM),
            "WV" => Ok(AcquisitionMode::WV),
            _ => Err(SarError::Configuration(format!("instrument mode {:?} not supported", s))),
        }
    }
}

/// Level-1 product type as declared in the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductType {
    Slc,
    Grd,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Slc => "SLC",
            ProductType::Grd => "GRD",
        }
    }
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = SarError;

    fn from_str(s: &str) -> SarResult<Self> {
        match s {
            "SLC" => Ok(ProductType::Slc),
            "GRD" => Ok(ProductType::Grd),
            _ => Err(SarError::Configuration(format!("product type {:?} not supported", s))),
        }
    }
}

/// A single dataset or variable attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    IntList(Vec<i64>),
    FloatList(Vec<f64>),
    StrList(Vec<String>),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_int_list(&self) -> Option<&[i64]> {
        match self {
            AttrValue::IntList(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str_list(&self) -> Option<&[String]> {
        match self {
            AttrValue::StrList(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<usize> for AttrValue {
    fn from(v: usize) -> Self {
        AttrValue::Int(v as i64)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Str(v)
    }
}

impl From<Vec<i64>> for AttrValue {
    fn from(v: Vec<i64>) -> Self {
        AttrValue::IntList(v)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(v: Vec<f64>) -> Self {
        AttrValue::FloatList(v)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(v: Vec<String>) -> Self {
        AttrValue::StrList(v)
    }
}

/// Ordered attribute map attached to datasets and variables
pub type Attrs = IndexMap<String, AttrValue>;

/// Parse a Sentinel-1 annotation timestamp.
///
/// Annotation times carry no zone designator and are UTC; manifest times
/// sometimes do (`Z`), so both forms are accepted.
pub fn parse_utc(time_str: &str) -> SarResult<DateTime<Utc>> {
    let trimmed = time_str.trim();

    if let Ok(time) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(time.with_timezone(&Utc));
    }

    let naive = trimmed.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|t| t.and_utc())
        .map_err(|e| SarError::Metadata(format!("Could not parse time '{}': {}", time_str, e)))
}

/// Format a UTC timestamp the way the annotation files do (microseconds, no zone)
pub fn format_utc(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Error types for SAFE product access
#[derive(Debug, thiserror::Error)]
pub enum SarError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("XML parsing error: {0}")]
    XmlParsing(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("file or object not found {0:?}")]
    NotFound(String),

    #[error("multiple files or objects found {0:?}")]
    MultipleFound(String),

    #[error("Invalid group {group:?}, please select one of the following groups:\n{available:?}")]
    GroupNotFound { group: String, available: Vec<String> },

    #[error("group {group:?} is listed in the manifest but {path:?} is not available")]
    GroupUnavailable { group: String, path: String },

    #[error("burst_index={index} out of bounds (number_of_bursts={count})")]
    BurstIndexOutOfRange { index: i64, count: usize },

    #[error("burst_id={id:?} not found in product burst_ids={available:?}")]
    BurstIdNotFound { id: String, available: Vec<String> },

    #[error("'burst_ids' list can't be found in product attributes, probably Sentinel-1 IPF processor version is older than 3.40")]
    BurstIdsUnsupported,
}

/// Result type for SAFE operations
pub type SarResult<T> = Result<T, SarError>;
