//! sentinel1-safe: Sentinel-1 SAFE products as hierarchical array datasets
//!
//! A product is exposed as a tree of groups. Swaths (`IW1`) contain
//! measurements (`IW1/VV`), which contain metadata groups (`IW1/VV/orbit`,
//! `IW1/VV/calibration`, ...). Opening a group returns a [`Dataset`] of named
//! coordinates, data variables and attributes. Measurements of TOPS SLC
//! products can be cut to a single burst (`IW1/VV/3`).
//!
//! ```no_run
//! use sentinel1_safe::{open_sentinel1_dataset, OpenOptions};
//!
//! let ds = open_sentinel1_dataset("S1B_IW_SLC__1SDV_20210401T052622.SAFE", &OpenOptions::with_group("IW1/VV/orbit"))?;
//! println!("{:?}", ds.dims());
//! # Ok::<(), sentinel1_safe::SarError>(())
//! ```

pub mod core;
pub mod dataset;
pub mod io;
pub mod open;
pub mod types;

// Re-export main types and functions for easier access
pub use types::{AcquisitionMode, AttrValue, Attrs, Polarization, ProductType, SarComplex, SarError, SarResult};

pub use dataset::{Dataset, Values, Variable};

pub use io::{GdalRasterReader, ProductSource, RasterData, RasterReader};

pub use crate::core::{
    build_burst_id, calibrate_amplitude, calibrate_intensity, crop_burst_dataset, denoise_intensity, find_bursts_index,
    ground_range_to_slant_range_time, make_stac_item, mosaic_slc_iw, slant_range_time_to_ground_range, BurstQuery,
    CalibrationType, LookupTable, MetadataKind, StacItem, Tolerance,
};

pub use open::{open_sentinel1_dataset, open_sentinel1_dataset_with_reader, OpenOptions};
