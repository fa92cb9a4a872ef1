//! Core dataset builders and SAR geometry helpers

pub mod burst;
pub mod calibrate;
pub mod conventions;
pub mod conversion;
pub mod footprint;
pub mod groups;
pub mod interp;
pub mod measurement;
pub mod metadata;
pub mod stac;

// Re-export main types
pub use burst::{crop_burst_dataset, find_bursts_index, mosaic_slc_iw, BurstInfo, BurstQuery, DEFAULT_MOSAIC_CROP};
pub use calibrate::{
    calibrate_amplitude, calibrate_intensity, denoise_intensity, CalibrationProcessor, CalibrationType, LookupTable, Tolerance,
};
pub use conversion::{ground_range_to_slant_range_time, slant_range_time_to_ground_range, CoordinateConversion};
pub use footprint::{build_burst_id, burst_labels, compute_burst_centres, get_footprint_linestring, make_geospatial_attributes};
pub use groups::{find_available_groups, normalise_group, override_product_files, BurstSelector, GroupPath, GroupTable};
pub use measurement::open_pol_dataset;
pub use metadata::MetadataKind;
pub use stac::{make_stac_item, StacItem};
