//! Product access: manifest, annotation XML and measurement rasters

pub mod annotation;
pub mod manifest;
pub mod product;
pub mod raster;
pub mod xml;

// Re-export main types
pub use annotation::{parse_document, parse_record, parse_records, AnnotationRecord};
pub use manifest::{AcquisitionInfo, FileRoleEntry, Manifest, ProductAttributes, SchemaType};
pub use product::ProductSource;
pub use raster::{GdalRasterReader, RasterData, RasterReader};
pub use xml::{clear_query_cache, XmlNode};
