//! Windowed extraction and mosaicking of STAC assets.
//!
//! A collection URL is resolved to its catalog, the catalog is searched for
//! items over a bounding box, the bounding box window of one band of one
//! asset is read from every item and the windows are merged into a single
//! GeoTIFF.

pub mod components;
pub mod config;
pub mod errors;
mod intersection;
pub mod pipeline;

pub use components::{BoundingBox, Mosaic, TimeRange};
pub use config::{AssetFailurePolicy, PipelineConfig, TemporalFilter};
pub use errors::{Result, StacMosaicError};
pub use pipeline::{Pipeline, PipelineSummary};
