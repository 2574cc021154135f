pub mod bounds;
pub mod catalog;
pub mod file;
pub mod mosaic;
pub mod raster;
pub mod reader;
pub mod search;
pub mod transforms;
pub mod transport;

pub use bounds::{BoundingBox, PixelWindow, TimeRange, Window};
pub use catalog::CatalogResolver;
pub use file::{gdal_backend::GdalFile, RasterFile};
pub use mosaic::Mosaic;
pub use raster::{ExtractedRaster, PixelBuffer, PixelType, RasterProfile};
pub use reader::WindowedAssetReader;
pub use search::{SearchClient, SearchQuery, StacItem};
pub use transforms::GeoTransform;
pub use transport::{reqwest_backend::ReqwestTransport, Timeouts, Transport};
