use std::{fmt::Debug, path::Path, time::Duration};

use crate::{
    components::{
        bounds::PixelWindow,
        raster::{PixelBuffer, RasterProfile},
        transforms::GeoTransform,
    },
    errors::DownloadFailure,
};

pub type FileResult<T> = std::result::Result<T, DownloadFailure>;

/// Raster opened from an asset href.
pub trait RasterFile: Debug + Sized {
    /// Applies process wide read settings before any file is opened.
    fn configure(_download_timeout: Option<Duration>) -> FileResult<()> {
        Ok(())
    }
    fn open(href: &str) -> FileResult<Self>;
    fn size(&self) -> (usize, usize);
    fn num_bands(&self) -> usize;
    fn transform(&self) -> FileResult<GeoTransform>;
    /// Profile of the whole file, as stored on the band `band_index`.
    fn profile(&self, band_index: usize) -> FileResult<RasterProfile>;
    /// Reads `window` of zero based `band_index`, the window must lie inside the raster.
    fn read_window(&self, band_index: usize, window: &PixelWindow) -> FileResult<PixelBuffer>;
}

/// GDAL path for an asset href.
///
/// Remote object stores and HTTP go through GDAL's virtual file systems,
/// anything else is handed over as is.
pub fn gdal_path(href: &str) -> String {
    const SCHEMES: [(&str, &str); 5] = [
        ("http://", "/vsicurl/"),
        ("https://", "/vsicurl/"),
        ("s3://", "/vsis3/"),
        ("gs://", "/vsigs/"),
        ("az://", "/vsiaz/"),
    ];
    for (scheme, prefix) in SCHEMES {
        if let Some(rest) = href.strip_prefix(scheme) {
            return match prefix {
                "/vsicurl/" => format!("{prefix}{href}"),
                _ => format!("{prefix}{rest}"),
            };
        }
    }
    href.strip_prefix("file://").unwrap_or(href).to_string()
}

/// Implementations for gdal
pub mod gdal_backend {
    use super::*;
    use crate::{
        components::raster::{Pixel, PixelType, GTIFF_DRIVER},
        dispatch_pixels,
    };
    use gdal::{
        raster::{Buffer as GdalBuffer, RasterBand},
        Dataset as GdalDataset, DriverManager,
    };
    use log::debug;
    use ndarray::Array2;

    #[derive(Debug)]
    pub struct GdalFile {
        path: String,
        dataset: GdalDataset,
    }

    impl GdalFile {
        fn rasterband(&self, band_index: usize) -> FileResult<RasterBand<'_>> {
            let count = self.num_bands();
            if band_index >= count {
                return Err(DownloadFailure::BandOutOfRange {
                    band: band_index,
                    count,
                });
            }
            Ok(self.dataset.rasterband(band_index + 1)?)
        }
    }

    fn read_band<T: Pixel>(band: &RasterBand, window: &PixelWindow) -> FileResult<PixelBuffer> {
        let buffer = band.read_as::<T>(window.offset(), window.shape(), window.shape(), None)?;
        let array = Array2::from_shape_vec((window.height, window.width), buffer.data().to_vec())?;
        Ok(PixelBuffer::from(array))
    }

    const HTTP_TIMEOUT_OPTION: &str = "GDAL_HTTP_TIMEOUT";

    impl RasterFile for GdalFile {
        fn configure(download_timeout: Option<Duration>) -> FileResult<()> {
            if let Some(timeout) = download_timeout {
                // GDAL only takes whole seconds.
                let seconds = timeout.as_secs().max(1).to_string();
                debug!("setting {HTTP_TIMEOUT_OPTION}={seconds}");
                gdal::config::set_config_option(HTTP_TIMEOUT_OPTION, &seconds).map_err(
                    |source| DownloadFailure::ConfigOption {
                        option: HTTP_TIMEOUT_OPTION,
                        source,
                    },
                )?;
            }
            Ok(())
        }
        fn open(href: &str) -> FileResult<Self> {
            let path = gdal_path(href);
            debug!("opening {path}");
            let dataset = GdalDataset::open(&path)?;
            Ok(GdalFile { path, dataset })
        }
        fn size(&self) -> (usize, usize) {
            self.dataset.raster_size()
        }
        fn num_bands(&self) -> usize {
            self.dataset.raster_count()
        }
        fn transform(&self) -> FileResult<GeoTransform> {
            Ok(GeoTransform::from_gdal(self.dataset.geo_transform()?))
        }
        fn profile(&self, band_index: usize) -> FileResult<RasterProfile> {
            let band = self.rasterband(band_index)?;
            let (width, height) = self.size();
            Ok(RasterProfile {
                driver: self.dataset.driver().short_name(),
                crs: self.dataset.projection(),
                transform: self.transform()?,
                data_type: PixelType::from_gdal(band.band_type()),
                width,
                height,
                count: self.num_bands(),
                nodata: band.no_data_value(),
            })
        }
        fn read_window(&self, band_index: usize, window: &PixelWindow) -> FileResult<PixelBuffer> {
            let band = self.rasterband(band_index)?;
            debug!("reading band {} of {} in {window:?}", band_index + 1, self.path);
            match PixelType::from_gdal(band.band_type()) {
                PixelType::UInt8 => read_band::<u8>(&band, window),
                PixelType::UInt16 => read_band::<u16>(&band, window),
                PixelType::Int16 => read_band::<i16>(&band, window),
                PixelType::UInt32 => read_band::<u32>(&band, window),
                PixelType::Int32 => read_band::<i32>(&band, window),
                PixelType::Float32 => read_band::<f32>(&band, window),
                PixelType::Float64 => read_band::<f64>(&band, window),
            }
        }
    }

    fn write_band<T: Pixel>(
        path: &Path,
        profile: &RasterProfile,
        array: &Array2<T>,
    ) -> gdal::errors::Result<()> {
        let driver_name = if profile.driver.is_empty() {
            GTIFF_DRIVER
        } else {
            profile.driver.as_str()
        };
        debug!(
            "writing {}x{} {:?} raster to {path:?} with {driver_name}",
            profile.width, profile.height, profile.data_type
        );
        let driver = DriverManager::get_driver_by_name(driver_name)?;
        let mut dataset =
            driver.create_with_band_type::<T, _>(path, profile.width, profile.height, 1)?;
        dataset.set_geo_transform(&profile.transform.to_gdal())?;
        if !profile.crs.is_empty() {
            dataset.set_projection(&profile.crs)?;
        }
        let mut band = dataset.rasterband(1)?;
        if profile.nodata.is_some() {
            band.set_no_data_value(profile.nodata)?;
        }
        let shape = (profile.width, profile.height);
        // Row-major order regardless of the array's memory layout.
        let mut gdal_buffer = GdalBuffer::new(shape, array.iter().copied().collect());
        band.write((0, 0), shape, &mut gdal_buffer)
    }

    /// Writes a single band raster with `profile`'s driver, GeoTIFF when it names none.
    pub fn write_raster(
        path: &Path,
        profile: &RasterProfile,
        pixels: &PixelBuffer,
    ) -> gdal::errors::Result<()> {
        dispatch_pixels!(pixels, array => write_band(path, profile, array))
    }
}
