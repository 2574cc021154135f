use geo::Coord;
use log::{debug, info, warn};
use ndarray::{s, Array2};
use std::path::Path;

use crate::{
    components::{
        bounds::Window,
        file::gdal_backend::write_raster,
        raster::{ExtractedRaster, Pixel, PixelBuffer, RasterProfile, GTIFF_DRIVER},
        transforms::GeoTransform,
    },
    errors::{MergeFailure, Result, StacMosaicError},
    intersection::Union,
};

/// Single band raster covering the union of the merged footprints.
#[derive(Debug, Clone)]
pub struct Mosaic {
    pub profile: RasterProfile,
    pub pixels: PixelBuffer,
}

fn merge_failed(failure: MergeFailure) -> StacMosaicError {
    StacMosaicError::MergeFailed(failure)
}

/// Indices of the rasters whose CRS differs from the first one.
fn mixed_crs(rasters: &[ExtractedRaster]) -> Vec<usize> {
    let Some(first) = rasters.first() else {
        return Vec::new();
    };
    rasters
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, raster)| raster.profile.crs != first.profile.crs)
        .map(|(index, _)| index)
        .collect()
}

/// Overlays `rasters` on a `width` x `height` grid, first valid sample wins.
///
/// A destination pixel is empty while it still holds the output nodata (`0`
/// when there is none). Empty pixels take the nearest sample of the next
/// raster covering their center, unless that sample is the raster's own nodata.
fn composite<T: Pixel>(
    rasters: &[ExtractedRaster],
    transform: &GeoTransform,
    width: usize,
    height: usize,
    nodata: Option<T>,
) -> Result<Array2<T>> {
    let empty = nodata.unwrap_or_default();
    let mut merged = Array2::from_elem((height, width), empty);
    let to_pixel = transform
        .inverse()
        .ok_or(merge_failed(MergeFailure::EmptyExtent))?;

    for (index, raster) in rasters.iter().enumerate() {
        let source_to_pixel = raster
            .profile
            .transform
            .inverse()
            .ok_or(merge_failed(MergeFailure::NonInvertibleTransform(index)))?;
        let source_nodata = PixelBuffer::nodata_as::<T>(raster.profile.nodata);
        let source = raster.pixels.cast::<T>(empty);

        let Some(window) = Window::from_bounds(&raster.footprint(), &to_pixel)
            .snap()
            .clip(width, height)
        else {
            continue;
        };
        debug!("raster {index} covers {window:?} of the mosaic");

        let (row_off, col_off) = (window.row_off as usize, window.col_off as usize);
        let mut region = merged.slice_mut(s![
            row_off..row_off + window.height,
            col_off..col_off + window.width
        ]);
        for ((row, col), pixel) in region.indexed_iter_mut() {
            if !pixel.is_nodata(Some(empty)) {
                continue;
            }
            let center = transform.apply(Coord {
                x: (col_off + col) as f64 + 0.5,
                y: (row_off + row) as f64 + 0.5,
            });
            let sample = source_to_pixel.apply(center);
            if sample.x < 0. || sample.y < 0. {
                continue;
            }
            match source.get((sample.y.floor() as usize, sample.x.floor() as usize)) {
                Some(&value) if !value.is_nodata(source_nodata) => *pixel = value,
                _ => {}
            }
        }
    }
    Ok(merged)
}

impl Mosaic {
    /// Merges `rasters` in order, earlier rasters win where they overlap.
    ///
    /// Resolution, CRS, data type and nodata come from the first raster.
    pub fn merge(rasters: Vec<ExtractedRaster>) -> Result<Self> {
        let first = rasters
            .first()
            .ok_or(merge_failed(MergeFailure::NoRasters))?;
        let (res_x, res_y) = first.profile.transform.resolution();
        let extent = rasters
            .iter()
            .map(ExtractedRaster::footprint)
            .reduce(|extent, footprint| extent.union(&footprint))
            .ok_or(merge_failed(MergeFailure::NoRasters))?;

        let width = (extent.width() / res_x).round();
        let height = (extent.height() / res_y).round();
        if !(width >= 1. && height >= 1.) {
            return Err(merge_failed(MergeFailure::EmptyExtent));
        }
        let (width, height) = (width as usize, height as usize);
        let mixed = mixed_crs(&rasters);
        if !mixed.is_empty() {
            warn!(
                "rasters {mixed:?} do not share the CRS of the first raster, merging without reprojection"
            );
        }
        let transform = GeoTransform::north_up(extent.min().x, extent.max().y, res_x, res_y);
        info!(
            "merging {} rasters into a {width}x{height} mosaic",
            rasters.len()
        );

        let pixel_type = first.pixels.pixel_type();
        let nodata = first.profile.nodata;
        let pixels = crate::with_pixel_type!(pixel_type, T => PixelBuffer::from(composite::<T>(
            &rasters,
            &transform,
            width,
            height,
            PixelBuffer::nodata_as::<T>(nodata),
        )?));

        let profile = RasterProfile {
            driver: GTIFF_DRIVER.to_string(),
            transform,
            data_type: pixel_type,
            width,
            height,
            count: 1,
            ..first.profile.clone()
        };
        Ok(Self { profile, pixels })
    }

    /// Writes the mosaic as a single band GeoTIFF.
    ///
    /// When the write fails a file created by it is removed again, a file that
    /// was already at `path` is left alone.
    pub fn write(&self, path: &Path) -> Result<()> {
        let existed = path.exists();
        write_raster(path, &self.profile, &self.pixels).map_err(|source| {
            if !existed {
                let _ = std::fs::remove_file(path);
            }
            StacMosaicError::WriteFailed {
                path: path.to_path_buf(),
                source,
            }
        })?;
        info!("wrote mosaic to {path:?}");
        Ok(())
    }
}
