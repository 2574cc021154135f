use log::{debug, info, warn};
use std::marker::PhantomData;

use crate::{
    components::{
        bounds::{BoundingBox, Window},
        file::{gdal_backend::GdalFile, FileResult, RasterFile},
        raster::{ExtractedRaster, RasterProfile},
        search::StacItem,
    },
    config::{AssetFailurePolicy, PipelineConfig},
    errors::{DownloadFailure, Result, StacMosaicError},
};

/// Extracts the bounding box window of one band of a named asset.
#[derive(Debug)]
pub struct WindowedAssetReader<F: RasterFile = GdalFile> {
    asset: String,
    band: usize,
    bbox: BoundingBox,
    policy: AssetFailurePolicy,
    _file: PhantomData<F>,
}

impl<F: RasterFile> WindowedAssetReader<F> {
    pub fn new(
        asset: impl Into<String>,
        band: usize,
        bbox: BoundingBox,
        policy: AssetFailurePolicy,
    ) -> Self {
        Self {
            asset: asset.into(),
            band,
            bbox,
            policy,
            _file: PhantomData,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.asset.clone(),
            config.band,
            config.bbox,
            config.asset_failure_policy,
        )
    }

    fn read(&self, href: &str) -> FileResult<Option<ExtractedRaster>> {
        let file = F::open(href)?;
        let source = file.profile(self.band)?;
        let inverse = source
            .transform
            .inverse()
            .ok_or(DownloadFailure::NonInvertibleTransform)?;

        let snapped = Window::from_bounds(&self.bbox, &inverse).snap();
        let Some(window) = snapped.clip(source.width, source.height) else {
            debug!("{href} does not overlap the bounding box, {snapped:?} is outside the raster");
            return Ok(None);
        };
        let pixels = file.read_window(self.band, &window)?;

        let profile = RasterProfile {
            transform: source.transform.for_window(&window),
            width: window.width,
            height: window.height,
            count: 1,
            ..source
        };
        Ok(Some(ExtractedRaster { profile, pixels }))
    }

    /// Window of `href`, `None` when the raster does not overlap the bounding box.
    ///
    /// The file is closed before returning, only the in memory window is kept.
    pub fn extract(&self, href: &str) -> Result<Option<ExtractedRaster>> {
        self.read(href)
            .map_err(|source| StacMosaicError::download(href, source))
    }

    /// Windows of every item offering the asset, in item order.
    ///
    /// Items without the asset or without an href for it are left out.
    pub fn extract_all(&self, items: &[StacItem]) -> Result<Vec<ExtractedRaster>> {
        let mut rasters = Vec::with_capacity(items.len());
        for item in items {
            let Some(href) = item.asset_href(&self.asset) else {
                continue;
            };
            match self.extract(href) {
                Ok(Some(raster)) => {
                    info!(
                        "extracted {}x{} window from {href}",
                        raster.profile.width, raster.profile.height
                    );
                    rasters.push(raster)
                }
                Ok(None) => {}
                Err(e) if self.policy == AssetFailurePolicy::Skip && e.is_download() => {
                    warn!("skipping asset {} of item {:?}: {e}", self.asset, item.id)
                }
                Err(e) => return Err(e),
            }
        }
        Ok(rasters)
    }
}
