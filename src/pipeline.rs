use log::info;
use std::{marker::PhantomData, path::PathBuf};

use crate::{
    components::{
        catalog::CatalogResolver,
        file::{gdal_backend::GdalFile, RasterFile},
        mosaic::Mosaic,
        reader::WindowedAssetReader,
        search::{SearchClient, SearchQuery},
        transport::Transport,
    },
    config::PipelineConfig,
    errors::{Result, StacMosaicError},
};

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSummary {
    pub catalog_url: String,
    pub features: usize,
    pub rasters: usize,
    pub width: usize,
    pub height: usize,
    pub output: PathBuf,
}

/// Catalog resolution, search, windowed extraction and merge, one after another.
///
/// The first failing stage ends the run, the output is only written once
/// every stage before it succeeded.
#[derive(Debug)]
pub struct Pipeline<T: Transport, F: RasterFile = GdalFile> {
    config: PipelineConfig,
    transport: T,
    _file: PhantomData<F>,
}

impl<T: Transport> Pipeline<T> {
    pub fn new(config: PipelineConfig, transport: T) -> Self {
        Self::with_file_backend(config, transport)
    }
}

impl<T: Transport, F: RasterFile> Pipeline<T, F> {
    pub fn with_file_backend(config: PipelineConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            _file: PhantomData,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self) -> Result<PipelineSummary> {
        let config = &self.config;
        F::configure(config.download_timeout).map_err(|source| {
            StacMosaicError::DownloadError {
                href: config.collection_url.clone(),
                source,
            }
        })?;

        info!("resolving catalog of {}", config.collection_url);
        let catalog_url = CatalogResolver::new(&self.transport).resolve(&config.collection_url)?;

        let query = SearchQuery::for_collection(
            &config.collection_url,
            config.bbox,
            &config.time_range,
            config.temporal_filter,
        );
        let items = SearchClient::new(&self.transport, config.search_timeouts)
            .search(&catalog_url, &query)?;

        let rasters = WindowedAssetReader::<F>::from_config(config).extract_all(&items)?;
        info!(
            "extracted band {} of asset {} from {} of {} features",
            config.band,
            config.asset,
            rasters.len(),
            items.len()
        );
        let extracted = rasters.len();

        let mosaic = Mosaic::merge(rasters)?;
        mosaic.write(&config.output)?;

        Ok(PipelineSummary {
            catalog_url,
            features: items.len(),
            rasters: extracted,
            width: mosaic.profile.width,
            height: mosaic.profile.height,
            output: config.output.clone(),
        })
    }
}
