use std::path::PathBuf;

use crate::components::transport::TransportError;

pub type Result<T> = std::result::Result<T, StacMosaicError>;

#[derive(thiserror::Error, Debug)]
pub enum StacMosaicError {
    #[error("Failed to retrieve collection {url}: {reason}")]
    CollectionUnreachable {
        url: String,
        status: Option<u16>,
        reason: String,
    },
    #[error("Catalog URL not found in links of collection {url}")]
    CatalogNotFound { url: String },
    #[error("The search request to {url} timed out")]
    SearchTimeout { url: String },
    #[error("An error occurred during search: {0}")]
    SearchTransportError(#[source] TransportError),
    #[error("Search request to {url} failed with status code: {status}")]
    SearchFailed { url: String, status: u16 },
    #[error("No features found for the given parameters")]
    NoFeaturesFound,
    #[error("The download of {href} timed out: {source}")]
    DownloadTimeout {
        href: String,
        #[source]
        source: DownloadFailure,
    },
    #[error("An error occurred during download of {href}: {source}")]
    DownloadError {
        href: String,
        #[source]
        source: DownloadFailure,
    },
    #[error("Failed to merge rasters: {0}")]
    MergeFailed(#[source] MergeFailure),
    #[error("Failed to write mosaic to {path:?}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: gdal::errors::GdalError,
    },
}

impl StacMosaicError {
    /// Process exit code reported for this failure.
    ///
    /// Collection and catalog failures share `1`, code `5` covers everything
    /// that goes wrong once all assets have been extracted.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::CollectionUnreachable { .. } | Self::CatalogNotFound { .. } => 1,
            Self::SearchTimeout { .. } | Self::SearchTransportError(_) => 2,
            Self::SearchFailed { .. } => 3,
            Self::NoFeaturesFound => 4,
            Self::MergeFailed(_) | Self::WriteFailed { .. } => 5,
            Self::DownloadTimeout { .. } | Self::DownloadError { .. } => 6,
        }
    }

    /// Wrap a per asset failure, telling timeouts apart from other failures.
    pub fn download(href: impl Into<String>, source: DownloadFailure) -> Self {
        let href = href.into();
        if source.is_timeout() {
            Self::DownloadTimeout { href, source }
        } else {
            Self::DownloadError { href, source }
        }
    }

    pub fn is_download(&self) -> bool {
        matches!(
            self,
            Self::DownloadTimeout { .. } | Self::DownloadError { .. }
        )
    }
}

/// Reasons an asset could not be opened or read.
#[derive(thiserror::Error, Debug)]
pub enum DownloadFailure {
    #[error(transparent)]
    Gdal(#[from] gdal::errors::GdalError),
    #[error("band {band} requested but raster only has {count} bands")]
    BandOutOfRange { band: usize, count: usize },
    #[error("raster geotransform can not be inverted")]
    NonInvertibleTransform,
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
    #[error("could not set GDAL option {option}: {source}")]
    ConfigOption {
        option: &'static str,
        #[source]
        source: gdal::errors::GdalError,
    },
}

impl DownloadFailure {
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Gdal(e) => {
                let message = e.to_string().to_lowercase();
                message.contains("timed out") || message.contains("timeout")
            }
            _ => false,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum MergeFailure {
    #[error("no rasters to merge")]
    NoRasters,
    #[error("raster {0} has a geotransform that can not be inverted")]
    NonInvertibleTransform(usize),
    #[error("merged extent has no pixels")]
    EmptyExtent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(StacMosaicError::CatalogNotFound { url: "c".into() }, 1)]
    #[case(StacMosaicError::CollectionUnreachable { url: "c".into(), status: Some(404), reason: "404".into() }, 1)]
    #[case(StacMosaicError::SearchTimeout { url: "s".into() }, 2)]
    #[case(StacMosaicError::SearchTransportError(TransportError::Failed { url: "s".into(), reason: "refused".into() }), 2)]
    #[case(StacMosaicError::SearchFailed { url: "s".into(), status: 500 }, 3)]
    #[case(StacMosaicError::NoFeaturesFound, 4)]
    #[case(StacMosaicError::MergeFailed(MergeFailure::NoRasters), 5)]
    #[case(StacMosaicError::download("a.tif", DownloadFailure::NonInvertibleTransform), 6)]
    fn exit_codes(#[case] error: StacMosaicError, #[case] code: u8) {
        assert_eq!(error.exit_code(), code);
    }

    #[test]
    fn download_timeouts_are_recognised() {
        let failure = DownloadFailure::Gdal(gdal::errors::GdalError::BadArgument(
            "Connection timed out after 30001 milliseconds".into(),
        ));
        assert!(matches!(
            StacMosaicError::download("https://x/a.tif", failure),
            StacMosaicError::DownloadTimeout { .. }
        ));

        let failure = DownloadFailure::BandOutOfRange { band: 3, count: 1 };
        assert!(matches!(
            StacMosaicError::download("a.tif", failure),
            StacMosaicError::DownloadError { .. }
        ));
    }
}
