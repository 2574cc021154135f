//! Run configuration of the retrieval and mosaic pipeline.

use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

use crate::components::{
    bounds::{BoundingBox, TimeRange},
    transport::Timeouts,
};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_CONNECT_TIMEOUT,
            read: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// What to do when an item offers the asset but it can not be opened or read.
///
/// Items that do not offer the asset at all are always skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetFailurePolicy {
    /// Stop the run on the first unreadable asset.
    #[default]
    Abort,
    /// Log the failure and leave the item out of the mosaic.
    Skip,
}

/// Whether the time range is sent as the search `datetime`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalFilter {
    #[default]
    Disabled,
    Enabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub bbox: BoundingBox,
    pub time_range: TimeRange,
    /// Asset id looked up in every matched item.
    pub asset: String,
    /// Zero based band index.
    pub band: usize,
    pub collection_url: String,
    pub output: PathBuf,
    #[serde(default)]
    pub search_timeouts: Timeouts,
    /// Forwarded to GDAL as `GDAL_HTTP_TIMEOUT`, GDAL's default when unset.
    #[serde(default)]
    pub download_timeout: Option<Duration>,
    #[serde(default)]
    pub asset_failure_policy: AssetFailurePolicy,
    #[serde(default)]
    pub temporal_filter: TemporalFilter,
}

impl PipelineConfig {
    pub fn new(
        bbox: BoundingBox,
        time_range: TimeRange,
        asset: impl Into<String>,
        band: usize,
        collection_url: impl Into<String>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            bbox,
            time_range,
            asset: asset.into(),
            band,
            collection_url: collection_url.into(),
            output: output.into(),
            search_timeouts: Timeouts::default(),
            download_timeout: None,
            asset_failure_policy: AssetFailurePolicy::default(),
            temporal_filter: TemporalFilter::default(),
        }
    }

    pub fn with_search_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.search_timeouts = timeouts;
        self
    }

    pub fn with_download_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.download_timeout = timeout;
        self
    }

    pub fn with_asset_failure_policy(mut self, policy: AssetFailurePolicy) -> Self {
        self.asset_failure_policy = policy;
        self
    }

    pub fn with_temporal_filter(mut self, filter: TemporalFilter) -> Self {
        self.temporal_filter = filter;
        self
    }
}
