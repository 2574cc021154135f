use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{
    components::{
        bounds::{BoundingBox, TimeRange},
        transport::{Timeouts, Transport, TransportError},
    },
    config::TemporalFilter,
    errors::{Result, StacMosaicError},
};

pub const SEARCH_LIMIT: usize = 100;
pub const FILTER_LANG: &str = "cql2-json";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchQuery {
    pub limit: usize,
    pub collections: Vec<String>,
    pub bbox: BoundingBox,
    #[serde(rename = "filter-lang")]
    pub filter_lang: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
}

impl SearchQuery {
    pub fn new(collection: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            limit: SEARCH_LIMIT,
            collections: vec![collection.into()],
            bbox,
            filter_lang: FILTER_LANG,
            datetime: None,
        }
    }

    pub fn with_datetime(mut self, time_range: &TimeRange) -> Self {
        self.datetime = Some(time_range.interval());
        self
    }

    /// Query for the collection at `collection_url`.
    ///
    /// The time range is only sent when the temporal filter is enabled.
    pub fn for_collection(
        collection_url: &str,
        bbox: BoundingBox,
        time_range: &TimeRange,
        temporal_filter: TemporalFilter,
    ) -> Self {
        let query = Self::new(collection_id(collection_url), bbox);
        match temporal_filter {
            TemporalFilter::Disabled => query,
            TemporalFilter::Enabled => query.with_datetime(time_range),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetReference {
    #[serde(default)]
    pub href: Option<String>,
}

/// Search result entry, only the fields needed to locate assets.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StacItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub assets: Option<HashMap<String, AssetReference>>,
}

impl StacItem {
    /// Non empty href of `asset_id`, if this item offers it.
    pub fn asset_href(&self, asset_id: &str) -> Option<&str> {
        self.assets
            .as_ref()?
            .get(asset_id)?
            .href
            .as_deref()
            .filter(|href| !href.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Option<Vec<StacItem>>,
}

/// Last path segment of the collection URL, taken as the collection id.
pub fn collection_id(collection_url: &str) -> &str {
    let path = collection_url
        .split(['?', '#'])
        .next()
        .unwrap_or(collection_url)
        .trim_end_matches('/');
    path.rsplit('/').next().unwrap_or(path)
}

pub fn search_endpoint(catalog_url: &str) -> String {
    format!("{}/search", catalog_url.trim_end_matches('/'))
}

/// Runs a single page `cql2-json` search against a catalog.
#[derive(Debug)]
pub struct SearchClient<T: Transport> {
    transport: T,
    timeouts: Timeouts,
}

impl<T: Transport> SearchClient<T> {
    pub fn new(transport: T, timeouts: Timeouts) -> Self {
        Self {
            transport,
            timeouts,
        }
    }

    /// Items in the order the service returned them.
    pub fn search(&self, catalog_url: &str, query: &SearchQuery) -> Result<Vec<StacItem>> {
        let url = search_endpoint(catalog_url);
        let body = serde_json::to_value(query).map_err(|e| {
            StacMosaicError::SearchTransportError(TransportError::Failed {
                url: url.clone(),
                reason: e.to_string(),
            })
        })?;
        debug!("searching {url} with {body}");

        let response = self
            .transport
            .post_json(&url, &body, &self.timeouts)
            .map_err(|e| match e {
                TransportError::Timeout { url } => StacMosaicError::SearchTimeout { url },
                e => StacMosaicError::SearchTransportError(e),
            })?;
        if !response.is_success() {
            return Err(StacMosaicError::SearchFailed {
                url,
                status: response.status,
            });
        }

        let collection: FeatureCollection = response.json().map_err(|e| {
            StacMosaicError::SearchTransportError(TransportError::Failed {
                url: url.clone(),
                reason: format!("invalid search response: {e}"),
            })
        })?;
        let features = collection.features.unwrap_or_default();
        if features.is_empty() {
            return Err(StacMosaicError::NoFeaturesFound);
        }
        info!("search matched {} features", features.len());
        debug!(
            "features: {}",
            features
                .iter()
                .map(|item| item.id.as_deref().unwrap_or("<no id>"))
                .join(", ")
        );
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::transport::fake::{FakeTransport, TIMEOUT};
    use rstest::{fixture, rstest};
    use serde_json::json;
    use std::time::Duration;

    const CATALOG: &str = "https://stac.test/api";
    const SEARCH: &str = "https://stac.test/api/search";

    #[fixture]
    fn timeouts() -> Timeouts {
        Timeouts {
            connect: Duration::from_secs(3),
            read: Duration::from_secs(5),
        }
    }

    #[fixture]
    fn query() -> SearchQuery {
        SearchQuery::new("sentinel-2-l2a", BoundingBox::new(10., 45., 11., 46.))
    }

    #[rstest]
    #[case("https://stac.test/collections/sentinel-2-l2a", "sentinel-2-l2a")]
    #[case("https://stac.test/collections/sentinel-2-l2a/", "sentinel-2-l2a")]
    #[case("https://stac.test/collections/landsat?f=json", "landsat")]
    #[case("dem", "dem")]
    fn collection_id_is_last_segment(#[case] url: &str, #[case] id: &str) {
        assert_eq!(collection_id(url), id);
    }

    #[test]
    fn query_payload() {
        let query = SearchQuery::new("sentinel-2-l2a", BoundingBox::new(10., 45., 11., 46.));
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({
                "limit": 100,
                "collections": ["sentinel-2-l2a"],
                "bbox": [10.0, 45.0, 11.0, 46.0],
                "filter-lang": "cql2-json",
            })
        );
    }

    #[rstest]
    #[case(TemporalFilter::Disabled, None)]
    #[case(TemporalFilter::Enabled, Some("2024-01-01/2024-02-01"))]
    fn temporal_filter(#[case] filter: TemporalFilter, #[case] datetime: Option<&str>) {
        let time_range = TimeRange::new("2024-01-01", "2024-02-01");
        let query = SearchQuery::for_collection(
            "https://stac.test/collections/c",
            BoundingBox::new(0., 0., 1., 1.),
            &time_range,
            filter,
        );
        assert_eq!(query.datetime.as_deref(), datetime);
    }

    #[rstest]
    fn returns_items_in_service_order(timeouts: Timeouts, query: SearchQuery) {
        let transport = FakeTransport::default().with_post(
            SEARCH,
            200,
            json!({"type": "FeatureCollection", "features": [
                {"id": "b", "assets": {"B04": {"href": "b.tif"}}},
                {"id": "a", "assets": {"B04": {"href": "a.tif"}}},
                {"id": "b", "assets": {}},
            ]}),
        );
        let items = SearchClient::new(&transport, timeouts)
            .search(CATALOG, &query)
            .unwrap();
        let ids: Vec<_> = items.iter().map(|i| i.id.as_deref().unwrap()).collect();
        assert_eq!(ids, ["b", "a", "b"]);

        let posted = transport.posted.borrow();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].0, SEARCH);
        assert_eq!(posted[0].1["filter-lang"], "cql2-json");
        assert_eq!(posted[0].2, timeouts);
    }

    #[rstest]
    fn trailing_slash_on_catalog(timeouts: Timeouts, query: SearchQuery) {
        let transport = FakeTransport::default()
            .with_post(SEARCH, 200, json!({"features": [{"id": "a"}]}));
        let items = SearchClient::new(&transport, timeouts)
            .search("https://stac.test/api/", &query)
            .unwrap();
        assert_eq!(items.len(), 1);
    }

    #[rstest]
    fn timeout(timeouts: Timeouts, query: SearchQuery) {
        let transport = FakeTransport::default().with_post_error(SEARCH, TIMEOUT);
        let error = SearchClient::new(&transport, timeouts)
            .search(CATALOG, &query)
            .unwrap_err();
        assert!(matches!(error, StacMosaicError::SearchTimeout { .. }));
        assert_eq!(error.exit_code(), 2);
    }

    #[rstest]
    fn transport_error(timeouts: Timeouts, query: SearchQuery) {
        let transport = FakeTransport::default().with_post_error(SEARCH, "dns failure");
        let error = SearchClient::new(&transport, timeouts)
            .search(CATALOG, &query)
            .unwrap_err();
        assert!(matches!(error, StacMosaicError::SearchTransportError(_)));
        assert_eq!(error.exit_code(), 2);
    }

    #[rstest]
    fn server_error(timeouts: Timeouts, query: SearchQuery) {
        let transport =
            FakeTransport::default().with_post(SEARCH, 500, json!({"code": "ServerError"}));
        let error = SearchClient::new(&transport, timeouts)
            .search(CATALOG, &query)
            .unwrap_err();
        assert!(matches!(
            error,
            StacMosaicError::SearchFailed { status: 500, .. }
        ));
        assert_eq!(error.exit_code(), 3);
    }

    #[rstest]
    #[case(201)]
    #[case(202)]
    fn any_2xx_status_is_success(timeouts: Timeouts, query: SearchQuery, #[case] status: u16) {
        let transport = FakeTransport::default()
            .with_post(SEARCH, status, json!({"features": [{"id": "a"}]}));
        let items = SearchClient::new(&transport, timeouts)
            .search(CATALOG, &query)
            .unwrap();
        assert_eq!(items.len(), 1);
    }

    #[rstest]
    fn empty_2xx_body_is_rejected(timeouts: Timeouts, query: SearchQuery) {
        let transport = FakeTransport::default().with_post(SEARCH, 204, json!(null));
        let error = SearchClient::new(&transport, timeouts)
            .search(CATALOG, &query)
            .unwrap_err();
        assert!(matches!(error, StacMosaicError::SearchTransportError(_)));
        assert_eq!(error.exit_code(), 2);
    }

    #[rstest]
    #[case(json!({"type": "FeatureCollection", "features": []}))]
    #[case(json!({"type": "FeatureCollection"}))]
    fn no_features(timeouts: Timeouts, query: SearchQuery, #[case] body: serde_json::Value) {
        let transport = FakeTransport::default().with_post(SEARCH, 200, body);
        let error = SearchClient::new(&transport, timeouts)
            .search(CATALOG, &query)
            .unwrap_err();
        assert!(matches!(error, StacMosaicError::NoFeaturesFound));
        assert_eq!(error.exit_code(), 4);
    }

    #[test]
    fn asset_href_lookup() {
        let item: StacItem = serde_json::from_value(json!({
            "id": "x",
            "assets": {
                "B04": {"href": "https://x/B04.tif"},
                "B08": {"title": "no href"},
                "B11": {"href": ""},
            }
        }))
        .unwrap();
        assert_eq!(item.asset_href("B04"), Some("https://x/B04.tif"));
        assert_eq!(item.asset_href("B08"), None);
        assert_eq!(item.asset_href("B11"), None);
        assert_eq!(item.asset_href("B02"), None);
        assert_eq!(StacItem::default().asset_href("B04"), None);
    }
}
