use log::{debug, info};
use serde::Deserialize;

use crate::{
    components::transport::Transport,
    errors::{Result, StacMosaicError},
};

#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub rel: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Collection {
    #[serde(default)]
    links: Vec<Link>,
}

/// First `root` or `parent` link in document order.
///
/// Neither relation is preferred over the other. A matching link without an
/// `href` still ends the lookup.
pub fn catalog_link(links: &[Link]) -> Option<&str> {
    links
        .iter()
        .find(|link| matches!(link.rel.as_deref(), Some("root" | "parent")))
        .and_then(|link| link.href.as_deref())
        .filter(|href| !href.is_empty())
}

/// Resolves a collection URL to the catalog that serves it.
#[derive(Debug)]
pub struct CatalogResolver<T: Transport> {
    transport: T,
}

impl<T: Transport> CatalogResolver<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn resolve(&self, collection_url: &str) -> Result<String> {
        let unreachable = |status, reason: String| StacMosaicError::CollectionUnreachable {
            url: collection_url.to_string(),
            status,
            reason,
        };

        let response = self
            .transport
            .get(collection_url)
            .map_err(|e| unreachable(None, e.to_string()))?;
        if !response.is_success() {
            return Err(unreachable(
                Some(response.status),
                format!("status code {}", response.status),
            ));
        }

        let collection: Collection = response
            .json()
            .map_err(|e| unreachable(Some(response.status), e.to_string()))?;
        debug!("collection has {} links", collection.links.len());

        let catalog = catalog_link(&collection.links)
            .ok_or_else(|| StacMosaicError::CatalogNotFound {
                url: collection_url.to_string(),
            })?
            .to_string();
        info!("resolved catalog {catalog}");
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::transport::fake::FakeTransport;
    use rstest::rstest;
    use serde_json::json;

    const COLLECTION: &str = "https://stac.test/collections/sentinel-2-l2a";

    fn links(links: serde_json::Value) -> Vec<Link> {
        serde_json::from_value(links).unwrap()
    }

    #[rstest]
    #[case(json!([{"rel": "self", "href": "s"}, {"rel": "root", "href": "r"}]), Some("r"))]
    #[case(json!([{"rel": "parent", "href": "p"}, {"rel": "root", "href": "r"}]), Some("p"))]
    #[case(json!([{"rel": "root", "href": "r"}, {"rel": "parent", "href": "p"}]), Some("r"))]
    #[case(json!([{"rel": "root"}, {"rel": "parent", "href": "p"}]), None)]
    #[case(json!([{"rel": "items", "href": "i"}, {"href": "x"}]), None)]
    #[case(json!([]), None)]
    fn first_root_or_parent_link(#[case] value: serde_json::Value, #[case] expected: Option<&str>) {
        assert_eq!(catalog_link(&links(value)), expected);
    }

    #[test_log::test]
    fn resolves_catalog() {
        let transport = FakeTransport::default().with_get(
            COLLECTION,
            200,
            json!({"id": "sentinel-2-l2a", "links": [
                {"rel": "self", "href": COLLECTION},
                {"rel": "parent", "href": "https://stac.test"},
            ]}),
        );
        let catalog = CatalogResolver::new(&transport).resolve(COLLECTION).unwrap();
        assert_eq!(catalog, "https://stac.test");
    }

    #[test]
    fn missing_links_is_catalog_not_found() {
        let transport = FakeTransport::default().with_get(COLLECTION, 200, json!({"id": "x"}));
        let error = CatalogResolver::new(&transport)
            .resolve(COLLECTION)
            .unwrap_err();
        assert!(matches!(error, StacMosaicError::CatalogNotFound { .. }));
        assert_eq!(error.exit_code(), 1);
    }

    #[rstest]
    #[case(404)]
    #[case(503)]
    fn failed_status_is_unreachable(#[case] status: u16) {
        let transport = FakeTransport::default().with_get(COLLECTION, status, json!({}));
        let error = CatalogResolver::new(&transport)
            .resolve(COLLECTION)
            .unwrap_err();
        assert!(matches!(
            error,
            StacMosaicError::CollectionUnreachable { status: Some(s), .. } if s == status
        ));
    }

    #[test]
    fn transport_failure_is_unreachable() {
        let transport = FakeTransport::default();
        let error = CatalogResolver::new(&transport)
            .resolve(COLLECTION)
            .unwrap_err();
        assert!(matches!(
            error,
            StacMosaicError::CollectionUnreachable { status: None, .. }
        ));
    }
}
