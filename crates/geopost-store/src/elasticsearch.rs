//! Elasticsearch adapter for the geo-index

use async_trait::async_trait;
use elasticsearch::{
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    params::Refresh,
    Elasticsearch, IndexParts, SearchParts,
};
use geopost_core::error::{Backend, GeopostError, Result};
use geopost_core::models::{IndexSchema, Post, PostId, SearchQuery};
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::ports::GeoIndexStore;

fn index_error(e: impl ToString) -> GeopostError {
    GeopostError::backend(Backend::GeoIndex, e)
}

/// Geo-index backed by a single Elasticsearch node
#[derive(Clone)]
pub struct ElasticsearchGeoIndex {
    client: Elasticsearch,
    index: String,
}

impl ElasticsearchGeoIndex {
    pub fn new(url: &str, index: impl Into<String>) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| GeopostError::ConfigInvalid {
            key: "ELASTICSEARCH_URL".to_string(),
            reason: e.to_string(),
        })?;
        let pool = SingleNodeConnectionPool::new(parsed);
        let transport = TransportBuilder::new(pool).build().map_err(index_error)?;

        Ok(Self { client: Elasticsearch::new(transport), index: index.into() })
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Turn a non-2xx response into an error, keeping the response body
    async fn check(response: Response, action: &str) -> Result<Response> {
        let status = response.status_code();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();

        // Radius queries on a non geo_point field come back as 400 naming the field
        if status.as_u16() == 400 && body.contains("geo_point") {
            return Err(GeopostError::IndexSchema {
                reason: format!("field 'location' is not mapped as a geo-point: {}", body),
            });
        }

        Err(index_error(format!("{} failed with {}: {}", action, status, body)))
    }
}

/// Request body for a paged radius query, nearest first
pub(crate) fn radius_query_body(query: &SearchQuery) -> Value {
    json!({
        "from": query.page.offset,
        "size": query.page.limit,
        "query": {
            "bool": {
                "filter": {
                    "geo_distance": {
                        "distance": query.radius.to_es_string(),
                        "location": {
                            "lat": query.center.lat,
                            "lon": query.center.lon
                        }
                    }
                }
            }
        },
        "sort": [
            {
                "_geo_distance": {
                    "location": {
                        "lat": query.center.lat,
                        "lon": query.center.lon
                    },
                    "order": "asc",
                    "unit": "km"
                }
            }
        ]
    })
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: InnerHits,
}

#[derive(Debug, Deserialize)]
struct InnerHits {
    hits: Vec<PostHit>,
}

#[derive(Debug, Deserialize)]
struct PostHit {
    #[serde(rename = "_source")]
    source: Option<Post>,
}

#[async_trait]
impl GeoIndexStore for ElasticsearchGeoIndex {
    async fn index_exists(&self) -> Result<bool> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[self.index.as_str()]))
            .send()
            .await
            .map_err(index_error)?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            other => Err(index_error(format!("index existence check returned {}", other))),
        }
    }

    async fn create_index(&self, schema: &IndexSchema) -> Result<()> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&self.index))
            .body(schema.to_es_mappings())
            .send()
            .await
            .map_err(index_error)?;

        Self::check(response, "create index").await?;
        tracing::info!(index = %self.index, "Created geo-index");
        Ok(())
    }

    async fn put(&self, id: PostId, post: &Post) -> Result<()> {
        let doc_id = id.to_string();
        let response = self
            .client
            .index(IndexParts::IndexId(&self.index, &doc_id))
            .refresh(Refresh::True)
            .body(post)
            .send()
            .await
            .map_err(index_error)?;

        Self::check(response, "index post").await?;
        Ok(())
    }

    async fn query_radius(&self, query: &SearchQuery) -> Result<Vec<Post>> {
        let response = self
            .client
            .search(SearchParts::Index(&[self.index.as_str()]))
            .body(radius_query_body(query))
            .send()
            .await
            .map_err(index_error)?;

        let response = Self::check(response, "radius search").await?;
        let parsed: SearchResponse = response.json().await.map_err(index_error)?;

        Ok(parsed.hits.hits.into_iter().filter_map(|hit| hit.source).collect())
    }
}
