use geopost_core::config::LayeredConfig;
use geopost_core::error::{Backend, GeopostError, Result};
use geopost_core::models::{
    Distance, Page, SearchQuery, DEFAULT_PAGE_SIZE, DEFAULT_RADIUS_KM, MAX_PAGE_SIZE,
    MAX_RESULT_WINDOW,
};
use geopost_core::ContentFilter;
use geopost_store::ports::GeoIndexStore;
use std::sync::Arc;
use std::time::Duration;

use crate::models::{SearchPage, SearchRequest};
use crate::steps::bounded;

/// Search defaults and limits
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub default_radius_km: f64,
    pub page_size: usize,
    pub max_page_size: usize,
    pub filter: ContentFilter,
    pub timeout: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_radius_km: DEFAULT_RADIUS_KM,
            page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            filter: ContentFilter::default(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl SearchSettings {
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            default_radius_km: config.default_radius_km.value,
            page_size: config.page_size.value,
            max_page_size: config.max_page_size.value,
            filter: config.content_filter(),
            timeout: config.backend_timeout(),
        }
    }
}

/// Radius search over the geo-index with deny-list filtering
#[derive(Clone)]
pub struct SearchPipeline {
    geo_index: Arc<dyn GeoIndexStore>,
    settings: SearchSettings,
}

impl SearchPipeline {
    pub fn new(geo_index: Arc<dyn GeoIndexStore>, settings: SearchSettings) -> Self {
        Self { geo_index, settings }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Resolve defaults into a concrete query
    ///
    /// Pages reaching past `MAX_RESULT_WINDOW` are rejected as bad input.
    pub fn plan(&self, request: &SearchRequest) -> Result<SearchQuery> {
        request.center.validate()?;

        let radius =
            Distance::kilometers(request.radius_km.unwrap_or(self.settings.default_radius_km));
        radius.validate()?;

        let page = Page::new(
            request.offset.unwrap_or(0),
            request.limit.unwrap_or(self.settings.page_size),
            self.settings.max_page_size,
        );
        if page.offset.saturating_add(page.limit) > MAX_RESULT_WINDOW {
            return Err(GeopostError::invalid(
                "offset",
                format!(
                    "offset ({}) plus limit ({}) exceeds {}",
                    page.offset, page.limit, MAX_RESULT_WINDOW
                ),
            ));
        }

        Ok(SearchQuery::new(request.center).with_radius(radius).with_page(page))
    }

    /// Posts within the radius, nearest first, with filtered messages dropped
    ///
    /// Filtering runs after the page is fetched, so a page can hold fewer
    /// posts than its limit while more pages still exist.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchPage> {
        let query = self.plan(request)?;

        let fetched = bounded(
            Backend::GeoIndex,
            self.settings.timeout,
            self.geo_index.query_radius(&query),
        )
        .await?;

        let full_page = fetched.len() >= query.page.limit;
        let total = fetched.len();

        let posts: Vec<_> = fetched
            .into_iter()
            .filter(|post| !self.settings.filter.is_filtered(&post.message))
            .collect();

        tracing::info!(
            lat = query.center.lat,
            lon = query.center.lon,
            radius = %query.radius.to_es_string(),
            offset = query.page.offset,
            hits = total,
            returned = posts.len(),
            "Search completed"
        );

        Ok(SearchPage {
            posts,
            next_offset: full_page.then(|| query.page.next_offset()),
        })
    }
}
