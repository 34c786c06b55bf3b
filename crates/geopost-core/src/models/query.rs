use serde::{Deserialize, Serialize};

use super::Location;
use crate::error::{GeopostError, Result};

/// Radius used when a search does not name one
pub const DEFAULT_RADIUS_KM: f64 = 200.0;

/// Page size used when a search does not name one
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Hard upper bound on a single page
pub const MAX_PAGE_SIZE: usize = 1000;

/// Deepest result a search may reach, `offset + limit`, matching the Elasticsearch window
pub const MAX_RESULT_WINDOW: usize = 10_000;

/// Distance units for spatial operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DistanceUnit {
    Meters,
    #[default]
    Kilometers,
}

impl DistanceUnit {
    /// Convert a distance value to meters
    pub fn to_meters(&self, value: f64) -> f64 {
        match self {
            DistanceUnit::Meters => value,
            DistanceUnit::Kilometers => value * 1000.0,
        }
    }

    /// Suffix understood by Elasticsearch distance strings
    pub fn suffix(&self) -> &'static str {
        match self {
            DistanceUnit::Meters => "m",
            DistanceUnit::Kilometers => "km",
        }
    }
}

/// Distance with unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distance {
    pub value: f64,
    pub unit: DistanceUnit,
}

impl Distance {
    pub fn new(value: f64, unit: DistanceUnit) -> Self {
        Self { value, unit }
    }

    pub fn kilometers(value: f64) -> Self {
        Self::new(value, DistanceUnit::Kilometers)
    }

    pub fn to_meters(&self) -> f64 {
        self.unit.to_meters(self.value)
    }

    /// Render as an Elasticsearch distance string, e.g. `200km`
    pub fn to_es_string(&self) -> String {
        format!("{}{}", self.value, self.unit.suffix())
    }

    /// Parse an optional kilometre value, falling back to `default_km`
    pub fn parse_km(raw: Option<&str>, default_km: f64) -> Result<Self> {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(Self::kilometers(default_km));
        };

        let value: f64 = raw
            .parse()
            .map_err(|_| GeopostError::invalid("range", format!("'{}' is not a number", raw)))?;

        let distance = Self::kilometers(value);
        distance.validate()?;
        Ok(distance)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.value.is_finite() || self.value <= 0.0 {
            return Err(GeopostError::invalid(
                "range",
                format!("{} must be a positive distance", self.value),
            ));
        }
        Ok(())
    }
}

/// Offset/limit window over search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self { offset: 0, limit: DEFAULT_PAGE_SIZE }
    }
}

impl Page {
    /// Build a page, clamping `limit` into `1..=max_limit`
    pub fn new(offset: usize, limit: usize, max_limit: usize) -> Self {
        Self {
            offset,
            limit: limit.clamp(1, max_limit.max(1)),
        }
    }

    pub fn next_offset(&self) -> usize {
        self.offset + self.limit
    }
}

/// Geo-radius search request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub center: Location,
    pub radius: Distance,
    pub page: Page,
}

impl SearchQuery {
    /// Query with the default radius and page
    pub fn new(center: Location) -> Self {
        Self {
            center,
            radius: Distance::kilometers(DEFAULT_RADIUS_KM),
            page: Page::default(),
        }
    }

    pub fn with_radius(mut self, radius: Distance) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.page = page;
        self
    }
}
