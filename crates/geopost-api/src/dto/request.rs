use geopost_core::error::{GeopostError, Result};
use geopost_core::models::Location;
use geopost_pipeline::SearchRequest;
use serde::Deserialize;

/// Query string of `GET /search`
///
/// Every field is taken as text so malformed numbers surface as
/// `InvalidInput` with the field name instead of a generic rejection.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub range: Option<String>,
    pub offset: Option<String>,
    pub limit: Option<String>,
}

fn present(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_field<T: std::str::FromStr>(field: &str, raw: &Option<String>) -> Result<Option<T>> {
    present(raw)
        .map(|s| {
            s.parse::<T>()
                .map_err(|_| GeopostError::invalid(field, format!("'{}' is not a valid number", s)))
        })
        .transpose()
}

impl SearchParams {
    pub fn into_request(self) -> Result<SearchRequest> {
        let center = Location::parse(present(&self.lat), present(&self.lon))?;
        Ok(SearchRequest {
            center,
            radius_km: parse_field("range", &self.range)?,
            offset: parse_field("offset", &self.offset)?,
            limit: parse_field("limit", &self.limit)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(lat: &str, lon: &str) -> SearchParams {
        SearchParams {
            lat: Some(lat.to_string()),
            lon: Some(lon.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_left_unset() {
        let request = params("37.77", "-122.42").into_request().unwrap();
        assert_eq!(request.radius_km, None);
        assert_eq!(request.offset, None);
        assert_eq!(request.limit, None);
    }

    #[test]
    fn test_malformed_coordinate_rejected() {
        let err = params("abc", "1").into_request().unwrap_err();
        assert!(matches!(err, GeopostError::InvalidInput { ref field, .. } if field == "lat"));
    }

    #[test]
    fn test_missing_coordinate_rejected() {
        let missing = SearchParams { lat: Some("1".into()), ..Default::default() };
        assert!(missing.into_request().is_err());
    }

    #[test]
    fn test_malformed_range_and_limit_rejected() {
        let mut p = params("1", "1");
        p.range = Some("far".into());
        assert!(p.into_request().is_err());

        let mut p = params("1", "1");
        p.limit = Some("-3".into());
        assert!(p.into_request().is_err());
    }

    #[test]
    fn test_empty_range_means_default() {
        let mut p = params("1", "1");
        p.range = Some("".into());
        assert_eq!(p.into_request().unwrap().radius_km, None);
    }
}
