use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{GeopostError, Result};

/// Unique identifier for a post
///
/// Used verbatim as the document id in the geo-index, the row key in the
/// column store and the object key for an attached image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub Uuid);

impl PostId {
    /// Generate a fresh random (v4) identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PostId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PostId {
    type Err = GeopostError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| GeopostError::invalid("post id", e.to_string()))
    }
}

/// A point in decimal degrees (WGS 84)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    /// Build a location, rejecting non-finite or out-of-range coordinates
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        let location = Self { lat, lon };
        location.validate()?;
        Ok(location)
    }

    /// Parse a location from raw request fields
    ///
    /// Missing or malformed values are rejected rather than read as zero.
    pub fn parse(lat: Option<&str>, lon: Option<&str>) -> Result<Self> {
        let lat = parse_coordinate("lat", lat)?;
        let lon = parse_coordinate("lon", lon)?;
        Self::new(lat, lon)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(GeopostError::invalid(
                "lat",
                format!("{} is outside [-90, 90]", self.lat),
            ));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(GeopostError::invalid(
                "lon",
                format!("{} is outside [-180, 180]", self.lon),
            ));
        }
        Ok(())
    }
}

fn parse_coordinate(field: &str, raw: Option<&str>) -> Result<f64> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
        GeopostError::invalid(field, "value is required")
    })?;

    raw.parse::<f64>()
        .map_err(|_| GeopostError::invalid(field, format!("'{}' is not a number", raw)))
}

/// A user-submitted geotagged post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub user: String,
    pub message: String,
    pub location: Location,

    /// Public URL of the attached image; serialized as `""` when absent
    #[serde(default, with = "url_field")]
    pub url: Option<String>,
}

impl Post {
    /// Assemble a post without an image
    pub fn new(
        id: PostId,
        user: impl Into<String>,
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            id,
            user: user.into(),
            message: message.into(),
            location,
            url: None,
        }
    }

    /// Attach the retrieval URL of a stored image
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn has_url(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// `Option<String>` on the wire as a plain string, empty meaning absent
mod url_field {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.filter(|s| !s.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_id_roundtrip_through_string() {
        let id = PostId::new();
        let parsed: PostId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_post_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<PostId>().is_err());
    }

    #[test]
    fn test_location_parse_valid() {
        let loc = Location::parse(Some("37.77"), Some(" -122.42 ")).unwrap();
        assert_eq!(loc.lat, 37.77);
        assert_eq!(loc.lon, -122.42);
    }

    #[test]
    fn test_location_parse_rejects_missing_and_malformed() {
        assert!(matches!(
            Location::parse(None, Some("1.0")),
            Err(GeopostError::InvalidInput { ref field, .. }) if field == "lat"
        ));
        assert!(matches!(
            Location::parse(Some("1.0"), Some("")),
            Err(GeopostError::InvalidInput { ref field, .. }) if field == "lon"
        ));
        assert!(Location::parse(Some("abc"), Some("1.0")).is_err());
    }

    #[test]
    fn test_location_rejects_out_of_range() {
        assert!(Location::new(90.5, 0.0).is_err());
        assert!(Location::new(0.0, -180.1).is_err());
        assert!(Location::new(f64::NAN, 0.0).is_err());
        assert!(Location::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_post_json_shape() {
        let post = Post::new(PostId::new(), "alice", "hello", Location::new(37.77, -122.42).unwrap());
        let value = serde_json::to_value(&post).unwrap();

        assert_eq!(value["user"], "alice");
        assert_eq!(value["message"], "hello");
        assert_eq!(value["location"]["lat"], 37.77);
        assert_eq!(value["location"]["lon"], -122.42);
        assert_eq!(value["url"], "");
    }

    #[test]
    fn test_empty_url_reads_back_as_absent() {
        let json = format!(
            r#"{{"id":"{}","user":"bob","message":"hi","location":{{"lat":1.0,"lon":2.0}},"url":""}}"#,
            PostId::new()
        );
        let post: Post = serde_json::from_str(&json).unwrap();
        assert!(post.url.is_none());
        assert!(!post.has_url());

        let with_url = post.with_url("https://cdn.example.com/x");
        assert!(with_url.has_url());
    }
}
