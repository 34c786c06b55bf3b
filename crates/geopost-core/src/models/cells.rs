use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Post;

/// Column family holding the post body
pub const POST_FAMILY: &str = "post";

/// Column family holding the coordinates
pub const LOCATION_FAMILY: &str = "location";

/// A single wide-column cell value, addressed by family and qualifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub family: String,
    pub qualifier: String,
    pub value: Vec<u8>,
}

impl Cell {
    pub fn new(family: &str, qualifier: &str, value: impl Into<Vec<u8>>) -> Self {
        Self {
            family: family.to_string(),
            qualifier: qualifier.to_string(),
            value: value.into(),
        }
    }

    /// Value as UTF-8 text, lossy
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.value).into_owned()
    }
}

/// A cell as read back from the store, with its write timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellVersion {
    pub cell: Cell,
    pub timestamp: DateTime<Utc>,
}

/// Lay a post out as column-store cells
///
/// `post:{user,message}` and `location:{lat,lon}` are always written;
/// `post:url` only once an image has been stored.
pub fn post_to_cells(post: &Post) -> Vec<Cell> {
    let mut cells = vec![
        Cell::new(POST_FAMILY, "user", post.user.as_bytes()),
        Cell::new(POST_FAMILY, "message", post.message.as_bytes()),
        Cell::new(LOCATION_FAMILY, "lat", format_coordinate(post.location.lat)),
        Cell::new(LOCATION_FAMILY, "lon", format_coordinate(post.location.lon)),
    ];

    if let Some(url) = post.url.as_deref().filter(|u| !u.is_empty()) {
        cells.push(Cell::new(POST_FAMILY, "url", url.as_bytes()));
    }

    cells
}

/// Shortest decimal string that parses back to the same value, no exponent
pub fn format_coordinate(value: f64) -> String {
    value.to_string()
}

/// Latest value of `family:qualifier` in a row read back from the store
pub fn latest_value<'a>(row: &'a [CellVersion], family: &str, qualifier: &str) -> Option<&'a Cell> {
    row.iter()
        .filter(|v| v.cell.family == family && v.cell.qualifier == qualifier)
        .max_by_key(|v| v.timestamp)
        .map(|v| &v.cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Location, PostId};

    fn sample_post() -> Post {
        Post::new(PostId::new(), "alice", "hello", Location::new(37.77, -122.42).unwrap())
    }

    #[test]
    fn test_cells_without_url() {
        let cells = post_to_cells(&sample_post());
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0], Cell::new("post", "user", "alice"));
        assert_eq!(cells[1], Cell::new("post", "message", "hello"));
        assert_eq!(cells[2], Cell::new("location", "lat", "37.77"));
        assert_eq!(cells[3], Cell::new("location", "lon", "-122.42"));
    }

    #[test]
    fn test_cells_include_url_once_set() {
        let post = sample_post().with_url("https://storage.example.com/img");
        let cells = post_to_cells(&post);
        assert_eq!(cells.len(), 5);
        assert_eq!(cells[4].text(), "https://storage.example.com/img");
    }

    #[test]
    fn test_format_coordinate_has_no_exponent() {
        assert_eq!(format_coordinate(0.0), "0");
        assert_eq!(format_coordinate(1e-7), "0.0000001");
        assert_eq!(format_coordinate(-45.5), "-45.5");
    }

    #[test]
    fn test_latest_value_picks_newest_timestamp() {
        let older = Utc::now() - chrono::Duration::seconds(10);
        let newer = Utc::now();
        let row = vec![
            CellVersion { cell: Cell::new("post", "message", "first"), timestamp: older },
            CellVersion { cell: Cell::new("post", "message", "second"), timestamp: newer },
        ];

        assert_eq!(latest_value(&row, "post", "message").unwrap().text(), "second");
        assert!(latest_value(&row, "post", "user").is_none());
    }
}
