//! Radius behaviour of the in-memory geo-index around fixed distances

use geopost_core::geo::destination;
use geopost_core::models::{Distance, IndexSchema, Location, Post, PostId, SearchQuery};
use geopost_store::memory::MemoryGeoIndex;
use geopost_store::{ensure_index, GeoIndexStore};

fn origin() -> Location {
    Location::new(37.7749, -122.4194).unwrap()
}

async fn index_at(index: &MemoryGeoIndex, km: f64, message: &str) -> Post {
    let location = destination(&origin(), 45.0, km * 1000.0);
    let post = Post::new(PostId::new(), "tester", message, location);
    index.put(post.id, &post).await.unwrap();
    post
}

async fn messages_within(index: &MemoryGeoIndex, km: f64) -> Vec<String> {
    let query = SearchQuery::new(origin()).with_radius(Distance::kilometers(km));
    index
        .query_radius(&query)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.message)
        .collect()
}

#[tokio::test]
async fn test_radius_includes_exactly_the_posts_inside() {
    let index = MemoryGeoIndex::new();
    assert!(ensure_index(&index, &IndexSchema::posts()).await.unwrap());

    index_at(&index, 10.0, "ten").await;
    index_at(&index, 50.0, "fifty").await;
    index_at(&index, 190.0, "one-ninety").await;

    assert_eq!(messages_within(&index, 5.0).await, Vec::<String>::new());
    assert_eq!(messages_within(&index, 20.0).await, vec!["ten"]);
    assert_eq!(messages_within(&index, 100.0).await, vec!["ten", "fifty"]);
    assert_eq!(messages_within(&index, 200.0).await, vec!["ten", "fifty", "one-ninety"]);
}

#[tokio::test]
async fn test_boundary_is_inclusive() {
    let index = MemoryGeoIndex::new();
    ensure_index(&index, &IndexSchema::posts()).await.unwrap();

    index_at(&index, 1.0, "edge").await;

    assert_eq!(messages_within(&index, 1.0).await, vec!["edge"]);
    assert!(messages_within(&index, 0.999).await.is_empty());
}

#[tokio::test]
async fn test_ensure_index_is_idempotent() {
    let index = MemoryGeoIndex::new();
    assert!(ensure_index(&index, &IndexSchema::posts()).await.unwrap());
    assert!(!ensure_index(&index, &IndexSchema::posts()).await.unwrap());
    assert_eq!(index.schema(), Some(IndexSchema::posts()));
}
