mod health;
mod ingestions;
mod post;
mod search;

pub use health::health_check;
pub use ingestions::get_ingestion;
pub use post::create_post;
pub use search::search_posts;
