pub mod article;
pub mod error;
pub mod front_matter;
pub mod hash;
pub mod image;
pub mod search;
pub mod slug;

pub use article::Article;
pub use error::FrontMatterError;
pub use front_matter::{FrontMatter, parse_article, split_front_matter};
pub use hash::content_hash;
pub use image::{ImageInfo, ImageSize};
pub use search::{
    SearchRequest, SearchResult, categories, related, relatedness, search, sort_newest_first, tags,
};
pub use slug::slugify;
