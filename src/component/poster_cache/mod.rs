//! 海報快取：以來源識別與輸出參數定址，分層存放

mod cache_key;
mod service;
mod store;

pub use cache_key::{CacheKey, SourceIdentity};
pub use service::{PosterOutcome, PosterService};
pub use store::PosterCache;
