//! 功能元件模組
//!
//! `poster_generator` 負責挑選畫面並輸出海報，`poster_cache` 負責以內容定址保存結果

pub mod poster_cache;
pub mod poster_generator;

pub use poster_cache::{PosterCache, PosterService};
pub use poster_generator::{PosterGenerator, PosterRenderer};
