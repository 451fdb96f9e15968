pub mod load;
pub mod save;
pub mod types;

pub use types::{
    Config, DATA_DIR_ENV, Language, MAX_RECENT_PATHS, UserSettings, VIDEO_EXTENSIONS,
};
