mod card;
mod config;

pub use card::normalize_images_path;
pub use card::CardConfig;
pub use card::DEFAULT_IMAGES_PATH;
pub use config::*;
