pub mod actions;
pub mod api;
pub mod card;
pub mod config;
pub mod engine;
pub mod host;
pub mod state;
pub mod view;

pub use card::Card;
pub use config::CardConfig;
pub use config::Config;
pub use config::ConfigError;
pub use config::LogLevel;
pub use engine::PrinterDescriptor;
pub use engine::Selection;
pub use engine::StatusSnapshot;
pub use state::EntityState;
pub use state::StateSnapshot;
pub use view::CardView;
