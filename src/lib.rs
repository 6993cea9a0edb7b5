pub use tick_tui::cli;
pub use tick_tui::commands;
pub use tick_tui::config;
pub use tick_tui::logging;
pub use tick_tui::tui;
pub use tick_tui::AppConfig;

pub use tick_core as core;
pub use tick_core::model;
pub use tick_core::store;
pub use tick_core::ApiClient;
