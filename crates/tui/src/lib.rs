pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod tui;

pub use tick_core as core;
pub use tick_core::model;
pub use tick_core::store;

pub use tick_core::AppConfig;
