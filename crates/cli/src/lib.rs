pub mod app;
pub mod commands;
pub mod config;
pub mod prompt;
pub mod terminal;

pub use app::App;
pub use commands::Command;
pub use config::Config;
