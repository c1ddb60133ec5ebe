pub mod config;
pub mod controllers;
pub mod dto;
pub mod error;
pub mod logging;
pub mod server;
pub mod state;

pub use config::{Cli, ConfigError, ServerConfig};
pub use error::AppError;
pub use server::{app_config, run};
pub use state::AppState;
