//! Shared types, config, error definitions and collaborator traits for the
//! volatility bot.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::BotConfig;
pub use error::Error;
pub use traits::{ChatTransport, VolatilitySource};
pub use types::*;

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
