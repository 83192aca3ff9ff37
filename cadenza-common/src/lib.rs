//! # Cadenza Common Library
//!
//! Shared code for the Cadenza playback services including:
//! - Event types (CadenzaEvent enum) and the EventBus
//! - Bootstrap configuration loading (TOML)
//! - Common error type

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
