//! Lector Config
//!
//! This crate contains the serializable input types for lector. These types
//! describe a translation request before the engine turns it into a run
//! record, plus the settings that supply defaults for requests and the
//! supervisor.
//!
//! Configuration can be loaded from:
//! - JSON request files (via CLI or a UI collaborator)
//! - A JSON settings file (`settings.json` in the data directory)

mod error;
mod request;
mod settings;

pub use error::ConfigError;
pub use request::TranslationRequest;
pub use settings::{DEFAULT_GEMINI_MODEL, Settings};
