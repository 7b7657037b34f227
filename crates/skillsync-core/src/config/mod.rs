//! Project settings (`skillsync.toml`).
//!
//! Settings are loaded once by the frontend and passed into the engine;
//! nothing in the engine reads them ambiently.

pub mod parser;
pub mod schema;
pub mod store;

pub use parser::{parse_settings, parse_settings_str, to_toml};
pub use schema::{GitSettings, PollerSettings, ProjectSettings, RemoteSettings, Settings};
pub use store::{SETTINGS_FILE, SettingsStore};
