//! Encode settings resolution.
//!
//! Settings come from three layers, lowest precedence first: the configured
//! [`SettingsDefaults`], the output container's codec policy, and per-request
//! [`Overrides`]. Every token is validated against its closed set.

mod config;
mod error;
mod overrides;
mod resolver;

pub use config::{ParsedDefaults, SettingsDefaults};
pub use error::SettingsError;
pub use overrides::Overrides;
pub use resolver::{remux_eligible, EncodeSettings, SettingsResolver};
