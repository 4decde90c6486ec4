//! Engine configuration loaded from `.securepass.toml`.

pub mod settings;

pub use settings::Settings;
