pub mod keys;
mod settings;

pub use keys::{parse_key_notation, KeyCombo, KeyParseError};
pub use settings::{Config, KeysConfig, PromptConfig, StatusConfig, StatusStyle, EXAMPLE_CONFIG};
