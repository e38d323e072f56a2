pub mod config;
pub mod deck;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod picker;
pub mod prompt;
pub mod registry;
pub mod state;
pub mod status;
pub mod ui;
pub mod util;

pub use config::Config;
pub use deck::Deck;
pub use error::{DeckError, HostError};
pub use lifecycle::SpawnVariant;
pub use registry::{ColorIndex, Session, SessionEntry};
pub use ui::App;
