//! Utility modules

pub mod names;
pub mod paths;
pub mod time;

pub use names::next_tab_name;
pub use paths::{config_path, data_dir, init_data_dir, log_file_path, logs_dir};
pub use time::relative_age;
