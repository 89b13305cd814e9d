pub mod config;
pub mod logger;
pub mod parsim_toml;

pub use config::*;
pub use logger::{Colors, setup_logging};
pub use parsim_toml::{apply_file_to_opts, load_parsim_toml};
