//! CLI command implementations

mod catalog;
mod config_gen;
mod import;
mod token;

pub use catalog::{run_sweep, seed_tags};
pub use config_gen::config_generate;
pub use import::import_file;
pub use token::mint_token;
