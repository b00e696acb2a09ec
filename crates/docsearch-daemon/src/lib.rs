//! docsearch command-line library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (index, find, translate)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands, IndexArgs};
pub use commands::{
    build_payload, handle_find, handle_index, handle_translate, init_logging, load_settings,
};
