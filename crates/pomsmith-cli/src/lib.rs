mod cli;
mod commands;
mod context;
mod error;
mod output;
mod util;

pub use cli::{run, run_cli};
pub use error::CliError;
