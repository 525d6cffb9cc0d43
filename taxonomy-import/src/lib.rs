pub mod cli;
pub mod discovery;
pub mod graphql;
pub mod load_config;
pub mod pim;

pub use cli::{run, Cli, Commands};
