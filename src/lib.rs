pub mod cli;
pub mod commands;
pub mod config;
pub mod filter;
pub mod model;
pub mod output;
pub mod schema;
pub mod store;
pub mod writer;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use model::MonthYear;
pub use store::{Store, StoreError};
