//! CLI command implementations

pub mod config;
mod drive;
pub mod fetch;
pub mod simulate;

pub use config::execute as config;
pub use fetch::execute as fetch;
pub use simulate::execute as simulate;
