//! UI module for CLI output
//!
//! Uses `cliclack` log lines in an interactive terminal, with a plain
//! `[OK]` / `[FAIL]` fallback when output is piped or running in CI.

mod context;
mod output;

pub use context::UiContext;
pub use output::{
    format_elapsed, intro, key_value, outro, response_failed, response_ok, warn_hint,
};
