//! Output functions for consistent CLI formatting

use super::context::UiContext;
use console::style;
use std::time::Duration;

/// Format an elapsed time the way response lines show it (e.g. "201.4ms")
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.1?}", elapsed)
}

/// Display intro banner
pub fn intro(ctx: &UiContext, title: &str) {
    if ctx.use_fancy_output() {
        cliclack::intro(style(title).cyan().bold()).ok();
    } else {
        println!("{}", style(title).cyan().bold());
    }
}

/// Display success outro
pub fn outro(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::outro(style(message).green().bold()).ok();
    } else {
        println!("{} {}", style("[OK]").green(), message);
    }
}

/// Display a successful response: `key, elapsed, detail`
pub fn response_ok(ctx: &UiContext, key: &str, elapsed: Duration, detail: &str) {
    let line = format!("{}, {}, {}", key, format_elapsed(elapsed), detail);
    if ctx.use_fancy_output() {
        cliclack::log::success(line).ok();
    } else {
        println!("  {} {}", style("[OK]").green(), line);
    }
}

/// Display a failed response
pub fn response_failed(ctx: &UiContext, key: &str, elapsed: Duration, error: &str) {
    let line = format!("{}, {}", key, format_elapsed(elapsed));
    if ctx.use_fancy_output() {
        cliclack::log::error(format!("{}: {}", line, style(error).red())).ok();
    } else {
        println!("  {} {}: {}", style("[FAIL]").red(), line, error);
    }
}

/// Display a warning with a hint
pub fn warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::warning(format!("{} - {}", message, style(hint).dim())).ok();
    } else {
        println!("  {} {} - {}", style("[WARN]").yellow(), message, hint);
    }
}

/// Print styled key-value pair
pub fn key_value(ctx: &UiContext, key: &str, value: &str) {
    if ctx.use_fancy_output() {
        println!("  {}: {}", style(key).dim(), value);
    } else {
        println!("  {}: {}", key, value);
    }
}
