//! Simulate command - drive the cache with a delayed in-process fetcher

use super::drive::{drive, finish};
use crate::cache::build_cache;
use crate::cli::args::{OutputFormat, SimulateArgs};
use crate::config::Config;
use crate::error::MemoResult;
use crate::fetch::DelayFetcher;
use crate::ui::{self, UiContext};
use std::sync::Arc;
use std::time::Duration;

/// Execute the simulate command
pub async fn execute(args: SimulateArgs, config: &Config) -> MemoResult<()> {
    let strategy = args.strategy.unwrap_or(config.cache.strategy);
    let delay = Duration::from_millis(args.delay_ms);

    let ctx = UiContext::detect();
    if args.format == OutputFormat::Text {
        ui::intro(
            &ctx,
            &format!(
                "memo simulate ({} cache, {} fetch delay)",
                strategy,
                ui::format_elapsed(delay)
            ),
        );
    }

    let fetcher = Arc::new(DelayFetcher::new(delay));
    let cache = build_cache(strategy, Arc::clone(&fetcher), &config.cache);
    let summary = drive(
        &ctx,
        cache,
        args.keys,
        args.repeat,
        &config.pipeline,
        args.format,
        |value: &String| value.clone(),
    )
    .await?;

    finish(
        &ctx,
        args.format,
        &summary,
        &[("fetcher calls", fetcher.calls().to_string())],
    )
}
