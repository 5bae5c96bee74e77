//! Fetch command - fetch URLs through the cache

use super::drive::{drive, finish};
use crate::cache::build_cache;
use crate::cli::args::{FetchArgs, OutputFormat};
use crate::config::Config;
use crate::error::{MemoError, MemoResult};
use crate::fetch::HttpFetcher;
use crate::ui::{self, UiContext};
use std::sync::Arc;
use tracing::debug;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> MemoResult<()> {
    let urls = if args.urls.is_empty() {
        config.pipeline.urls.clone()
    } else {
        args.urls
    };
    if urls.is_empty() {
        return Err(MemoError::User(
            "No URLs to fetch. Pass URLs or set pipeline.urls in the config".to_string(),
        ));
    }

    let strategy = args.strategy.unwrap_or(config.cache.strategy);
    let repeat = args.repeat.unwrap_or(config.pipeline.repeat);
    debug!(
        "Fetching {} URL(s), {} round(s), {} strategy",
        urls.len(),
        u64::from(repeat) + 1,
        strategy
    );

    let ctx = UiContext::detect();
    if args.format == OutputFormat::Text {
        ui::intro(&ctx, &format!("memo fetch ({} cache)", strategy));
    }

    let cache = build_cache(strategy, HttpFetcher::new(&config.fetch), &config.cache);
    let summary = drive(
        &ctx,
        cache,
        urls,
        repeat,
        &config.pipeline,
        args.format,
        |body: &Arc<Vec<u8>>| format!("{} bytes", body.len()),
    )
    .await?;

    finish(&ctx, args.format, &summary, &[])
}
