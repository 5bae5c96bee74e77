//! Shared pipeline runner for the fetch and simulate commands
//!
//! Wires the key producer and consumer to a cache, prints each response as
//! it arrives, and shuts the cache down once the response stream closes.

use crate::cache::{Cache, CacheStats, Shutdown};
use crate::cli::args::OutputFormat;
use crate::config::schema::PipelineConfig;
use crate::error::MemoResult;
use crate::pipeline::{consume_keys, produce_keys, Response};
use crate::ui::{self, UiContext};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// What a pipeline run produced
#[derive(Debug, Serialize)]
pub(crate) struct RunSummary {
    pub responses: usize,
    pub failures: usize,
    pub interrupted: bool,
    pub stats: CacheStats,
}

/// JSON shape of one response line
#[derive(Serialize)]
struct ResponseLine<'a> {
    key: &'a str,
    started_at: DateTime<Utc>,
    elapsed_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Run `keys` through `cache` and report every response
///
/// `describe` renders a successful value for display.
pub(crate) async fn drive<V, D>(
    ctx: &UiContext,
    cache: Arc<dyn Cache<Value = V>>,
    keys: Vec<String>,
    repeat: u32,
    pipeline: &PipelineConfig,
    format: OutputFormat,
    describe: D,
) -> MemoResult<RunSummary>
where
    V: Clone + Send + Sync + 'static,
    D: Fn(&V) -> String,
{
    let stop = CancellationToken::new();
    let interrupt = watch_interrupt(stop.clone(), cache.shutdown_handle());

    let key_stream = produce_keys(keys, repeat, pipeline.buffer, stop.clone());
    let mut responses = consume_keys(Arc::clone(&cache), key_stream, pipeline.buffer, stop.clone());

    let mut count = 0;
    let mut failures = 0;
    while let Some(response) = responses.recv().await {
        count += 1;
        if response.outcome.is_err() {
            failures += 1;
        }
        report(ctx, format, &response, &describe)?;
    }
    interrupt.abort();

    if let Some(shutdown) = cache.shutdown_handle() {
        info!("Starting graceful shutdown");
        shutdown.trigger();
        shutdown.wait().await;
        info!("Shutdown complete");
    }

    Ok(RunSummary {
        responses: count,
        failures,
        interrupted: stop.is_cancelled(),
        stats: cache.stats(),
    })
}

/// Print the run summary, plus any command-specific counters
pub(crate) fn finish(
    ctx: &UiContext,
    format: OutputFormat,
    summary: &RunSummary,
    extra: &[(&str, String)],
) -> MemoResult<()> {
    if format == OutputFormat::Json {
        let mut line = serde_json::to_value(summary)?;
        for (key, value) in extra {
            line[*key] = serde_json::Value::String(value.clone());
        }
        println!("{}", serde_json::json!({ "summary": line }));
        return Ok(());
    }

    println!();
    ui::key_value(ctx, "strategy", summary.stats.strategy.as_str());
    ui::key_value(ctx, "responses", &summary.responses.to_string());
    ui::key_value(ctx, "failures", &summary.failures.to_string());
    ui::key_value(ctx, "fetches", &summary.stats.misses.to_string());
    ui::key_value(ctx, "hits", &summary.stats.hits.to_string());
    for (key, value) in extra {
        ui::key_value(ctx, key, value);
    }

    if summary.interrupted {
        ui::warn_hint(ctx, "Run was interrupted", "Some keys were never requested");
    } else {
        ui::outro(ctx, "Done");
    }
    Ok(())
}

fn report<V, D>(
    ctx: &UiContext,
    format: OutputFormat,
    response: &Response<V>,
    describe: &D,
) -> MemoResult<()>
where
    D: Fn(&V) -> String,
{
    match format {
        OutputFormat::Text => match &response.outcome {
            Ok(value) => ui::response_ok(ctx, &response.key, response.elapsed, &describe(value)),
            Err(e) => ui::response_failed(ctx, &response.key, response.elapsed, &e.to_string()),
        },
        OutputFormat::Json => {
            let (value, error) = match &response.outcome {
                Ok(value) => (Some(describe(value)), None),
                Err(e) => (None, Some(e.to_string())),
            };
            let line = ResponseLine {
                key: &response.key,
                started_at: response.started_at,
                elapsed_ms: response.elapsed.as_secs_f64() * 1000.0,
                value,
                error,
            };
            println!("{}", serde_json::to_string(&line)?);
        }
    }
    Ok(())
}

/// Stop the pipeline, and the cache if it has a worker, on Ctrl-C
fn watch_interrupt(stop: CancellationToken, shutdown: Option<Shutdown>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping");
            stop.cancel();
            if let Some(shutdown) = shutdown {
                shutdown.trigger();
            }
        }
    })
}
