//! Integration tests for Memo

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn memo() -> Command {
        cargo_bin_cmd!("memo")
    }

    /// Command isolated from any user or project config
    fn memo_isolated(temp: &TempDir) -> Command {
        let mut cmd = memo();
        cmd.current_dir(temp.path())
            .env("MEMO_CONFIG", temp.path().join("config.toml"))
            .arg("--no-local");
        cmd
    }

    #[test]
    fn help_displays() {
        memo()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("duplicate-suppressing"));
    }

    #[test]
    fn version_displays() {
        memo()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("memo"));
    }

    #[test]
    fn config_path_honors_env() {
        let temp = TempDir::new().unwrap();
        memo_isolated(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let temp = TempDir::new().unwrap();
        memo_isolated(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"))
            .stdout(predicate::str::contains("strategy = \"confinement\""));
    }

    #[test]
    fn config_init_writes_file_once() {
        let temp = TempDir::new().unwrap();
        memo_isolated(&temp).args(["config", "init"]).assert().success();
        assert!(temp.path().join("config.toml").is_file());

        memo_isolated(&temp)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--force"));
    }

    #[test]
    fn invalid_config_shows_hint() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.toml"), "[cache\n").unwrap();

        memo_isolated(&temp)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn local_config_is_discovered() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".memo.toml"),
            "[cache]\nstrategy = \"mutex\"\n",
        )
        .unwrap();

        memo()
            .current_dir(temp.path())
            .env("MEMO_CONFIG", temp.path().join("config.toml"))
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("strategy = \"mutex\""));
    }

    #[test]
    fn fetch_without_urls_fails() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.toml"), "[pipeline]\nurls = []\n").unwrap();

        memo_isolated(&temp)
            .arg("fetch")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No URLs to fetch"));
    }

    #[test]
    fn simulate_fetches_each_key_once() {
        let temp = TempDir::new().unwrap();
        for strategy in ["confinement", "mutex"] {
            memo_isolated(&temp)
                .args(["simulate", "a", "b", "bad", "--delay-ms", "10", "-r", "1"])
                .args(["--strategy", strategy])
                .assert()
                .success()
                .stdout(predicate::str::contains("A"))
                .stdout(predicate::str::contains("[FAIL]"))
                .stdout(predicate::str::contains("fetches: 3"))
                .stdout(predicate::str::contains("hits: 3"))
                .stdout(predicate::str::contains("fetcher calls: 3"));
        }
    }

    #[test]
    fn simulate_json_output() {
        let temp = TempDir::new().unwrap();
        let output = memo_isolated(&temp)
            .args(["simulate", "x", "--delay-ms", "5", "-r", "2", "--format", "json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let stdout = String::from_utf8(output.stdout).unwrap();
        let lines: Vec<serde_json::Value> = stdout
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 4);
        for line in &lines[..3] {
            assert_eq!(line["key"], "x");
            assert_eq!(line["value"], "X");
        }
        let summary = &lines[3]["summary"];
        assert_eq!(summary["responses"], 3);
        assert_eq!(summary["stats"]["misses"], 1);
        assert_eq!(summary["stats"]["hits"], 2);
    }

    #[test]
    fn simulate_rejects_unknown_strategy() {
        memo()
            .args(["simulate", "--strategy", "actor"])
            .assert()
            .failure();
    }
}

mod cache_tests {
    use memo::fetch::DelayFetcher;
    use memo::{
        build_cache, fetch_fn, Cache, ConfinementCache, FetchError, MemoError, Strategy,
    };
    use memo::config::schema::CacheConfig;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    const STRATEGIES: [Strategy; 2] = [Strategy::Confinement, Strategy::Mutex];

    fn cache_for(
        strategy: Strategy,
        fetcher: &Arc<DelayFetcher>,
    ) -> Arc<dyn Cache<Value = String>> {
        build_cache(strategy, Arc::clone(fetcher), &CacheConfig::default())
    }

    async fn get_concurrently(
        cache: &Arc<dyn Cache<Value = String>>,
        keys: &[&str],
    ) -> Vec<Result<String, MemoError>> {
        let handles: Vec<_> = keys
            .iter()
            .map(|key| {
                let cache = Arc::clone(cache);
                let key = key.to_string();
                tokio::spawn(async move { cache.get(&key).await })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }
        results
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_gets_share_one_fetch() {
        for strategy in STRATEGIES {
            let fetcher = Arc::new(DelayFetcher::new(Duration::from_millis(50)));
            let cache = cache_for(strategy, &fetcher);

            let results = get_concurrently(&cache, &["k"; 50]).await;

            assert_eq!(fetcher.calls(), 1, "{strategy}");
            for result in results {
                assert_eq!(result.unwrap(), "K");
            }
            let stats = cache.stats();
            assert_eq!(stats.misses, 1);
            assert_eq!(stats.hits, 49);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn distinct_keys_fetch_in_parallel() {
        for strategy in STRATEGIES {
            let fetcher = Arc::new(DelayFetcher::new(Duration::from_millis(200)));
            let cache = cache_for(strategy, &fetcher);

            let start = Instant::now();
            let results = get_concurrently(&cache, &["a", "b", "c", "d", "e"]).await;
            let elapsed = start.elapsed();

            assert!(results.iter().all(Result::is_ok));
            assert_eq!(fetcher.calls(), 5);
            assert!(
                elapsed < Duration::from_millis(600),
                "{strategy} took {elapsed:?}"
            );
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn failures_are_memoized() {
        for strategy in STRATEGIES {
            let fetcher = Arc::new(DelayFetcher::new(Duration::from_millis(20)));
            let cache = cache_for(strategy, &fetcher);

            let mut results = get_concurrently(&cache, &["bad"; 10]).await;
            results.push(cache.get("bad").await);

            assert_eq!(fetcher.calls(), 1);
            let errors: Vec<FetchError> = results
                .into_iter()
                .map(|result| match result {
                    Err(MemoError::Fetch(e)) => e,
                    other => panic!("expected fetch error, got {other:?}"),
                })
                .collect();
            assert!(errors.iter().all(|e| e == &errors[0]));
            assert_eq!(errors[0].key(), "bad");
        }
    }

    #[tokio::test]
    async fn sequential_gets_hit_after_first() {
        for strategy in STRATEGIES {
            let fetcher = Arc::new(DelayFetcher::new(Duration::from_millis(1)));
            let cache = cache_for(strategy, &fetcher);

            for key in ["a", "b", "a", "b", "a"] {
                assert_eq!(cache.get(key).await.unwrap(), key.to_uppercase());
            }

            let stats = cache.stats();
            assert_eq!(stats.strategy, strategy);
            assert_eq!(stats.misses, 2);
            assert_eq!(stats.hits, 3);
            assert_eq!(stats.entries, 2);
        }
    }

    #[tokio::test]
    async fn panicking_fetch_is_abandoned() {
        for strategy in STRATEGIES {
            let cache = build_cache(
                strategy,
                fetch_fn(|key: String| async move {
                    if key == "boom" {
                        panic!("fetch blew up");
                    }
                    Ok::<_, FetchError>(key)
                }),
                &CacheConfig::default(),
            );

            for _ in 0..2 {
                match cache.get("boom").await {
                    Err(MemoError::Fetch(FetchError::Abandoned { key })) => assert_eq!(key, "boom"),
                    other => panic!("expected abandoned fetch, got {other:?}"),
                }
            }
            assert_eq!(cache.get("fine").await.unwrap(), "fine");
            assert_eq!(cache.stats().misses, 2);
        }
    }

    #[tokio::test]
    async fn caller_timeout_does_not_poison_entry() {
        for strategy in STRATEGIES {
            let fetcher = Arc::new(DelayFetcher::new(Duration::from_millis(100)));
            let cache = cache_for(strategy, &fetcher);

            let gave_up = tokio::time::timeout(Duration::from_millis(10), cache.get("k")).await;
            assert!(gave_up.is_err(), "{strategy}");

            assert_eq!(cache.get("k").await.unwrap(), "K", "{strategy}");
            assert_eq!(fetcher.calls(), 1);
        }
    }

    #[tokio::test]
    async fn aborted_caller_does_not_poison_entry() {
        for strategy in STRATEGIES {
            let fetcher = Arc::new(DelayFetcher::new(Duration::from_millis(100)));
            let cache = cache_for(strategy, &fetcher);

            let first = {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get("slow").await })
            };
            tokio::time::sleep(Duration::from_millis(20)).await;
            first.abort();
            let _ = first.await;

            assert_eq!(cache.get("slow").await.unwrap(), "SLOW", "{strategy}");
            assert_eq!(fetcher.calls(), 1);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn confinement_rejects_after_shutdown() {
        let fetcher = Arc::new(DelayFetcher::new(Duration::from_millis(5)));
        let cache = ConfinementCache::new(Arc::clone(&fetcher));

        assert_eq!(cache.get("a").await.unwrap(), "A");
        cache.shutdown().await;
        assert!(cache.is_shut_down());

        assert!(matches!(cache.get("a").await, Err(MemoError::CacheShutDown)));
        assert!(matches!(cache.get("b").await, Err(MemoError::CacheShutDown)));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn confinement_shutdown_waits_for_in_flight_fetches() {
        let fetcher = Arc::new(DelayFetcher::new(Duration::from_millis(100)));
        let cache = Arc::new(ConfinementCache::new(Arc::clone(&fetcher)));

        let pending = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get("slow").await })
        };
        while cache.stats().misses == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        cache.shutdown().await;

        assert_eq!(pending.await.unwrap().unwrap(), "SLOW");
        let handle = cache.shutdown_handle().unwrap();
        assert_eq!(handle.in_flight(), 0);
    }
}

mod pipeline_tests {
    use memo::config::schema::CacheConfig;
    use memo::fetch::DelayFetcher;
    use memo::pipeline::{consume_keys, produce_keys};
    use memo::{build_cache, Strategy};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|k| k.to_string()).collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn replayed_keys_fetch_once() {
        for strategy in [Strategy::Confinement, Strategy::Mutex] {
            let fetcher = Arc::new(DelayFetcher::new(Duration::from_millis(20)));
            let cache = build_cache(strategy, Arc::clone(&fetcher), &CacheConfig::default());
            let stop = CancellationToken::new();

            let key_stream = produce_keys(keys(&["a", "b", "bad"]), 4, 16, stop.clone());
            let mut responses = consume_keys(Arc::clone(&cache), key_stream, 16, stop);

            let mut ok = 0;
            let mut failed = 0;
            while let Some(response) = responses.recv().await {
                match response.outcome {
                    Ok(value) => {
                        assert_eq!(value, response.key.to_uppercase());
                        ok += 1;
                    }
                    Err(_) => failed += 1,
                }
            }

            assert_eq!(ok, 10);
            assert_eq!(failed, 5);
            assert_eq!(fetcher.calls(), 3);
            assert_eq!(cache.stats().hits, 12);
        }
    }

    #[tokio::test]
    async fn stopping_closes_the_response_stream() {
        let fetcher = Arc::new(DelayFetcher::new(Duration::from_millis(5)));
        let cache = build_cache(Strategy::Mutex, fetcher, &CacheConfig::default());
        let stop = CancellationToken::new();

        let key_stream = produce_keys(keys(&["a"]), u32::MAX, 1, stop.clone());
        let mut responses = consume_keys(cache, key_stream, 1, stop.clone());

        assert!(responses.recv().await.is_some());
        stop.cancel();

        let drained = tokio::time::timeout(Duration::from_secs(5), async {
            while responses.recv().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok());
    }
}
