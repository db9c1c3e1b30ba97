//! Tests for IngestionOrchestrator cycle behavior.
//!
//! # Contract points
//!
//! 1. Partial-failure isolation: one symbol's error never stops the cycle
//! 2. Batch fan-out: identifiers missing from a batch fail individually
//! 3. Freshness: a second cycle on the same date writes nothing
//! 4. Deadline: unstarted or interrupted symbols fail with a timeout
//! 5. Cancellation: no new requests after cancel, in-flight upserts finish

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use pricesync_market_data::{MarketDataError, QuoteSource, RawQuote, TickerQuote};
    use rust_decimal_macros::dec;
    use tokio::time::Instant;

    use crate::ingest::{
        cancel_channel, CycleContext, ErrorKind, IngestionOrchestrator, SourceBinding,
        SymbolState,
    };
    use crate::prices::{MarketSource, PersistedPriceKey, PriceStore, UpsertOutcome};
    use crate::test_support::{dates, day, simple_price, ticker, MockPriceStore, MockQuoteSource};

    fn transport_error() -> MarketDataError {
        MarketDataError::Transport {
            provider: "MOCK".to_string(),
            message: "connection reset".to_string(),
        }
    }

    fn three_stocks() -> MockQuoteSource {
        MockQuoteSource::new("MOCK")
            .respond("AAPL", Ok(ticker("AAPL", 189.5)))
            .respond("GOOGL", Ok(ticker("GOOGL", 136.9)))
            .respond("MSFT", Ok(ticker("MSFT", 369.8)))
    }

    fn orchestrator(
        store: &MockPriceStore,
        bindings: Vec<SourceBinding>,
    ) -> IngestionOrchestrator {
        IngestionOrchestrator::new(Arc::new(store.clone()), bindings)
    }

    fn stock_binding(source: Arc<MockQuoteSource>, symbols: &[&str]) -> SourceBinding {
        SourceBinding::new(
            source as Arc<dyn QuoteSource>,
            MarketSource::Stock,
            symbols.iter().copied(),
        )
    }

    #[tokio::test]
    async fn test_partial_failure_isolation() {
        let store = MockPriceStore::new();
        let source = Arc::new(three_stocks().respond("GOOGL", Err(transport_error())));
        let orch = orchestrator(
            &store,
            vec![stock_binding(source.clone(), &["AAPL", "GOOGL", "MSFT"])],
        );

        let summary = orch.run_cycle(&CycleContext::new(dates(day(15)))).await;

        assert_eq!(source.calls(), vec!["AAPL", "GOOGL", "MSFT"]);
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].symbol, "GOOGL");
        assert_eq!(summary.failures[0].kind, ErrorKind::Transport);
        assert!(!summary.all_failed());

        let msft = store
            .get_price(&PersistedPriceKey::new("MSFT", day(15)))
            .unwrap()
            .unwrap();
        assert_eq!(msft.close, Some(dec!(369.8)));
    }

    #[tokio::test]
    async fn test_batch_fan_out_marks_missing_identifier() {
        let store = MockPriceStore::new();
        let source = Arc::new(
            MockQuoteSource::batched("MOCK_BATCH")
                .respond("bitcoin", Ok(simple_price("bitcoin", 64000.0)))
                .respond("ethereum", Ok(simple_price("ethereum", 3400.0))),
        );
        let orch = orchestrator(
            &store,
            vec![SourceBinding::new(
                source.clone() as Arc<dyn QuoteSource>,
                MarketSource::Crypto,
                ["bitcoin", "ethereum", "not-a-coin"],
            )],
        );

        let summary = orch.run_cycle(&CycleContext::new(dates(day(15)))).await;

        assert_eq!(source.calls(), vec!["batch:bitcoin,ethereum,not-a-coin"]);
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].symbol, "not-a-coin");
        assert_eq!(summary.failures[0].kind, ErrorKind::Normalization);
        assert!(summary.failures[0].message.contains("no data returned"));

        let rows = store.get_all();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.market_source == MarketSource::Crypto));
        assert!(rows.iter().any(|r| r.symbol == "BITCOIN"));
    }

    #[tokio::test]
    async fn test_whole_batch_failure_fails_every_identifier() {
        let store = MockPriceStore::new();
        let source = Arc::new(MockQuoteSource::batched("MOCK_BATCH").fail_batch(
            MarketDataError::RateLimited {
                provider: "MOCK_BATCH".to_string(),
            },
        ));
        let orch = orchestrator(
            &store,
            vec![SourceBinding::new(
                source as Arc<dyn QuoteSource>,
                MarketSource::Crypto,
                ["bitcoin", "ethereum"],
            )],
        );

        let summary = orch.run_cycle(&CycleContext::new(dates(day(15)))).await;

        assert!(summary.all_failed());
        assert_eq!(summary.failed, 2);
        assert!(summary.failures.iter().all(|f| f.kind == ErrorKind::Protocol));
        assert!(store.get_all().is_empty());
    }

    #[tokio::test]
    async fn test_second_cycle_same_day_skips_everything() {
        let store = MockPriceStore::new();
        let source = Arc::new(three_stocks());
        let orch = orchestrator(
            &store,
            vec![stock_binding(source, &["AAPL", "GOOGL", "MSFT"])],
        );
        let ctx = CycleContext::new(dates(day(15)));

        let first = orch.run_cycle(&ctx).await;
        assert_eq!(first.inserted, 3);

        let second = orch.run_cycle(&ctx).await;
        assert_eq!(second.skipped_fresh, 3);
        assert_eq!(second.inserted + second.updated, 0);
        assert!(second.is_success());

        assert_eq!(store.write_count(), 3);
        assert_eq!(store.get_all().len(), 3);
    }

    #[tokio::test]
    async fn test_next_day_writes_new_rows() {
        let store = MockPriceStore::new();
        let source = Arc::new(three_stocks());
        let orch = orchestrator(&store, vec![stock_binding(source, &["AAPL"])]);

        orch.run_cycle(&CycleContext::new(dates(day(15)))).await;
        let summary = orch.run_cycle(&CycleContext::new(dates(day(16)))).await;

        assert_eq!(summary.inserted, 1);
        assert_eq!(store.latest_price_date("AAPL").unwrap(), Some(day(16)));
        assert_eq!(store.get_all().len(), 2);
    }

    #[tokio::test]
    async fn test_stage_failures_are_classified() {
        let store = MockPriceStore::new();
        store.fail_reads_for("GOOGL");
        store.fail_writes_for("MSFT");

        let no_price = RawQuote::Ticker(TickerQuote {
            symbol: "AAPL".to_string(),
            ..Default::default()
        });
        let source = Arc::new(three_stocks().respond("AAPL", Ok(no_price)));
        let orch = orchestrator(
            &store,
            vec![stock_binding(source, &["AAPL", "GOOGL", "MSFT"])],
        );

        let summary = orch.run_cycle(&CycleContext::new(dates(day(15)))).await;

        let kinds: Vec<_> = summary
            .failures
            .iter()
            .map(|f| (f.symbol.as_str(), f.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("AAPL", ErrorKind::Normalization),
                ("GOOGL", ErrorKind::FreshnessQuery),
                ("MSFT", ErrorKind::Persistence),
            ]
        );
        assert!(summary.all_failed());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_outcomes_record_states_and_records() {
        let store = MockPriceStore::new();
        let source = Arc::new(three_stocks());
        let orch = orchestrator(&store, vec![stock_binding(source, &["AAPL"])]);

        let summary = orch.run_cycle(&CycleContext::new(dates(day(15)))).await;

        let outcome = &summary.outcomes[0];
        assert_eq!(outcome.state, SymbolState::Upserted(UpsertOutcome::Inserted));
        assert_eq!(outcome.source_id, "MOCK");
        let record = outcome.record.as_ref().unwrap();
        assert_eq!(record.symbol, "AAPL");
        assert_eq!(record.price_date, day(15));
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_and_blank_symbols_ignored() {
        let store = MockPriceStore::new();
        let source = Arc::new(three_stocks());
        let orch = orchestrator(
            &store,
            vec![stock_binding(source.clone(), &["AAPL", " ", "AAPL", "MSFT"])],
        );

        let summary = orch.run_cycle(&CycleContext::new(dates(day(15)))).await;

        assert_eq!(source.calls(), vec!["AAPL", "MSFT"]);
        assert_eq!(summary.total(), 2);
    }

    #[tokio::test]
    async fn test_sources_run_concurrently_and_report_in_order() {
        let slow = Arc::new(three_stocks().with_delay(Duration::from_millis(50)));
        let crypto = Arc::new(
            MockQuoteSource::batched("MOCK_BATCH")
                .respond("bitcoin", Ok(simple_price("bitcoin", 64000.0))),
        );
        let bindings = vec![
            stock_binding(slow, &["AAPL", "MSFT"]),
            SourceBinding::new(
                crypto as Arc<dyn QuoteSource>,
                MarketSource::Crypto,
                ["bitcoin"],
            ),
        ];

        for concurrent in [true, false] {
            let store = MockPriceStore::new();
            let orch = IngestionOrchestrator::new(Arc::new(store.clone()), bindings.clone())
                .with_concurrent_sources(concurrent);
            let summary = orch.run_cycle(&CycleContext::new(dates(day(15)))).await;

            let order: Vec<_> = summary.outcomes.iter().map(|o| o.symbol.as_str()).collect();
            assert_eq!(order, vec!["AAPL", "MSFT", "bitcoin"]);
            assert_eq!(summary.inserted, 3);
            assert_eq!(store.get_all().len(), 3);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fails_interrupted_and_unstarted_symbols() {
        let store = MockPriceStore::new();
        let source = Arc::new(three_stocks().with_delay(Duration::from_secs(2)));
        let orch = orchestrator(
            &store,
            vec![stock_binding(source.clone(), &["AAPL", "GOOGL", "MSFT"])],
        );
        let ctx = CycleContext::new(dates(day(15)))
            .with_deadline(Instant::now() + Duration::from_secs(3));

        let summary = orch.run_cycle(&ctx).await;

        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.failed, 2);
        assert!(summary.failures.iter().all(|f| f.kind == ErrorKind::Timeout));
        // MSFT never reached its source.
        assert_eq!(source.calls(), vec!["AAPL", "GOOGL"]);
        assert!(summary
            .outcomes
            .iter()
            .all(|o| o.state.is_terminal()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_deadline_sends_no_requests() {
        let store = MockPriceStore::new();
        let source = Arc::new(three_stocks());
        let batch = Arc::new(
            MockQuoteSource::batched("MOCK_BATCH")
                .respond("bitcoin", Ok(simple_price("bitcoin", 64000.0))),
        );
        let orch = orchestrator(
            &store,
            vec![
                stock_binding(source.clone(), &["AAPL", "MSFT"]),
                SourceBinding::new(
                    batch.clone() as Arc<dyn QuoteSource>,
                    MarketSource::Crypto,
                    ["bitcoin"],
                ),
            ],
        );
        let ctx = CycleContext::new(dates(day(15))).with_deadline(Instant::now());

        let summary = orch.run_cycle(&ctx).await;

        assert!(summary.all_failed());
        assert_eq!(summary.failed, 3);
        assert!(summary.failures.iter().all(|f| f.kind == ErrorKind::Timeout));
        assert!(source.calls().is_empty());
        assert!(batch.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_before_cycle_sends_no_requests() {
        let store = MockPriceStore::new();
        let source = Arc::new(three_stocks());
        let orch = orchestrator(&store, vec![stock_binding(source.clone(), &["AAPL", "MSFT"])]);

        let (handle, signal) = cancel_channel();
        handle.cancel();
        let ctx = CycleContext::new(dates(day(15))).with_cancel(signal);

        let summary = orch.run_cycle(&ctx).await;

        assert_eq!(summary.failed, 2);
        assert!(summary.failures.iter().all(|f| f.kind == ErrorKind::Cancelled));
        assert!(source.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_fetch_and_stops_new_requests() {
        let store = MockPriceStore::new();
        let source = Arc::new(three_stocks().with_delay(Duration::from_secs(10)));
        let orch = orchestrator(
            &store,
            vec![stock_binding(source.clone(), &["AAPL", "GOOGL", "MSFT"])],
        );

        let (handle, signal) = cancel_channel();
        let ctx = CycleContext::new(dates(day(15))).with_cancel(signal);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            handle.cancel();
        });

        let started = Instant::now();
        let summary = orch.run_cycle(&ctx).await;

        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(source.calls(), vec!["AAPL"]);
        assert_eq!(summary.failed, 3);
        assert!(summary.failures.iter().all(|f| f.kind == ErrorKind::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_lets_in_flight_upsert_finish() {
        let store = MockPriceStore::new();
        store.set_write_delay(Duration::from_secs(5));
        let source = Arc::new(three_stocks());
        let orch = orchestrator(&store, vec![stock_binding(source.clone(), &["AAPL", "MSFT"])]);

        let (handle, signal) = cancel_channel();
        let ctx = CycleContext::new(dates(day(15))).with_cancel(signal);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            handle.cancel();
        });

        let summary = orch.run_cycle(&ctx).await;

        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].symbol, "MSFT");
        assert_eq!(summary.failures[0].kind, ErrorKind::Cancelled);
        assert!(store
            .get_price(&PersistedPriceKey::new("AAPL", day(15)))
            .unwrap()
            .is_some());
        assert_eq!(source.calls(), vec!["AAPL"]);
    }
}
