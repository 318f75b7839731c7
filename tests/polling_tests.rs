//! Integration tests for the polling loop and market pipeline

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use quotewatch::market::{aggregate, evaluate, select_best, PriceDifference};
    use quotewatch::polling::{
        FetchError, PollSession, PollingScheduler, Publication, QuoteFetcher, SessionState,
    };
    use quotewatch::types::{Location, LocationFilter, RawQuote};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    // ============================================================================
    // Helpers
    // ============================================================================

    #[derive(Clone, Default)]
    struct RecordingFetcher {
        calls: Arc<Mutex<Vec<(Instant, LocationFilter)>>>,
        quotes: Vec<RawQuote>,
        fail: bool,
    }

    impl RecordingFetcher {
        fn with_quotes(quotes: Vec<RawQuote>) -> Self {
            Self {
                quotes,
                ..Default::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn call_offsets(&self, start: Instant) -> Vec<u64> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(at, _)| (*at - start).as_millis() as u64)
                .collect()
        }

        fn filters(&self) -> Vec<LocationFilter> {
            self.calls.lock().unwrap().iter().map(|(_, f)| *f).collect()
        }
    }

    #[async_trait]
    impl QuoteFetcher for RecordingFetcher {
        async fn fetch_quotes(
            &self,
            _item: &str,
            filter: LocationFilter,
        ) -> Result<Vec<RawQuote>, FetchError> {
            self.calls.lock().unwrap().push((Instant::now(), filter));
            if self.fail {
                return Err(FetchError::Unavailable("offline".to_string()));
            }
            Ok(self.quotes.clone())
        }
    }

    fn scenario_quotes() -> Vec<RawQuote> {
        vec![
            RawQuote::new(Location::Caerleon, 10, 20, 5, 15),
            RawQuote::new(Location::Caerleon, 8, 25, 3, 12),
            RawQuote::new(Location::Bridgewatch, 9, 9, 0, 0),
        ]
    }

    fn assert_offsets(actual: &[u64], expected: &[u64]) {
        assert_eq!(actual.len(), expected.len(), "calls at {:?}", actual);
        for (a, e) in actual.iter().zip(expected) {
            assert!(a >= e && *a < e + 10, "calls at {:?}, expected {:?}", actual, expected);
        }
    }

    fn drain(rx: &mut mpsc::Receiver<Publication>) -> Vec<Publication> {
        let mut out = Vec::new();
        while let Ok(p) = rx.try_recv() {
            out.push(p);
        }
        out
    }

    // ============================================================================
    // Pipeline
    // ============================================================================

    #[test]
    fn test_concrete_scenario_end_to_end() {
        let aggregated = aggregate(&scenario_quotes());
        assert_eq!(aggregated.len(), 2);
        assert_eq!(aggregated[0].location, Location::Caerleon);
        assert_eq!(
            (
                aggregated[0].sell_price_min,
                aggregated[0].sell_price_max,
                aggregated[0].buy_price_min,
                aggregated[0].buy_price_max
            ),
            (8, 25, 3, 15)
        );
        assert_eq!(aggregated[1].location, Location::Bridgewatch);
        assert_eq!(
            (
                aggregated[1].sell_price_min,
                aggregated[1].sell_price_max,
                aggregated[1].buy_price_min,
                aggregated[1].buy_price_max
            ),
            (9, 9, 0, 0)
        );

        let marked = select_best(aggregated);
        assert!(marked[0].is_best_buy);
        assert!(marked[0].is_best_sell);
        assert!(!marked[1].is_best_buy);
        assert!(!marked[1].is_best_sell);

        let diff = PriceDifference::from_quotes(&marked);
        assert_eq!(diff.best_buy, 15);
        assert_eq!(diff.best_sell, 8);
        assert_eq!(diff.profit, 7);
        assert_eq!(diff, evaluate(&scenario_quotes()).difference);
    }

    #[test]
    fn test_no_arbitrage_gives_negative_profit() {
        let snapshot = evaluate(&[
            RawQuote::new(Location::Martlock, 80, 90, 0, 0),
            RawQuote::new(Location::Thetford, 0, 0, 40, 50),
        ]);

        assert_eq!(snapshot.difference.best_buy, 50);
        assert_eq!(snapshot.difference.best_sell, 80);
        assert_eq!(snapshot.difference.profit, -30);
    }

    // ============================================================================
    // Polling loop
    // ============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_steady_cadence_follows_interval() {
        let fetcher = RecordingFetcher::with_quotes(scenario_quotes());
        let (tx, mut rx) = mpsc::channel(16);
        let session = Arc::new(PollSession::new("T4_BAG", 2000, LocationFilter::default()));

        let start = Instant::now();
        let handle = PollingScheduler::new(fetcher.clone(), tx)
            .spawn(session.clone())
            .expect("loop should start");
        assert!(session.is_active());

        tokio::time::sleep(Duration::from_millis(4_100)).await;
        session.cancel();
        handle.await.unwrap();

        // The tick running at cancellation still completes
        assert_offsets(&fetcher.call_offsets(start), &[500, 2500, 4500]);
        assert_eq!(session.state(), SessionState::Stopped);
        assert!(!session.is_active());

        let publications = drain(&mut rx);
        assert_eq!(publications.len(), 3);
        assert!(publications.iter().all(|p| p.difference.profit == 7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reentrant_start_adds_no_ticks() {
        let fetcher = RecordingFetcher::with_quotes(scenario_quotes());
        let (tx, mut rx) = mpsc::channel(16);
        let session = Arc::new(PollSession::new("T4_BAG", 2000, LocationFilter::default()));

        let start = Instant::now();
        let handle = PollingScheduler::new(fetcher.clone(), tx.clone())
            .spawn(session.clone())
            .expect("loop should start");
        let duplicate = PollingScheduler::new(fetcher.clone(), tx).spawn(session.clone());
        assert!(duplicate.is_none());

        tokio::time::sleep(Duration::from_millis(2_100)).await;
        session.cancel();
        handle.await.unwrap();

        assert_offsets(&fetcher.call_offsets(start), &[500, 2500]);
        assert_eq!(drain(&mut rx).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_session_cannot_restart() {
        let fetcher = RecordingFetcher::default();
        let (tx, _rx) = mpsc::channel(16);
        let session = Arc::new(PollSession::new("T4_BAG", 2000, LocationFilter::default()));

        let handle = PollingScheduler::new(fetcher.clone(), tx.clone())
            .spawn(session.clone())
            .expect("loop should start");
        session.cancel();
        handle.await.unwrap();

        let calls = fetcher.calls.lock().unwrap().len();
        assert!(PollingScheduler::new(fetcher.clone(), tx)
            .spawn(session.clone())
            .is_none());
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(fetcher.calls.lock().unwrap().len(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_session_fetches_nothing_until_resumed() {
        let fetcher = RecordingFetcher::with_quotes(scenario_quotes());
        let (tx, mut rx) = mpsc::channel(16);
        let session = Arc::new(PollSession::new("T4_BAG", 2000, LocationFilter::default()));
        session.set_paused(true);

        let start = Instant::now();
        let handle = PollingScheduler::new(fetcher.clone(), tx)
            .spawn(session.clone())
            .expect("loop should start");

        tokio::time::sleep(Duration::from_millis(1_800)).await;
        assert!(fetcher.call_offsets(start).is_empty());
        assert!(drain(&mut rx).is_empty());

        session.set_paused(false);
        tokio::time::sleep(Duration::from_millis(300)).await;
        session.cancel();
        handle.await.unwrap();

        assert_offsets(&fetcher.call_offsets(start), &[2000]);
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetches_keep_the_loop_alive() {
        let fetcher = RecordingFetcher::failing();
        let (tx, mut rx) = mpsc::channel(16);
        let session = Arc::new(PollSession::new("T4_BAG", 2000, LocationFilter::default()));

        let start = Instant::now();
        let handle = PollingScheduler::new(fetcher.clone(), tx)
            .spawn(session.clone())
            .expect("loop should start");

        tokio::time::sleep(Duration::from_millis(4_100)).await;
        assert!(session.is_active());
        session.cancel();
        handle.await.unwrap();

        assert_offsets(&fetcher.call_offsets(start), &[500, 2500, 4500]);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_and_filter_changes_apply_on_next_tick() {
        let fetcher = RecordingFetcher::with_quotes(scenario_quotes());
        let (tx, _rx) = mpsc::channel(16);
        let session = Arc::new(PollSession::new("T4_BAG", 2000, LocationFilter::default()));
        let with_villages = LocationFilter {
            cities: true,
            villages: true,
            black_zone_outposts: false,
        };

        let start = Instant::now();
        let handle = PollingScheduler::new(fetcher.clone(), tx)
            .spawn(session.clone())
            .expect("loop should start");

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        session.set_interval_ms(5_000);
        session.set_location_filter(with_villages);

        tokio::time::sleep(Duration::from_millis(7_000)).await;
        session.cancel();
        handle.await.unwrap();

        assert_offsets(&fetcher.call_offsets(start), &[500, 2500, 7500]);
        assert_eq!(
            fetcher.filters(),
            vec![LocationFilter::default(), with_villages, with_villages]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_request_starts_next_tick_early() {
        let fetcher = RecordingFetcher::with_quotes(scenario_quotes());
        let (tx, _rx) = mpsc::channel(16);
        let session = Arc::new(PollSession::new("T4_BAG", 60_000, LocationFilter::default()));

        let start = Instant::now();
        let handle = PollingScheduler::new(fetcher.clone(), tx)
            .spawn(session.clone())
            .expect("loop should start");

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        session.request_refresh();
        tokio::time::sleep(Duration::from_millis(600)).await;
        session.cancel();
        handle.await.unwrap();

        assert_offsets(&fetcher.call_offsets(start), &[500, 1500]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_requested_while_paused_keeps_cadence() {
        let fetcher = RecordingFetcher::with_quotes(scenario_quotes());
        let (tx, _rx) = mpsc::channel(16);
        let session = Arc::new(PollSession::new("T4_BAG", 2000, LocationFilter::default()));
        session.set_paused(true);

        let start = Instant::now();
        let handle = PollingScheduler::new(fetcher.clone(), tx)
            .spawn(session.clone())
            .expect("loop should start");

        tokio::time::sleep(Duration::from_millis(700)).await;
        session.request_refresh();
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        session.set_paused(false);

        tokio::time::sleep(Duration::from_millis(4_400)).await;
        session.cancel();
        handle.await.unwrap();

        // The resumed fetch answers the request; later ticks keep the full interval
        assert_offsets(&fetcher.call_offsets(start), &[2000, 4000, 6000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_during_short_delay_adds_no_fetch() {
        let fetcher = RecordingFetcher::with_quotes(scenario_quotes());
        let (tx, mut rx) = mpsc::channel(16);
        let session = Arc::new(PollSession::new("T4_BAG", 10_000, LocationFilter::default()));

        let start = Instant::now();
        let handle = PollingScheduler::new(fetcher.clone(), tx)
            .spawn(session.clone())
            .expect("loop should start");

        tokio::time::sleep(Duration::from_millis(200)).await;
        session.request_refresh();
        tokio::time::sleep(Duration::from_millis(9_900)).await;
        session.cancel();
        handle.await.unwrap();

        assert_offsets(&fetcher.call_offsets(start), &[500, 10_500]);
        assert_eq!(drain(&mut rx).len(), 2);
    }
}
