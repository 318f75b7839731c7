//! Polling Scheduler - Tick loop for one poll session
//!
//! Each tick waits `SHORT_DELAY`, fetches (unless paused), publishes, waits
//! the rest of the interval and then checks for cancellation. Ticks run
//! strictly one after another, so a session never has two fetches in flight.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{DisplaySink, PollSession, Publication, QuoteFetcher};
use crate::market;

/// Fixed delay at the start of every tick, before the pause check
pub const SHORT_DELAY: Duration = Duration::from_millis(500);

/// What a single tick ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickOutcome {
    Paused,
    FetchFailed,
    Published,
    SinkClosed,
}

/// Drives the refresh cadence of a `PollSession`
pub struct PollingScheduler<F, S> {
    fetcher: F,
    sink: S,
}

impl<F, S> PollingScheduler<F, S>
where
    F: QuoteFetcher,
    S: DisplaySink,
{
    pub fn new(fetcher: F, sink: S) -> Self {
        Self { fetcher, sink }
    }

    /// Run the loop on the current task until `session` is cancelled.
    ///
    /// Returns false without doing anything when the session already has a
    /// loop or has stopped.
    pub async fn run(&self, session: &PollSession) -> bool {
        if !session.try_begin() {
            debug!(
                item = %session.item(),
                state = ?session.state(),
                "Auto-refresh already started, ignoring"
            );
            return false;
        }
        self.run_loop(session).await;
        true
    }

    /// Spawn the loop as a background task.
    ///
    /// Returns `None` when the session already has a loop or has stopped.
    pub fn spawn(self, session: Arc<PollSession>) -> Option<JoinHandle<()>>
    where
        F: 'static,
        S: 'static,
    {
        if !session.try_begin() {
            debug!(
                item = %session.item(),
                state = ?session.state(),
                "Auto-refresh already started, ignoring"
            );
            return None;
        }
        Some(tokio::spawn(async move {
            self.run_loop(&session).await;
        }))
    }

    async fn run_loop(&self, session: &PollSession) {
        info!(
            item = %session.item(),
            interval_ms = session.interval_ms(),
            "🔄 Auto-refresh started"
        );

        let mut ticks: u64 = 0;
        let mut published: u64 = 0;
        loop {
            if self.tick(session).await == TickOutcome::Published {
                published += 1;
            }
            ticks += 1;

            if session.is_cancelled() {
                break;
            }
        }

        session.finish();
        info!(
            item = %session.item(),
            ticks,
            published,
            "Auto-refresh stopped"
        );
    }

    pub(crate) async fn tick(&self, session: &PollSession) -> TickOutcome {
        tokio::time::sleep(SHORT_DELAY).await;

        if session.is_paused() {
            return TickOutcome::Paused;
        }

        let outcome = self.fetch_and_publish(session).await;

        let remainder = Duration::from_millis(session.interval_ms())
            .saturating_sub(SHORT_DELAY);
        tokio::select! {
            _ = tokio::time::sleep(remainder) => {}
            _ = session.woken() => {
                debug!(item = %session.item(), "Refresh wait cut short");
            }
        }

        outcome
    }

    async fn fetch_and_publish(&self, session: &PollSession) -> TickOutcome {
        if session.take_refresh_request() {
            debug!(item = %session.item(), "Refresh request answered by this fetch");
        }

        let filter = session.location_filter();
        let raw = match self.fetcher.fetch_quotes(session.item(), filter).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(item = %session.item(), error = %e, "Price fetch failed, skipping tick");
                return TickOutcome::FetchFailed;
            }
        };

        let snapshot = market::evaluate(&raw);
        debug!(
            item = %session.item(),
            raw = raw.len(),
            locations = snapshot.quotes.len(),
            best_buy = snapshot.difference.best_buy,
            best_sell = snapshot.difference.best_sell,
            profit = snapshot.difference.profit,
            "Prices aggregated"
        );

        let publication = Publication {
            item: session.item().to_string(),
            quotes: snapshot.quotes,
            difference: snapshot.difference,
            updated_at: Utc::now(),
        };

        if self.sink.publish(publication).await {
            TickOutcome::Published
        } else {
            warn!(item = %session.item(), "Display sink closed, publication dropped");
            TickOutcome::SinkClosed
        }
    }
}
