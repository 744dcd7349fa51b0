// Fetch-and-rebuild operations over a `LiveContext`.
//
// A fetch always clears the target caches before repopulating them. If the
// request or parse fails the caches stay empty and the failure is logged;
// nothing is retried here.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use gwlive_core::{parse_fixtures, parse_live, Fixture, Gameweek, LiveContext};
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, info, warn};

use crate::feed::{FeedError, FeedSource};

// ---------------------------------------------------------------------------
// Standalone fetches
// ---------------------------------------------------------------------------

/// Refresh the fixture caches for `gw` and return the parsed fixtures.
///
/// On failure the caches are left empty and an empty list is returned.
pub async fn fetch_fixtures(
    feed: &dyn FeedSource,
    ctx: &mut LiveContext,
    gw: Gameweek,
    track_provisional: bool,
) -> Vec<Fixture> {
    ctx.clear_fixtures();
    let payload = feed.fixtures(gw).await;
    apply_fixtures(ctx, gw, payload, track_provisional);
    ctx.fixtures().to_vec()
}

/// Refresh the live stat cache for `gw` and return the raw payload.
///
/// On failure the cache is left empty and `None` is returned.
pub async fn fetch_live_gw(
    feed: &dyn FeedSource,
    ctx: &mut LiveContext,
    gw: Gameweek,
    include_extended: bool,
) -> Option<Value> {
    ctx.clear_live();
    let payload = feed.event_live(gw).await;
    apply_live(ctx, gw, payload, include_extended)
}

/// Install a fixtures payload, or leave the caches empty on failure.
fn apply_fixtures(
    ctx: &mut LiveContext,
    gw: Gameweek,
    payload: Result<Value, FeedError>,
    track_provisional: bool,
) {
    match payload {
        Ok(body) => ctx.replace_fixtures(gw, parse_fixtures(&body), track_provisional),
        Err(e) => {
            ctx.clear_fixtures();
            error!(%gw, error = %e, "fixtures fetch failed");
        }
    }
}

fn apply_live(
    ctx: &mut LiveContext,
    gw: Gameweek,
    payload: Result<Value, FeedError>,
    include_extended: bool,
) -> Option<Value> {
    match payload {
        Ok(body) => {
            ctx.replace_live(parse_live(&body, include_extended));
            Some(body)
        }
        Err(e) => {
            ctx.clear_live();
            error!(%gw, error = %e, "live fetch failed");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// LiveSession
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOptions {
    pub track_provisional: bool,
    pub include_extended: bool,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self {
            track_provisional: true,
            include_extended: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSummary {
    pub gw: Gameweek,
    pub fixtures: usize,
    pub live_players: usize,
    pub fixtures_ok: bool,
    pub live_ok: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed(RefreshSummary),
    /// Another refresh was still running; nothing was fetched.
    AlreadyInFlight,
}

/// One feed plus the context it keeps current.
///
/// At most one refresh runs at a time. Payloads are fetched without holding
/// the context lock; clearing and repopulating happen under it, so readers
/// see either the previous snapshot or the new one.
pub struct LiveSession {
    feed: Arc<dyn FeedSource>,
    ctx: Mutex<LiveContext>,
    in_flight: AtomicBool,
    options: RefreshOptions,
}

/// Clears the in-flight flag when the refresh ends, including on cancellation.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl LiveSession {
    pub fn new(feed: Arc<dyn FeedSource>, options: RefreshOptions) -> Self {
        Self {
            feed,
            ctx: Mutex::new(LiveContext::new()),
            in_flight: AtomicBool::new(false),
            options,
        }
    }

    pub fn feed(&self) -> &Arc<dyn FeedSource> {
        &self.feed
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Fetch fixtures and live stats for `gw` and rebuild every cache.
    pub async fn refresh(&self, gw: Gameweek) -> RefreshOutcome {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            warn!(%gw, "refresh already in flight, skipping");
            return RefreshOutcome::AlreadyInFlight;
        }
        let _guard = InFlight(&self.in_flight);

        let (fixtures, live) = tokio::join!(self.feed.fixtures(gw), self.feed.event_live(gw));

        let mut ctx = self.ctx.lock().await;
        let fixtures_ok = fixtures.is_ok();
        let live_ok = live.is_ok();
        apply_fixtures(&mut ctx, gw, fixtures, self.options.track_provisional);
        apply_live(&mut ctx, gw, live, self.options.include_extended);

        let summary = RefreshSummary {
            gw,
            fixtures: ctx.fixtures().len(),
            live_players: ctx.live_points().len(),
            fixtures_ok,
            live_ok,
        };
        info!(
            %gw,
            fixtures = summary.fixtures,
            live_players = summary.live_players,
            fixtures_ok,
            live_ok,
            "live context refreshed"
        );
        RefreshOutcome::Refreshed(summary)
    }

    /// Lock the context for reading. Hold the guard only briefly; a refresh
    /// waits on it to install its snapshot.
    pub async fn context(&self) -> MutexGuard<'_, LiveContext> {
        self.ctx.lock().await
    }
}
