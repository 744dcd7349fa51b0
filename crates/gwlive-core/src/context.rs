// Per-session cache container.
//
// Holds the fixture list and the three caches for one session. Each cache is
// only ever replaced wholesale: `replace_*` clears first and then installs a
// fully built snapshot, so a reader never sees a mix of two polls.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fixtures::{aggregate_fixtures, Fixture, FixtureCaches, TeamStatus};
use crate::ids::{Gameweek, PlayerId, TeamId};
use crate::live::LiveStatLine;
use crate::player::{compute_player_live, BonusPolicy, PlayerLive};

/// Composite key for the team status cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamKey {
    pub gw: Gameweek,
    pub team: TeamId,
}

impl TeamKey {
    pub fn new(gw: Gameweek, team: TeamId) -> Self {
        Self { gw, team }
    }
}

/// Composite key for the projected bonus cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerKey {
    pub gw: Gameweek,
    pub player: PlayerId,
}

impl PlayerKey {
    pub fn new(gw: Gameweek, player: PlayerId) -> Self {
        Self { gw, player }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LiveContext {
    fixtures: Vec<Fixture>,
    team_status: HashMap<TeamKey, TeamStatus>,
    projected_bonus: HashMap<PlayerKey, u32>,
    live_points: HashMap<PlayerId, LiveStatLine>,
    fixtures_refreshed_at: Option<DateTime<Utc>>,
    live_refreshed_at: Option<DateTime<Utc>>,
}

impl LiveContext {
    pub fn new() -> Self {
        Self::default()
    }

    // -- fixtures ----------------------------------------------------------

    /// Rebuild the fixture list, team status and projected bonus caches from
    /// one full fixture snapshot.
    pub fn replace_fixtures(&mut self, gw: Gameweek, fixtures: Vec<Fixture>, track_provisional: bool) {
        self.clear_fixtures();

        let FixtureCaches {
            team_status,
            projected_bonus,
        } = aggregate_fixtures(gw, &fixtures, track_provisional);

        self.fixtures = fixtures;
        self.team_status = team_status;
        self.projected_bonus = projected_bonus;
        self.fixtures_refreshed_at = Some(Utc::now());
    }

    pub fn clear_fixtures(&mut self) {
        self.fixtures.clear();
        self.team_status.clear();
        self.projected_bonus.clear();
        self.fixtures_refreshed_at = None;
    }

    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    pub fn team_statuses(&self) -> &HashMap<TeamKey, TeamStatus> {
        &self.team_status
    }

    pub fn projected_bonuses(&self) -> &HashMap<PlayerKey, u32> {
        &self.projected_bonus
    }

    /// Status for a team in a gameweek; a team with no fixture data yet is
    /// reported as not started.
    pub fn team_status(&self, gw: Gameweek, team: TeamId) -> TeamStatus {
        self.team_status
            .get(&TeamKey::new(gw, team))
            .copied()
            .unwrap_or_default()
    }

    pub fn projected_bonus(&self, gw: Gameweek, player: PlayerId) -> u32 {
        self.projected_bonus
            .get(&PlayerKey::new(gw, player))
            .copied()
            .unwrap_or(0)
    }

    pub fn fixtures_refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.fixtures_refreshed_at
    }

    // -- live points -------------------------------------------------------

    pub fn replace_live(&mut self, lines: HashMap<PlayerId, LiveStatLine>) {
        self.clear_live();
        self.live_points = lines;
        self.live_refreshed_at = Some(Utc::now());
    }

    pub fn clear_live(&mut self) {
        self.live_points.clear();
        self.live_refreshed_at = None;
    }

    pub fn live_line(&self, player: PlayerId) -> Option<&LiveStatLine> {
        self.live_points.get(&player)
    }

    pub fn live_points(&self) -> &HashMap<PlayerId, LiveStatLine> {
        &self.live_points
    }

    pub fn live_refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.live_refreshed_at
    }

    // -- computation -------------------------------------------------------

    /// Displayable live figures for one player, from the current snapshot.
    pub fn player_live(&self, player: PlayerId, team: TeamId, gw: Gameweek, policy: &BonusPolicy) -> PlayerLive {
        compute_player_live(
            self.live_line(player),
            self.team_status(gw, team),
            self.projected_bonus(gw, player),
            policy,
        )
    }
}
