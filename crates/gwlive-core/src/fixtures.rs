// Fixture ingestion, per-team status aggregation and the projected bonus cache.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::bonus::{project_bonus, BpsRow};
use crate::context::{PlayerKey, TeamKey};
use crate::ids::{Gameweek, PlayerId, TeamId};
use crate::payload::{array, flag, id, integer};

/// Identifier of the raw performance-score stat block.
pub const BPS_IDENTIFIER: &str = "bps";

// ---------------------------------------------------------------------------
// Fixture payload
// ---------------------------------------------------------------------------

/// One `{element, value}` row of a fixture stat block, as received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatRow {
    pub element: Option<PlayerId>,
    pub value: Option<i32>,
}

impl From<StatRow> for BpsRow {
    fn from(row: StatRow) -> Self {
        BpsRow {
            player: row.element,
            score: row.value,
        }
    }
}

/// A named stat block with home (`h`) and away (`a`) rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixtureStat {
    pub identifier: String,
    pub h: Vec<StatRow>,
    pub a: Vec<StatRow>,
}

/// One match in the gameweek. Refetched every poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fixture {
    pub id: u32,
    pub team_h: TeamId,
    pub team_a: TeamId,
    pub team_h_score: Option<i32>,
    pub team_a_score: Option<i32>,
    pub started: bool,
    pub finished: bool,
    pub finished_provisional: bool,
    pub stats: Vec<FixtureStat>,
}

impl Fixture {
    pub fn stat(&self, identifier: &str) -> Option<&FixtureStat> {
        self.stats.iter().find(|s| s.identifier == identifier)
    }

    /// Kicked off but not yet officially finished. Provisionally finished
    /// matches are still in play for bonus projection.
    pub fn in_play(&self) -> bool {
        self.started && !self.finished
    }

    /// Home and away BPS rows merged, or empty when the block is absent.
    pub fn bps_rows(&self) -> Vec<BpsRow> {
        self.stat(BPS_IDENTIFIER)
            .map(|s| s.h.iter().chain(s.a.iter()).map(|&r| BpsRow::from(r)).collect())
            .unwrap_or_default()
    }
}

/// Parse the fixtures payload. Anything that is not an array yields no
/// fixtures; a fixture without both team ids is dropped.
pub fn parse_fixtures(payload: &Value) -> Vec<Fixture> {
    let Some(items) = payload.as_array() else {
        debug!("fixtures payload is not an array");
        return Vec::new();
    };

    let fixtures: Vec<Fixture> = items.iter().filter_map(parse_fixture).collect();
    if fixtures.len() < items.len() {
        debug!(
            dropped = items.len() - fixtures.len(),
            "fixtures without team ids skipped"
        );
    }
    fixtures
}

fn parse_fixture(v: &Value) -> Option<Fixture> {
    let team_h = TeamId(id(v.get("team_h"))?);
    let team_a = TeamId(id(v.get("team_a"))?);

    let stats = array(v.get("stats"))
        .iter()
        .filter_map(|s| {
            let identifier = s.get("identifier")?.as_str()?.to_string();
            Some(FixtureStat {
                identifier,
                h: parse_stat_rows(s.get("h")),
                a: parse_stat_rows(s.get("a")),
            })
        })
        .collect();

    Some(Fixture {
        id: id(v.get("id")).unwrap_or(0),
        team_h,
        team_a,
        team_h_score: score(v.get("team_h_score")),
        team_a_score: score(v.get("team_a_score")),
        started: flag(v.get("started")),
        finished: flag(v.get("finished")),
        finished_provisional: flag(v.get("finished_provisional")),
        stats,
    })
}

fn parse_stat_rows(v: Option<&Value>) -> Vec<StatRow> {
    array(v)
        .iter()
        .map(|r| StatRow {
            element: id(r.get("element")).map(PlayerId),
            value: integer(r.get("value")).and_then(|n| i32::try_from(n).ok()),
        })
        .collect()
}

fn score(v: Option<&Value>) -> Option<i32> {
    integer(v).and_then(|n| i32::try_from(n).ok())
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Per (gameweek, team) match state, derived from every fixture the team
/// plays that gameweek. `finished` implies `started`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStatus {
    /// Any fixture has kicked off (or finished).
    pub started: bool,
    /// Every fixture is officially finished.
    pub finished: bool,
    /// Every fixture is finished or provisionally finished.
    pub finished_provisional: bool,
}

/// Running aggregate while walking the fixture list.
#[derive(Debug, Clone, Copy)]
struct TeamAggregate {
    started_any: bool,
    finished_all: bool,
    finished_prov_all: bool,
}

impl Default for TeamAggregate {
    fn default() -> Self {
        Self {
            started_any: false,
            finished_all: true,
            finished_prov_all: true,
        }
    }
}

impl TeamAggregate {
    fn absorb(&mut self, started: bool, finished: bool, finished_provisional: bool) {
        self.started_any |= started || finished || finished_provisional;
        self.finished_all &= finished;
        self.finished_prov_all &= finished || finished_provisional;
    }
}

/// Both caches derived from one gameweek's fixture list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureCaches {
    pub team_status: HashMap<TeamKey, TeamStatus>,
    /// Projected bonus, summed across every in-play fixture of the gameweek.
    pub projected_bonus: HashMap<PlayerKey, u32>,
}

/// Derive team status and projected bonus from a full fixture list.
///
/// With `track_provisional` off, provisional finishes are ignored entirely
/// and every team reports `finished_provisional = false`.
pub fn aggregate_fixtures(gw: Gameweek, fixtures: &[Fixture], track_provisional: bool) -> FixtureCaches {
    let mut per_team: HashMap<TeamId, TeamAggregate> = HashMap::new();
    let mut projected_bonus: HashMap<PlayerKey, u32> = HashMap::new();
    let mut projected_fixtures = 0usize;

    for fx in fixtures {
        let finished_provisional = track_provisional && fx.finished_provisional;

        for team in [fx.team_h, fx.team_a] {
            per_team
                .entry(team)
                .or_default()
                .absorb(fx.started, fx.finished, finished_provisional);
        }

        if !fx.in_play() || fx.stat(BPS_IDENTIFIER).is_none() {
            continue;
        }

        projected_fixtures += 1;
        for (player, bonus) in project_bonus(fx.bps_rows()) {
            *projected_bonus.entry(PlayerKey::new(gw, player)).or_insert(0) += u32::from(bonus);
        }
    }

    let team_status = per_team
        .into_iter()
        .map(|(team, agg)| {
            let status = TeamStatus {
                started: agg.started_any,
                finished: agg.finished_all,
                finished_provisional: track_provisional && agg.finished_prov_all,
            };
            (TeamKey::new(gw, team), status)
        })
        .collect();

    debug!(
        %gw,
        fixtures = fixtures.len(),
        projected_fixtures,
        "fixture caches aggregated"
    );

    FixtureCaches {
        team_status,
        projected_bonus,
    }
}
