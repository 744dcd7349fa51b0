// Live stat ingestion: `event/{gw}/live` into per-player stat lines.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::ids::PlayerId;
use crate::payload::{array, id, int_or_zero};

/// Defensive and attacking counters, only carried when requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtendedStats {
    pub bps: i32,
    pub goals_scored: i32,
    pub assists: i32,
    pub clean_sheets: i32,
    pub goals_conceded: i32,
    pub own_goals: i32,
    pub penalties_saved: i32,
    pub penalties_missed: i32,
    pub yellow_cards: i32,
    pub red_cards: i32,
    pub saves: i32,
    pub clearances_blocks_interceptions: i32,
    pub recoveries: i32,
    pub tackles: i32,
    pub defensive_contribution: i32,
}

impl ExtendedStats {
    fn from_stats(stats: Option<&Value>) -> Self {
        let field = |name: &str| int_or_zero(stats.and_then(|s| s.get(name)));
        Self {
            bps: field("bps"),
            goals_scored: field("goals_scored"),
            assists: field("assists"),
            clean_sheets: field("clean_sheets"),
            goals_conceded: field("goals_conceded"),
            own_goals: field("own_goals"),
            penalties_saved: field("penalties_saved"),
            penalties_missed: field("penalties_missed"),
            yellow_cards: field("yellow_cards"),
            red_cards: field("red_cards"),
            saves: field("saves"),
            clearances_blocks_interceptions: field("clearances_blocks_interceptions"),
            recoveries: field("recoveries"),
            tackles: field("tackles"),
            defensive_contribution: field("defensive_contribution"),
        }
    }
}

/// Official figures for one player in one gameweek.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LiveStatLine {
    /// Official total, including any bonus already confirmed.
    pub points: i32,
    /// Bonus the provider has confirmed so far.
    pub bonus: i32,
    pub minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended: Option<ExtendedStats>,
}

impl LiveStatLine {
    pub fn new(points: i32, bonus: i32, minutes: u32) -> Self {
        Self {
            points,
            bonus,
            minutes,
            extended: None,
        }
    }
}

/// Parse the live payload into a full replacement cache keyed by player.
///
/// A missing `elements` array yields an empty map; elements without a
/// numeric id are skipped; every counter defaults to zero.
pub fn parse_live(payload: &Value, include_extended: bool) -> HashMap<PlayerId, LiveStatLine> {
    let elements = array(payload.get("elements"));
    let mut out = HashMap::with_capacity(elements.len());

    for element in elements {
        let Some(player) = id(element.get("id")).map(PlayerId) else {
            continue;
        };
        let stats = element.get("stats");
        let stat = |name: &str| int_or_zero(stats.and_then(|s| s.get(name)));

        out.insert(
            player,
            LiveStatLine {
                points: stat("total_points"),
                bonus: stat("bonus"),
                minutes: u32::try_from(stat("minutes")).unwrap_or(0),
                extended: include_extended.then(|| ExtendedStats::from_stats(stats)),
            },
        );
    }

    if out.len() < elements.len() {
        debug!(
            dropped = elements.len() - out.len(),
            "live elements without a usable id skipped"
        );
    }
    out
}
