// Ingestion boundary: lenient numeric coercion plus the bootstrap and entry
// picks payloads.
//
// Upstream payloads are loosely typed (numbers sometimes arrive as strings,
// arrays are sometimes missing). Everything is coerced here, once, so the
// engine only ever sees typed values. Fixture and live-stat parsing live next
// to their components in `fixtures` and `live`.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::autosub::{Chip, PlayingPosition};
use crate::ids::{Gameweek, PlayerId, TeamId};

// ---------------------------------------------------------------------------
// Coercion helpers
// ---------------------------------------------------------------------------

/// A finite number from a JSON number or a numeric string.
pub(crate) fn number(v: Option<&Value>) -> Option<f64> {
    let n = match v? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

/// A whole number; fractional values are rejected.
pub(crate) fn integer(v: Option<&Value>) -> Option<i64> {
    number(v)
        .filter(|n| n.fract() == 0.0)
        .map(|n| n as i64)
}

/// A non-negative identifier that fits in `u32`.
pub(crate) fn id(v: Option<&Value>) -> Option<u32> {
    integer(v).and_then(|n| u32::try_from(n).ok())
}

/// Counter coercion with a zero default.
pub(crate) fn int_or_zero(v: Option<&Value>) -> i32 {
    number(v).map(|n| n as i32).unwrap_or(0)
}

pub(crate) fn flag(v: Option<&Value>) -> bool {
    v.and_then(Value::as_bool).unwrap_or(false)
}

/// The array at `v`, or an empty slice for anything that is not an array.
pub(crate) fn array(v: Option<&Value>) -> &[Value] {
    v.and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

// ---------------------------------------------------------------------------
// bootstrap-static
// ---------------------------------------------------------------------------

/// Static metadata for one player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerMeta {
    pub id: PlayerId,
    pub web_name: String,
    pub team: TeamId,
    pub position: PlayingPosition,
}

/// The parts of `bootstrap-static` the engine needs.
#[derive(Debug, Clone, Default)]
pub struct Bootstrap {
    pub players: HashMap<PlayerId, PlayerMeta>,
    /// The gameweek flagged `is_current`, if any.
    pub current_gameweek: Option<Gameweek>,
}

impl Bootstrap {
    pub fn player(&self, id: PlayerId) -> Option<&PlayerMeta> {
        self.players.get(&id)
    }
}

pub fn parse_bootstrap(payload: &Value) -> Bootstrap {
    let mut players = HashMap::new();
    let mut dropped = 0usize;

    for element in array(payload.get("elements")) {
        match parse_player_meta(element) {
            Some(meta) => {
                players.insert(meta.id, meta);
            }
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!(dropped, "bootstrap elements without id/team/position skipped");
    }

    let current_gameweek = array(payload.get("events"))
        .iter()
        .find(|e| flag(e.get("is_current")))
        .and_then(|e| id(e.get("id")))
        .map(Gameweek);

    Bootstrap {
        players,
        current_gameweek,
    }
}

fn parse_player_meta(element: &Value) -> Option<PlayerMeta> {
    let player = PlayerId(id(element.get("id"))?);
    let team = TeamId(id(element.get("team"))?);
    let position = PlayingPosition::from_element_type(id_u8(element.get("element_type"))?)?;
    let web_name = element
        .get("web_name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some(PlayerMeta {
        id: player,
        web_name,
        team,
        position,
    })
}

fn id_u8(v: Option<&Value>) -> Option<u8> {
    id(v).and_then(|n| u8::try_from(n).ok())
}

// ---------------------------------------------------------------------------
// entry/{id}/event/{gw}/picks
// ---------------------------------------------------------------------------

/// One squad slot as the manager set it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryPick {
    pub player: PlayerId,
    /// 1..=11 starters, 12..=15 bench in substitution priority order.
    pub slot: u8,
    pub is_captain: bool,
    pub is_vice_captain: bool,
}

/// A manager's squad for one gameweek.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntryPicks {
    pub chip: Chip,
    pub picks: Vec<EntryPick>,
    /// Points deducted for extra transfers this gameweek.
    pub transfer_cost: i32,
}

pub fn parse_entry_picks(payload: &Value) -> EntryPicks {
    let picks = array(payload.get("picks"))
        .iter()
        .filter_map(|p| {
            Some(EntryPick {
                player: PlayerId(id(p.get("element"))?),
                slot: id_u8(p.get("position"))?,
                is_captain: flag(p.get("is_captain")),
                is_vice_captain: flag(p.get("is_vice_captain")),
            })
        })
        .collect();

    let chip = Chip::from_code(payload.get("active_chip").and_then(Value::as_str));
    let transfer_cost = int_or_zero(
        payload
            .get("entry_history")
            .and_then(|h| h.get("event_transfers_cost")),
    );

    EntryPicks {
        chip,
        picks,
        transfer_cost,
    }
}
