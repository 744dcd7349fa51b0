// Automatic substitutions, captaincy fallback and chip multipliers.
//
// Re-run from a full snapshot on every poll. A "did not play" conclusion is
// only drawn once a player's match is finished, and bench candidates are
// only considered while their own matches are finished, so results can
// change from one poll to the next as fixtures resolve.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{PlayerId, TeamId};
use crate::player::{MatchStatus, PlayerLive};

/// Slots 1..=STARTERS start; the rest are bench in priority order.
pub const STARTERS: usize = 11;
pub const MAX_OUTFIELD: usize = 10;
pub const MIN_DEFENDERS: usize = 3;
pub const MIN_MIDFIELDERS: usize = 2;
pub const MIN_FORWARDS: usize = 1;

// ---------------------------------------------------------------------------
// Positions and chips
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayingPosition {
    #[serde(rename = "GK")]
    Goalkeeper,
    #[serde(rename = "DEF")]
    Defender,
    #[serde(rename = "MID")]
    Midfielder,
    #[serde(rename = "FWD")]
    Forward,
}

impl PlayingPosition {
    /// Upstream `element_type`: 1 GK, 2 DEF, 3 MID, 4 FWD.
    pub fn from_element_type(element_type: u8) -> Option<Self> {
        match element_type {
            1 => Some(PlayingPosition::Goalkeeper),
            2 => Some(PlayingPosition::Defender),
            3 => Some(PlayingPosition::Midfielder),
            4 => Some(PlayingPosition::Forward),
            _ => None,
        }
    }

    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GK" | "GKP" => Some(PlayingPosition::Goalkeeper),
            "DEF" => Some(PlayingPosition::Defender),
            "MID" => Some(PlayingPosition::Midfielder),
            "FWD" => Some(PlayingPosition::Forward),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            PlayingPosition::Goalkeeper => "GK",
            PlayingPosition::Defender => "DEF",
            PlayingPosition::Midfielder => "MID",
            PlayingPosition::Forward => "FWD",
        }
    }

    pub fn is_outfield(&self) -> bool {
        !matches!(self, PlayingPosition::Goalkeeper)
    }
}

impl fmt::Display for PlayingPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

/// Active chip. Chips that do not change scoring (wildcard, free hit) map
/// to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Chip {
    #[default]
    None,
    BenchBoost,
    TripleCaptain,
}

impl Chip {
    /// Accepts upstream codes (`bboost`, `3xc`) and short codes (`BB`, `TC`).
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(str::trim) {
            Some(c) if c.eq_ignore_ascii_case("bboost") || c.eq_ignore_ascii_case("bb") => Chip::BenchBoost,
            Some(c) if c.eq_ignore_ascii_case("3xc") || c.eq_ignore_ascii_case("tc") => Chip::TripleCaptain,
            _ => Chip::None,
        }
    }

    pub fn captain_factor(&self) -> u8 {
        match self {
            Chip::TripleCaptain => 3,
            _ => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Picks
// ---------------------------------------------------------------------------

/// One squad slot, annotated with the player's live figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pick {
    pub player: PlayerId,
    pub team: TeamId,
    pub slot: u8,
    pub position: PlayingPosition,
    pub is_captain: bool,
    pub is_vice_captain: bool,
    pub live: PlayerLive,
}

impl Pick {
    fn did_not_play(&self) -> bool {
        self.live.did_not_play()
    }

    fn match_finished(&self) -> bool {
        self.live.status == MatchStatus::Finished
    }

    /// Has minutes, or still could get some.
    fn may_score(&self) -> bool {
        self.live.minutes > 0 || !self.match_finished()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AutoSubStatus {
    #[serde(rename = "OUT")]
    Out,
    #[serde(rename = "IN")]
    In,
}

/// A pick with its resolved scoring weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredPick {
    #[serde(flatten)]
    pub pick: Pick,
    /// 0 when not counting, 1 normally, the chip factor for the captain.
    pub multiplier: u8,
    pub auto_sub: Option<AutoSubStatus>,
}

impl ScoredPick {
    pub fn is_active(&self) -> bool {
        self.multiplier > 0
    }
}

// ---------------------------------------------------------------------------
// Formation bookkeeping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Formation {
    def: usize,
    mid: usize,
    fwd: usize,
}

impl Formation {
    fn of<'a>(picks: impl IntoIterator<Item = &'a Pick>) -> Self {
        let mut f = Formation::default();
        for p in picks {
            f.add(p.position);
        }
        f
    }

    fn add(&mut self, pos: PlayingPosition) {
        match pos {
            PlayingPosition::Defender => self.def += 1,
            PlayingPosition::Midfielder => self.mid += 1,
            PlayingPosition::Forward => self.fwd += 1,
            PlayingPosition::Goalkeeper => {}
        }
    }

    fn total(&self) -> usize {
        self.def + self.mid + self.fwd
    }

    fn is_legal(&self) -> bool {
        self.def >= MIN_DEFENDERS && self.mid >= MIN_MIDFIELDERS && self.fwd >= MIN_FORWARDS
    }

    /// Players per position still needed to reach the minimum formation.
    fn shortfall(&self) -> Formation {
        Formation {
            def: MIN_DEFENDERS.saturating_sub(self.def),
            mid: MIN_MIDFIELDERS.saturating_sub(self.mid),
            fwd: MIN_FORWARDS.saturating_sub(self.fwd),
        }
    }

    fn covers(&self, need: &Formation) -> bool {
        self.def >= need.def && self.mid >= need.mid && self.fwd >= need.fwd
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Resolve active players, auto-substitutions and multipliers for a squad.
///
/// Output is ordered by slot. Under Bench Boost nobody is substituted and
/// every pick counts. Otherwise:
///
/// - a starting GK who did not play is replaced by the first bench GK who is
///   not also a confirmed non-player, else the GK slot stays empty;
/// - starting outfielders who did not play drop out; the outfield bench is
///   walked in priority order, stopping at the first candidate whose match
///   is unfinished, skipping candidates without minutes, and committing a
///   candidate only if the minimum formation is still reachable from the
///   finished, played bench players below it (enough per position, and at
///   least as many as the spots still open);
/// - the captain keeps the armband while active and able to score, else the
///   vice-captain under the same test, else nobody.
pub fn apply_auto_subs(picks: &[Pick], chip: Chip) -> Vec<ScoredPick> {
    let mut sorted: Vec<&Pick> = picks.iter().collect();
    sorted.sort_by_key(|p| p.slot);
    let factor = chip.captain_factor();

    if chip == Chip::BenchBoost {
        let captain = sorted.iter().find(|p| p.is_captain).map(|p| p.player);
        return sorted
            .into_iter()
            .map(|p| ScoredPick {
                pick: p.clone(),
                multiplier: if Some(p.player) == captain { factor } else { 1 },
                auto_sub: None,
            })
            .collect();
    }

    // Split on slot number; a squad may be missing picks.
    let (starters, bench): (Vec<&Pick>, Vec<&Pick>) = sorted
        .iter()
        .copied()
        .partition(|p| usize::from(p.slot) <= STARTERS);
    let mut subbed_out: HashSet<PlayerId> = HashSet::new();
    let mut subbed_in: HashSet<PlayerId> = HashSet::new();

    // Goalkeeper: only ever replaced by another goalkeeper.
    let mut active_gk = starters
        .iter()
        .find(|p| p.position == PlayingPosition::Goalkeeper)
        .copied();
    if let Some(gk) = active_gk.filter(|gk| gk.did_not_play()) {
        subbed_out.insert(gk.player);
        active_gk = bench
            .iter()
            .find(|p| p.position == PlayingPosition::Goalkeeper && !p.did_not_play())
            .copied();
        if let Some(sub) = active_gk {
            subbed_in.insert(sub.player);
        }
    }

    // Outfield.
    let mut active_outfield: Vec<&Pick> = Vec::with_capacity(MAX_OUTFIELD);
    for p in starters.iter().filter(|p| p.position.is_outfield()) {
        if p.did_not_play() {
            subbed_out.insert(p.player);
        } else {
            active_outfield.push(p);
        }
    }

    let outfield_bench: Vec<&Pick> = bench
        .iter()
        .filter(|p| p.position.is_outfield())
        .copied()
        .collect();

    for (idx, cand) in outfield_bench.iter().enumerate() {
        if active_outfield.len() >= MAX_OUTFIELD {
            break;
        }
        // Nothing further down the bench can be settled this poll.
        if !cand.match_finished() {
            break;
        }
        if cand.live.minutes == 0 {
            continue;
        }

        let mut trial = Formation::of(active_outfield.iter().copied());
        trial.add(cand.position);

        let accept = if trial.total() == MAX_OUTFIELD {
            trial.is_legal()
        } else {
            let spots_left = MAX_OUTFIELD - trial.total();
            let need = trial.shortfall();
            let available = Formation::of(
                outfield_bench[idx + 1..]
                    .iter()
                    .copied()
                    .take_while(|p| p.match_finished())
                    .filter(|p| p.live.minutes > 0),
            );
            available.covers(&need) && available.total() >= spots_left
        };

        if accept {
            active_outfield.push(cand);
            subbed_in.insert(cand.player);
        }
    }

    let active: HashSet<PlayerId> = active_gk
        .into_iter()
        .chain(active_outfield.iter().copied())
        .map(|p| p.player)
        .collect();

    let armband = |p: &&&Pick| active.contains(&p.player) && p.may_score();
    let captain = sorted
        .iter()
        .find(|p| p.is_captain)
        .filter(armband)
        .or_else(|| sorted.iter().find(|p| p.is_vice_captain).filter(armband))
        .map(|p| p.player);

    sorted
        .into_iter()
        .map(|p| {
            let multiplier = if !active.contains(&p.player) {
                0
            } else if Some(p.player) == captain {
                factor
            } else {
                1
            };
            let auto_sub = if subbed_out.contains(&p.player) {
                Some(AutoSubStatus::Out)
            } else if subbed_in.contains(&p.player) {
                Some(AutoSubStatus::In)
            } else {
                None
            };
            ScoredPick {
                pick: p.clone(),
                multiplier,
                auto_sub,
            }
        })
        .collect()
}
