// Per-player live computation: official stats + team state + projected bonus
// into a displayable total.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::fixtures::TeamStatus;
use crate::live::LiveStatLine;

/// When projected bonus is shown and when official bonus is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusPolicy {
    /// Treat a provisional finish as final for bonus purposes.
    pub bonus_confirmed_on_provisional: bool,
    /// Add projected bonus while the match is being played.
    pub projected_bonus_during_live: bool,
    /// Add projected bonus between the final whistle and confirmation.
    pub projected_bonus_during_provisional: bool,
}

impl Default for BonusPolicy {
    fn default() -> Self {
        Self {
            bonus_confirmed_on_provisional: false,
            projected_bonus_during_live: true,
            projected_bonus_during_provisional: true,
        }
    }
}

/// Match state as shown next to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    #[serde(rename = "NS")]
    NotStarted,
    #[serde(rename = "Live")]
    Live,
    /// Finished or provisionally finished.
    #[serde(rename = "Fin")]
    Finished,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::NotStarted => "NS",
            MatchStatus::Live => "Live",
            MatchStatus::Finished => "Fin",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The computed line for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLive {
    /// The part of `live_total` that cannot retract if the projection moves.
    pub locked: i32,
    pub proj_bonus: i32,
    pub live_total: i32,
    pub status: MatchStatus,
    pub minutes: u32,
    pub confirmed_bonus: i32,
}

impl PlayerLive {
    /// A player whose match has not kicked off.
    pub fn not_started() -> Self {
        Self {
            locked: 0,
            proj_bonus: 0,
            live_total: 0,
            status: MatchStatus::NotStarted,
            minutes: 0,
            confirmed_bonus: 0,
        }
    }

    /// Match is over (or provisionally over) and the player got no minutes.
    pub fn did_not_play(&self) -> bool {
        self.minutes == 0 && self.status == MatchStatus::Finished
    }
}

/// Resolve a player's live figures. First matching rule wins:
///
/// 1. bonus confirmed: the official total stands.
/// 2. provisional finish with projection enabled: base + projected bonus.
/// 3. started with projection enabled: base + projected bonus.
/// 4. started or provisionally finished: base only.
/// 5. not started: zero.
///
/// "Base" is the official total with any confirmed bonus taken back out, so a
/// projection never double counts. Arithmetic saturates at the `i32` bounds.
pub fn compute_player_live(
    live: Option<&LiveStatLine>,
    team: TeamStatus,
    projected_bonus: u32,
    policy: &BonusPolicy,
) -> PlayerLive {
    let live = live.copied().unwrap_or_default();
    let TeamStatus {
        started,
        finished,
        finished_provisional,
    } = team;

    let bonus_confirmed = finished || (policy.bonus_confirmed_on_provisional && finished_provisional);
    let official_total = live.points;
    let confirmed_bonus = live.bonus;
    let base = official_total.saturating_sub(confirmed_bonus);
    let projected = i32::try_from(projected_bonus).unwrap_or(i32::MAX);

    let (live_total, proj_bonus) = if bonus_confirmed {
        (official_total, 0)
    } else if finished_provisional && policy.projected_bonus_during_provisional {
        (base.saturating_add(projected), projected)
    } else if started && policy.projected_bonus_during_live {
        (base.saturating_add(projected), projected)
    } else if started || finished_provisional {
        (base, 0)
    } else {
        (0, 0)
    };

    let status = if finished || finished_provisional {
        MatchStatus::Finished
    } else if started {
        MatchStatus::Live
    } else {
        MatchStatus::NotStarted
    };

    PlayerLive {
        locked: live_total.saturating_sub(proj_bonus),
        proj_bonus,
        live_total,
        status,
        minutes: live.minutes,
        confirmed_bonus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(started: bool, finished: bool, finished_provisional: bool) -> TeamStatus {
        TeamStatus {
            started,
            finished,
            finished_provisional,
        }
    }

    fn policy(on_prov: bool, during_live: bool, during_prov: bool) -> BonusPolicy {
        BonusPolicy {
            bonus_confirmed_on_provisional: on_prov,
            projected_bonus_during_live: during_live,
            projected_bonus_during_provisional: during_prov,
        }
    }

    #[test]
    fn finished_match_uses_official_total() {
        let line = LiveStatLine::new(8, 2, 90);
        let out = compute_player_live(Some(&line), team(true, true, false), 3, &policy(false, true, true));
        assert_eq!(out.live_total, 8);
        assert_eq!(out.proj_bonus, 0);
        assert_eq!(out.locked, 8);
        assert_eq!(out.status, MatchStatus::Finished);
        assert_eq!(out.confirmed_bonus, 2);
        assert_eq!(out.minutes, 90);
    }

    #[test]
    fn finished_match_ignores_any_projection() {
        let line = LiveStatLine::new(8, 2, 90);
        for projected in [0, 1, 3, 6] {
            let out = compute_player_live(Some(&line), team(true, true, false), projected, &policy(false, true, true));
            assert_eq!(out.proj_bonus, 0);
        }
    }

    #[test]
    fn live_match_adds_projected_bonus() {
        let line = LiveStatLine::new(6, 0, 75);
        let out = compute_player_live(Some(&line), team(true, false, false), 3, &policy(false, true, true));
        assert_eq!(out.live_total, 9);
        assert_eq!(out.proj_bonus, 3);
        assert_eq!(out.locked, 6);
        assert_eq!(out.status, MatchStatus::Live);
    }

    #[test]
    fn live_projection_disabled_shows_base_only() {
        let line = LiveStatLine::new(6, 0, 75);
        let out = compute_player_live(Some(&line), team(true, false, false), 3, &policy(false, false, true));
        assert_eq!(out.live_total, 6);
        assert_eq!(out.proj_bonus, 0);
        assert_eq!(out.locked, 6);
        assert_eq!(out.status, MatchStatus::Live);
    }

    #[test]
    fn base_strips_confirmed_bonus_before_projecting() {
        // Upstream can confirm bonus while our status still says live.
        let line = LiveStatLine::new(9, 3, 90);
        let out = compute_player_live(Some(&line), team(true, false, false), 2, &policy(false, true, true));
        assert_eq!(out.live_total, 8);
        assert_eq!(out.proj_bonus, 2);
        assert_eq!(out.locked, 6);
    }

    #[test]
    fn provisional_finish_confirmed_when_policy_allows() {
        let line = LiveStatLine::new(8, 2, 90);
        let out = compute_player_live(Some(&line), team(true, false, true), 3, &policy(true, true, true));
        assert_eq!(out.live_total, 8);
        assert_eq!(out.proj_bonus, 0);
        assert_eq!(out.locked, 8);
        assert_eq!(out.status, MatchStatus::Finished);
    }

    #[test]
    fn provisional_finish_projects_when_not_confirmed() {
        let line = LiveStatLine::new(6, 0, 90);
        let out = compute_player_live(Some(&line), team(true, false, true), 3, &policy(false, true, true));
        assert_eq!(out.live_total, 9);
        assert_eq!(out.proj_bonus, 3);
        assert_eq!(out.locked, 6);
        assert_eq!(out.status, MatchStatus::Finished);
    }

    #[test]
    fn provisional_projection_disabled_falls_through_to_live_rule() {
        let line = LiveStatLine::new(6, 0, 90);
        let out = compute_player_live(Some(&line), team(true, false, true), 3, &policy(false, true, false));
        assert_eq!(out.live_total, 9);
        assert_eq!(out.proj_bonus, 3);

        let out = compute_player_live(Some(&line), team(true, false, true), 3, &policy(false, false, false));
        assert_eq!(out.live_total, 6);
        assert_eq!(out.proj_bonus, 0);
    }

    #[test]
    fn not_started_is_zero() {
        let out = compute_player_live(None, team(false, false, false), 3, &BonusPolicy::default());
        assert_eq!(out, PlayerLive::not_started());
        assert_eq!(out.status.to_string(), "NS");
    }

    #[test]
    fn missing_live_line_defaults_to_zero() {
        let out = compute_player_live(None, team(true, false, false), 0, &BonusPolicy::default());
        assert_eq!(out.live_total, 0);
        assert_eq!(out.minutes, 0);
        assert_eq!(out.status, MatchStatus::Live);
    }

    #[test]
    fn locked_plus_projection_is_total() {
        let line = LiveStatLine::new(4, 1, 60);
        for st in [team(false, false, false), team(true, false, false), team(true, false, true), team(true, true, true)] {
            for p in [policy(false, true, true), policy(true, false, false), policy(false, false, true)] {
                let out = compute_player_live(Some(&line), st, 2, &p);
                assert_eq!(out.locked + out.proj_bonus, out.live_total);
            }
        }
    }

    #[test]
    fn did_not_play_needs_finished_and_zero_minutes() {
        let finished = compute_player_live(Some(&LiveStatLine::new(0, 0, 0)), team(true, true, true), 0, &BonusPolicy::default());
        assert!(finished.did_not_play());

        let live = compute_player_live(Some(&LiveStatLine::new(0, 0, 0)), team(true, false, false), 0, &BonusPolicy::default());
        assert!(!live.did_not_play());
    }

    #[test]
    fn extreme_counters_saturate() {
        let payload = serde_json::json!({"elements": [
            {"id": 1, "stats": {"total_points": -1e12, "bonus": 3, "minutes": 90}}
        ]});
        let lines = crate::live::parse_live(&payload, false);
        let line = lines[&crate::ids::PlayerId(1)];
        assert_eq!(line.points, i32::MIN);
        let out = compute_player_live(Some(&line), team(true, false, false), 3, &BonusPolicy::default());
        assert_eq!(out.live_total, i32::MIN + 3);
        assert_eq!(out.locked, i32::MIN);

        let line = LiveStatLine::new(i32::MAX, -5, 90);
        let out = compute_player_live(Some(&line), team(true, false, false), 3, &BonusPolicy::default());
        assert_eq!(out.live_total, i32::MAX);
        assert_eq!(out.proj_bonus, 3);
    }

    #[test]
    fn serializes_with_display_labels() {
        let out = compute_player_live(Some(&LiveStatLine::new(6, 0, 75)), team(true, false, false), 3, &BonusPolicy::default());
        let json = serde_json::to_value(out).unwrap();
        assert_eq!(json["status"], "Live");
        assert_eq!(json["liveTotal"], 9);
        assert_eq!(json["projBonus"], 3);
    }
}
