// Squad assembly and live totals for one manager entry.

use serde::Serialize;
use tracing::warn;

use crate::autosub::{apply_auto_subs, AutoSubStatus, Chip, Pick, ScoredPick};
use crate::context::LiveContext;
use crate::ids::{Gameweek, PlayerId};
use crate::payload::{Bootstrap, EntryPicks};
use crate::player::BonusPolicy;

/// A manager's picks annotated with live figures, ready to score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Squad {
    pub gw: Gameweek,
    pub chip: Chip,
    pub transfer_cost: i32,
    pub picks: Vec<Pick>,
}

impl Squad {
    /// Join the entry's picks with player metadata and the live context.
    ///
    /// Picks naming a player the bootstrap index does not know are dropped.
    pub fn assemble(
        entry: &EntryPicks,
        bootstrap: &Bootstrap,
        ctx: &LiveContext,
        gw: Gameweek,
        policy: &BonusPolicy,
    ) -> Self {
        let mut picks = Vec::with_capacity(entry.picks.len());

        for ep in &entry.picks {
            let Some(meta) = bootstrap.player(ep.player) else {
                warn!(player = %ep.player, slot = ep.slot, "pick not in bootstrap index, skipped");
                continue;
            };
            picks.push(Pick {
                player: ep.player,
                team: meta.team,
                slot: ep.slot,
                position: meta.position,
                is_captain: ep.is_captain,
                is_vice_captain: ep.is_vice_captain,
                live: ctx.player_live(ep.player, meta.team, gw, policy),
            });
        }

        Self {
            gw,
            chip: entry.chip,
            transfer_cost: entry.transfer_cost,
            picks,
        }
    }

    pub fn score(&self) -> ScoredSquad {
        let picks = apply_auto_subs(&self.picks, self.chip);

        let weighted = |f: fn(&ScoredPick) -> i32| -> i32 {
            picks
                .iter()
                .map(|p| i32::from(p.multiplier).saturating_mul(f(p)))
                .fold(0i32, i32::saturating_add)
        };
        let live_total = weighted(|p| p.pick.live.live_total);
        let locked_total = weighted(|p| p.pick.live.locked);
        let projected_bonus = weighted(|p| p.pick.live.proj_bonus);

        ScoredSquad {
            gw: self.gw,
            chip: self.chip,
            live_total,
            locked_total,
            projected_bonus,
            transfer_cost: self.transfer_cost,
            net_total: live_total.saturating_sub(self.transfer_cost),
            picks,
        }
    }
}

/// Result of scoring a squad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredSquad {
    pub gw: Gameweek,
    pub chip: Chip,
    /// Multiplier-weighted live points, before transfer cost.
    pub live_total: i32,
    /// The part of `live_total` that cannot move with the bonus projection.
    pub locked_total: i32,
    pub projected_bonus: i32,
    pub transfer_cost: i32,
    pub net_total: i32,
    pub picks: Vec<ScoredPick>,
}

impl ScoredSquad {
    /// The pick currently carrying the armband, if anyone is.
    pub fn captain(&self) -> Option<&ScoredPick> {
        self.picks.iter().find(|p| p.multiplier > 1)
    }

    pub fn subbed_in(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.with_status(AutoSubStatus::In)
    }

    pub fn subbed_out(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.with_status(AutoSubStatus::Out)
    }

    fn with_status(&self, status: AutoSubStatus) -> impl Iterator<Item = PlayerId> + '_ {
        self.picks
            .iter()
            .filter(move |p| p.auto_sub == Some(status))
            .map(|p| p.pick.player)
    }
}
