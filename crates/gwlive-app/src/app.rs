// Poll loop: refresh the live context, score each configured entry and
// render one report line per entry.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use gwlive_core::{
    parse_bootstrap, parse_entry_picks, Bootstrap, Chip, Gameweek, PlayerId, ScoredSquad, Squad,
};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::feed::{FeedError, FeedSource};
use crate::refresh::{LiveSession, RefreshOptions, RefreshOutcome};

// ---------------------------------------------------------------------------
// Startup
// ---------------------------------------------------------------------------

/// Fetch and index the bootstrap player list.
pub async fn load_bootstrap(feed: &dyn FeedSource) -> anyhow::Result<Bootstrap> {
    let body = feed.bootstrap().await.context("failed to fetch bootstrap-static")?;
    let bootstrap = parse_bootstrap(&body);
    if bootstrap.players.is_empty() {
        anyhow::bail!("bootstrap-static contained no usable players");
    }
    info!(
        players = bootstrap.players.len(),
        current_gameweek = ?bootstrap.current_gameweek.map(|gw| gw.0),
        "bootstrap loaded"
    );
    Ok(bootstrap)
}

/// The pinned gameweek if configured, else the bootstrap's current one.
pub fn resolve_gameweek(pinned: Option<Gameweek>, bootstrap: &Bootstrap) -> anyhow::Result<Gameweek> {
    pinned
        .or(bootstrap.current_gameweek)
        .context("no gameweek configured and bootstrap has no current gameweek")
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Everything a poll needs besides the session itself.
pub struct Scorer {
    pub bootstrap: Bootstrap,
    pub gw: Gameweek,
    pub config: Config,
}

impl Scorer {
    pub async fn score_entry(&self, session: &LiveSession, entry: u64) -> Result<ScoredSquad, FeedError> {
        let body = session.feed().entry_picks(entry, self.gw).await?;
        let picks = parse_entry_picks(&body);
        let ctx = session.context().await;
        let squad = Squad::assemble(&picks, &self.bootstrap, &ctx, self.gw, &self.config.scoring.bonus);
        Ok(squad.score())
    }

    /// Refresh, then score every entry. Entries whose picks cannot be
    /// fetched are logged and left out of the report.
    pub async fn poll_once(&self, session: &LiveSession) -> Vec<String> {
        if let RefreshOutcome::AlreadyInFlight = session.refresh(self.gw).await {
            return Vec::new();
        }

        let mut lines = Vec::with_capacity(self.config.entries.ids.len());
        for &entry in &self.config.entries.ids {
            match self.score_entry(session, entry).await {
                Ok(scored) => lines.push(format_report(entry, &scored, &self.bootstrap)),
                Err(e) => error!(entry, gw = %self.gw, error = %e, "picks fetch failed"),
            }
        }
        lines
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

fn name(bootstrap: &Bootstrap, player: PlayerId) -> String {
    bootstrap
        .player(player)
        .map(|m| m.web_name.clone())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("#{player}"))
}

fn names(bootstrap: &Bootstrap, players: impl Iterator<Item = PlayerId>) -> String {
    players.map(|p| name(bootstrap, p)).collect::<Vec<_>>().join(", ")
}

/// One plain-text line summarizing a scored entry.
pub fn format_report(entry: u64, squad: &ScoredSquad, bootstrap: &Bootstrap) -> String {
    let mut line = format!(
        "entry {entry} {}: {} pts (locked {}, projected bonus {}",
        squad.gw, squad.net_total, squad.locked_total, squad.projected_bonus
    );
    if squad.transfer_cost != 0 {
        line.push_str(&format!(", transfer cost -{}", squad.transfer_cost));
    }
    line.push(')');

    match squad.chip {
        Chip::BenchBoost => line.push_str(" [BB]"),
        Chip::TripleCaptain => line.push_str(" [TC]"),
        Chip::None => {}
    }

    match squad.captain() {
        Some(c) => line.push_str(&format!(
            " | C {} x{}",
            name(bootstrap, c.pick.player),
            c.multiplier
        )),
        None => line.push_str(" | no captain"),
    }

    if squad.subbed_out().next().is_some() {
        line.push_str(&format!(
            " | out: {} | in: {}",
            names(bootstrap, squad.subbed_out()),
            names(bootstrap, squad.subbed_in())
        ));
    }
    line
}

// ---------------------------------------------------------------------------
// Main loop
// ---------------------------------------------------------------------------

/// Run the poll loop until `shutdown` resolves or `max_polls` is reached,
/// writing report lines to stdout.
pub async fn run<F>(config: Config, feed: Arc<dyn FeedSource>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    let bootstrap = load_bootstrap(feed.as_ref()).await?;
    let gw = resolve_gameweek(config.poll.gameweek(), &bootstrap)?;
    if config.entries.ids.is_empty() {
        warn!("no entries configured; only the live context will be refreshed");
    }
    info!(%gw, entries = config.entries.ids.len(), "poll loop starting");

    let session = LiveSession::new(
        feed,
        RefreshOptions {
            track_provisional: config.scoring.track_provisional_finishes,
            include_extended: config.scoring.include_extended_stats,
        },
    );
    let max_polls = config.poll.max_polls;
    let mut interval = tokio::time::interval(config.poll.interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let scorer = Scorer {
        bootstrap,
        gw,
        config,
    };

    tokio::pin!(shutdown);
    let mut polls: u64 = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
            _ = interval.tick() => {
                for line in scorer.poll_once(&session).await {
                    println!("{line}");
                }
                polls += 1;
                if max_polls.is_some_and(|max| polls >= max) {
                    info!(polls, "poll limit reached");
                    break;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gwlive_core::{
        AutoSubStatus, MatchStatus, Pick, PlayerLive, PlayerMeta, PlayingPosition, ScoredPick, TeamId,
    };
    use std::collections::HashMap;

    fn bootstrap() -> Bootstrap {
        let players: HashMap<PlayerId, PlayerMeta> = [(1, "Raya"), (2, "Saka"), (3, "Areola")]
            .into_iter()
            .map(|(id, web_name)| {
                (
                    PlayerId(id),
                    PlayerMeta {
                        id: PlayerId(id),
                        web_name: web_name.to_string(),
                        team: TeamId(id),
                        position: PlayingPosition::Midfielder,
                    },
                )
            })
            .collect();
        Bootstrap {
            players,
            current_gameweek: Some(Gameweek(9)),
        }
    }

    fn scored_pick(player: u32, multiplier: u8, auto_sub: Option<AutoSubStatus>) -> ScoredPick {
        ScoredPick {
            pick: Pick {
                player: PlayerId(player),
                team: TeamId(player),
                slot: player as u8,
                position: PlayingPosition::Midfielder,
                is_captain: false,
                is_vice_captain: false,
                live: PlayerLive {
                    locked: 0,
                    proj_bonus: 0,
                    live_total: 0,
                    status: MatchStatus::Finished,
                    minutes: 0,
                    confirmed_bonus: 0,
                },
            },
            multiplier,
            auto_sub,
        }
    }

    fn squad(chip: Chip, transfer_cost: i32, picks: Vec<ScoredPick>) -> ScoredSquad {
        ScoredSquad {
            gw: Gameweek(9),
            chip,
            live_total: 60,
            locked_total: 55,
            projected_bonus: 5,
            transfer_cost,
            net_total: 60 - transfer_cost,
            picks,
        }
    }

    #[test]
    fn resolve_prefers_pinned_gameweek() {
        let boot = bootstrap();
        assert_eq!(resolve_gameweek(Some(Gameweek(3)), &boot).unwrap(), Gameweek(3));
        assert_eq!(resolve_gameweek(None, &boot).unwrap(), Gameweek(9));
        assert!(resolve_gameweek(None, &Bootstrap::default()).is_err());
    }

    #[test]
    fn report_line_without_subs() {
        let line = format_report(
            42,
            &squad(Chip::None, 0, vec![scored_pick(2, 2, None)]),
            &bootstrap(),
        );
        assert_eq!(line, "entry 42 GW9: 60 pts (locked 55, projected bonus 5) | C Saka x2");
    }

    #[test]
    fn report_line_with_chip_hits_and_subs() {
        let picks = vec![
            scored_pick(1, 0, Some(AutoSubStatus::Out)),
            scored_pick(2, 3, None),
            scored_pick(3, 1, Some(AutoSubStatus::In)),
        ];
        let line = format_report(42, &squad(Chip::TripleCaptain, 4, picks), &bootstrap());
        assert_eq!(
            line,
            "entry 42 GW9: 56 pts (locked 55, projected bonus 5, transfer cost -4) [TC] \
             | C Saka x3 | out: Raya | in: Areola"
        );
    }

    #[test]
    fn report_line_unknown_player_and_no_captain() {
        let picks = vec![scored_pick(7, 0, Some(AutoSubStatus::Out))];
        let line = format_report(1, &squad(Chip::BenchBoost, 0, picks), &bootstrap());
        assert!(line.contains("[BB]"));
        assert!(line.contains("no captain"));
        assert!(line.contains("out: #7 | in: "));
    }
}
