// Library root: the live gameweek scoring engine.
//
// Everything in this crate is synchronous and free of I/O. Upstream JSON is
// parsed once at the `payload` boundary; the caches live in an explicit
// `LiveContext`; the per-player and per-squad computations are pure functions
// over that context and are re-run from a full snapshot on every poll.

pub mod autosub;
pub mod bonus;
pub mod context;
pub mod fixtures;
pub mod ids;
pub mod live;
pub mod payload;
pub mod player;
pub mod squad;

pub use autosub::{apply_auto_subs, AutoSubStatus, Chip, Pick, PlayingPosition, ScoredPick};
pub use bonus::{project_bonus, BpsRow};
pub use context::{LiveContext, PlayerKey, TeamKey};
pub use fixtures::{aggregate_fixtures, parse_fixtures, Fixture, FixtureCaches, TeamStatus};
pub use ids::{Gameweek, PlayerId, TeamId};
pub use live::{parse_live, ExtendedStats, LiveStatLine};
pub use payload::{parse_bootstrap, parse_entry_picks, Bootstrap, EntryPick, EntryPicks, PlayerMeta};
pub use player::{compute_player_live, BonusPolicy, MatchStatus, PlayerLive};
pub use squad::{ScoredSquad, Squad};
