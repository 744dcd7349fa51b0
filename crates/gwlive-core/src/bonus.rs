// Bonus point projection from raw BPS rows.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::ids::PlayerId;

/// One raw `{element, value}` row from a fixture's "bps" stat block.
///
/// Either field may be missing or non-numeric upstream; such rows are
/// discarded by [`project_bonus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BpsRow {
    pub player: Option<PlayerId>,
    pub score: Option<i32>,
}

impl BpsRow {
    pub fn new(player: u32, score: i32) -> Self {
        Self {
            player: Some(PlayerId(player)),
            score: Some(score),
        }
    }

    fn valid(&self) -> Option<(PlayerId, i32)> {
        Some((self.player?, self.score?))
    }
}

/// Project 3-2-1 bonus points from a fixture's BPS rows.
///
/// Ties compress ranks:
/// - two or more level at the top all get 3; with exactly two, the next
///   distinct score group gets 1; with three or more nobody else scores.
/// - a single leader gets 3; a tied second group all get 2 and nobody else
///   scores; a single second gets 2 and the next distinct group gets 1.
///
/// Every value in the returned map is 1, 2 or 3.
pub fn project_bonus<I>(rows: I) -> BTreeMap<PlayerId, u8>
where
    I: IntoIterator<Item = BpsRow>,
{
    let mut ranked: Vec<(PlayerId, i32)> = rows.into_iter().filter_map(|r| r.valid()).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let groups: Vec<&[(PlayerId, i32)]> = ranked.chunk_by(|a, b| a.1 == b.1).collect();

    let mut out = BTreeMap::new();

    let Some(top) = groups.first() else {
        return out;
    };

    if top.len() >= 2 {
        award(&mut out, top, 3);
        if top.len() == 2 {
            if let Some(next) = groups.get(1) {
                award(&mut out, next, 1);
            }
        }
        return out;
    }

    award(&mut out, top, 3);
    let Some(second) = groups.get(1) else {
        return out;
    };

    award(&mut out, second, 2);
    if second.len() >= 2 {
        return out;
    }

    if let Some(third) = groups.get(2) {
        award(&mut out, third, 1);
    }
    out
}

fn award(out: &mut BTreeMap<PlayerId, u8>, group: &[(PlayerId, i32)], bonus: u8) {
    for &(player, _) in group {
        out.insert(player, bonus);
    }
}
