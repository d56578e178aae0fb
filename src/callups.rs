use std::collections::HashSet;

use crate::model::{CallUp, CallUpStatus, Match, Player};

/// Typical matchday squad; overridable through `CLUB_SQUAD_SIZE`.
pub const DEFAULT_SQUAD_SIZE: usize = 18;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallUpPlan {
    /// No scheduled match, so there is nothing to call players up for.
    NoMatch,
    /// First convocation for this match: these player ids get Called rows.
    Seed(Vec<i64>),
    /// Roster members without a row yet (e.g. signed after the convocation).
    AddMissing(Vec<i64>),
    Unchanged,
}

impl CallUpPlan {
    pub fn player_ids(&self) -> &[i64] {
        match self {
            CallUpPlan::Seed(ids) | CallUpPlan::AddMissing(ids) => ids,
            CallUpPlan::NoMatch | CallUpPlan::Unchanged => &[],
        }
    }
}

pub fn plan_call_ups(
    next_match: Option<&Match>,
    existing: &[CallUp],
    roster: &[Player],
    squad_size: usize,
) -> CallUpPlan {
    if next_match.is_none() {
        return CallUpPlan::NoMatch;
    }

    let ordered = roster_order(roster);
    if existing.is_empty() {
        if ordered.is_empty() {
            return CallUpPlan::Unchanged;
        }
        return CallUpPlan::Seed(ordered.iter().take(squad_size).map(|p| p.id).collect());
    }

    let existing_ids: HashSet<i64> = existing.iter().map(|c| c.player.id).collect();
    let missing: Vec<i64> = ordered
        .iter()
        .filter(|p| !existing_ids.contains(&p.id))
        .map(|p| p.id)
        .collect();
    if missing.is_empty() {
        CallUpPlan::Unchanged
    } else {
        CallUpPlan::AddMissing(missing)
    }
}

/// Roster order is ascending jersey number, ties broken by id.
pub fn roster_order(roster: &[Player]) -> Vec<&Player> {
    let mut ordered: Vec<&Player> = roster.iter().collect();
    ordered.sort_by(|a, b| a.number.cmp(&b.number).then(a.id.cmp(&b.id)));
    ordered
}

/// Re-fetched call-ups ordered so the entries in `previous` keep their
/// relative order and newly created ones follow in roster order.
pub fn merge_order(mut fetched: Vec<CallUp>, previous: &[CallUp]) -> Vec<CallUp> {
    let rank = |c: &CallUp| {
        previous
            .iter()
            .position(|p| p.player.id == c.player.id)
            .unwrap_or(usize::MAX)
    };
    fetched.sort_by(|a, b| {
        rank(a)
            .cmp(&rank(b))
            .then(a.player.number.cmp(&b.player.number))
            .then(a.player.id.cmp(&b.player.id))
    });
    fetched
}

/// Local mirror of a successful status upsert. Returns false when nothing changed.
pub fn set_status(list: &mut [CallUp], player_id: i64, status: CallUpStatus) -> bool {
    let Some(entry) = list.iter_mut().find(|c| c.player.id == player_id) else {
        return false;
    };
    if entry.status == status {
        return false;
    }
    entry.status = status;
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallUpSummary {
    pub called: usize,
    pub injured: usize,
    pub suspended: usize,
}

pub fn summarize(list: &[CallUp]) -> CallUpSummary {
    let mut summary = CallUpSummary::default();
    for entry in list {
        match entry.status {
            CallUpStatus::Called => summary.called += 1,
            CallUpStatus::Injured => summary.injured += 1,
            CallUpStatus::Suspended => summary.suspended += 1,
        }
    }
    summary
}
