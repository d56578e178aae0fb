use crate::model::{Match, MatchResult, Player, TeamStats};

/// Aggregate W/D/L and goals over played matches. Unplayed rows should be
/// filtered out by the caller; missing scores count as zero. Sums saturate
/// at `u32::MAX`.
pub fn compute_stats(played: &[Match]) -> TeamStats {
    let mut stats = TeamStats {
        total_games: u32::try_from(played.len()).unwrap_or(u32::MAX),
        ..TeamStats::default()
    };
    for m in played {
        match m.result {
            Some(MatchResult::Win) => stats.wins = stats.wins.saturating_add(1),
            Some(MatchResult::Draw) => stats.draws = stats.draws.saturating_add(1),
            Some(MatchResult::Loss) => stats.losses = stats.losses.saturating_add(1),
            None => {}
        }
        stats.goals_for = stats.goals_for.saturating_add(m.goals_for.unwrap_or(0));
        stats.goals_against = stats
            .goals_against
            .saturating_add(m.goals_against.unwrap_or(0));
    }
    stats.win_percentage = win_percentage(stats.wins, stats.total_games);
    stats
}

pub fn win_percentage(wins: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(wins) / f64::from(total) * 100.0).round() as u32
}

/// Result letters for the first `n` played matches, in the given order
/// (callers pass most-recent first).
pub fn recent_form(matches: &[Match], n: usize) -> String {
    matches
        .iter()
        .filter(|m| m.played)
        .filter_map(|m| m.result)
        .take(n)
        .map(MatchResult::letter)
        .collect()
}

pub fn top_scorers(players: &[Player], n: usize) -> Vec<&Player> {
    let mut ranked: Vec<&Player> = players.iter().filter(|p| p.stats.goals > 0).collect();
    ranked.sort_by(|a, b| {
        b.stats
            .goals
            .cmp(&a.stats.goals)
            .then(b.stats.assists.cmp(&a.stats.assists))
            .then(a.number.cmp(&b.number))
    });
    ranked.truncate(n);
    ranked
}
