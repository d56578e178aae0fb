use std::fs;
use std::path::PathBuf;

use club_dashboard::auth::parse_token_response;
use club_dashboard::forms::sort_matches;
use club_dashboard::model::{MatchResult, Position, Venue};
use club_dashboard::rows::{to_match, to_player_with_stats};
use club_dashboard::stats::compute_stats;
use serde_json::Value;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn fixture_rows(name: &str) -> Vec<Value> {
    serde_json::from_str(&read_fixture(name)).expect("fixture should be a JSON array")
}

#[test]
fn parses_players_with_embedded_stats() {
    let rows = fixture_rows("players.json");
    let players: Vec<_> = rows
        .iter()
        .map(|row| to_player_with_stats(row, &[], "2025"))
        .collect();

    assert_eq!(players.len(), 3);
    let alvaro = &players[0];
    assert_eq!(alvaro.number, 10);
    assert_eq!(alvaro.position, Position::Midfielder);
    // The 2024 row is ignored.
    assert_eq!(alvaro.stats.goals, 3);
    assert_eq!(alvaro.stats.games_played, 5);

    let keeper = &players[1];
    assert_eq!(keeper.position, Position::Goalkeeper);
    assert_eq!(keeper.stats.games_played, 6);
    assert_eq!(keeper.stats.goals, 0);
}

#[test]
fn odd_player_rows_fall_back_to_defaults() {
    let rows = fixture_rows("players.json");
    let player = to_player_with_stats(&rows[2], &[], "2025");
    assert_eq!(player.id, 9);
    assert_eq!(player.number, 17);
    assert_eq!(player.position, Position::default());
    assert_eq!(player.age, 0);
    assert_eq!(player.stats.goals, 0);
}

#[test]
fn parses_matches_fixture() {
    let matches: Vec<_> = fixture_rows("matches.json").iter().map(to_match).collect();

    let win = &matches[0];
    assert_eq!(win.time, "10:00");
    assert_eq!(win.venue, Venue::Home);
    assert_eq!(win.result, Some(MatchResult::Win));
    assert_eq!(win.scoreline().as_deref(), Some("4-2"));
    assert!(win.played);

    let pending = &matches[1];
    assert!(!pending.played);
    assert_eq!(pending.venue, Venue::Away);
    assert_eq!(pending.goals_for, None);
    assert_eq!(pending.result, None);
    assert_eq!(pending.competition, "");
    assert_eq!(pending.scoreline(), None);

    assert_eq!(matches[2].time, "12:00");
}

#[test]
fn fixture_matches_aggregate_and_sort() {
    let mut matches: Vec<_> = fixture_rows("matches.json").iter().map(to_match).collect();

    let played: Vec<_> = matches.iter().filter(|m| m.played).cloned().collect();
    let stats = compute_stats(&played);
    assert_eq!(stats.total_games, 2);
    assert_eq!((stats.wins, stats.draws, stats.losses), (1, 0, 1));
    assert_eq!((stats.goals_for, stats.goals_against), (4, 4));
    assert_eq!(stats.goal_difference(), 0);
    assert_eq!(stats.win_percentage, 50);

    sort_matches(&mut matches);
    let ids: Vec<i64> = matches.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![12, 11, 13]);
}

#[test]
fn parses_token_fixture() {
    let session = parse_token_response(&read_fixture("token_response.json"), 0)
        .expect("fixture should parse");
    assert_eq!(session.email, "coach@club.test");
    assert_eq!(session.refresh_token, "r3fr3sh");
    assert_eq!(session.expires_at, 1_767_225_600);
    assert!(session.is_active_at(1_767_225_000));
    assert!(!session.is_active_at(1_767_225_600));
}
