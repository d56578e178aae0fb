use serde_json::{Map, Value, json};

use crate::model::{
    CallUp, CallUpStatus, Match, MatchInput, MatchResult, Player, PlayerInput, PlayerStats,
    Position, TeamInfo, Venue,
};

pub fn to_player(row: &Value) -> Player {
    Player {
        id: id_field(row, "id").unwrap_or_default(),
        number: u32_field(row, "number"),
        name: str_field(row, "name"),
        position: Position::from_wire(&str_field(row, "position")).unwrap_or_default(),
        age: u32_field(row, "age"),
        stats: PlayerStats::default(),
    }
}

pub fn to_player_stats(row: &Value) -> PlayerStats {
    PlayerStats {
        games_played: u32_field(row, "games_played"),
        goals: u32_field(row, "goals"),
        assists: u32_field(row, "assists"),
        yellow_cards: u32_field(row, "yellow_cards"),
        red_cards: u32_field(row, "red_cards"),
    }
}

/// Player row joined with its stats for `season`. Stats come from `stats_rows`
/// (a separate `player_stats` read) or from an embedded `player_stats` field,
/// which may be an array or a single object.
pub fn to_player_with_stats(row: &Value, stats_rows: &[Value], season: &str) -> Player {
    let mut player = to_player(row);
    let from_table = stats_rows.iter().find(|s| {
        id_field(s, "player_id") == Some(player.id) && str_field(s, "season") == season
    });
    let embedded = match row.get("player_stats") {
        Some(Value::Array(items)) => items.iter().find(|s| str_field(s, "season") == season),
        Some(obj @ Value::Object(_)) if str_field(obj, "season") == season => Some(obj),
        _ => None,
    };
    if let Some(stats) = from_table.or(embedded) {
        player.stats = to_player_stats(stats);
    }
    player
}

pub fn to_match(row: &Value) -> Match {
    let time = str_field(row, "time");
    Match {
        id: id_field(row, "id").unwrap_or_default(),
        date: str_field(row, "date"),
        // Postgres `time` columns come back as HH:MM:SS.
        time: time.chars().take(5).collect(),
        opponent: str_field(row, "opponent"),
        venue: Venue::from_wire(&str_field(row, "location")).unwrap_or_default(),
        competition: str_field(row, "competition"),
        goals_for: opt_u32_field(row, "goals_for"),
        goals_against: opt_u32_field(row, "goals_against"),
        result: MatchResult::from_wire(&str_field(row, "result")),
        played: bool_field(row, "played"),
    }
}

/// `None` (no team_info row yet) maps to an empty profile.
pub fn to_team_info(row: Option<&Value>) -> TeamInfo {
    let Some(row) = row else {
        return TeamInfo::default();
    };
    TeamInfo {
        id: id_field(row, "id"),
        name: str_field(row, "name"),
        founded: str_field(row, "founded"),
        stadium: str_field(row, "stadium"),
        city: str_field(row, "city"),
        description: str_field(row, "description"),
        president: str_field(row, "president"),
        coach: str_field(row, "coach"),
        logo_url: str_field(row, "logo_url"),
    }
}

/// Call-up rows reference players by id; rows whose player is no longer on
/// the roster are dropped.
pub fn to_call_up(row: &Value, roster: &[Player]) -> Option<CallUp> {
    let player_id = id_field(row, "player_id")?;
    let player = roster.iter().find(|p| p.id == player_id)?;
    Some(CallUp {
        player: player.clone(),
        match_id: id_field(row, "match_id").unwrap_or_default(),
        status: CallUpStatus::from_wire(&str_field(row, "status")).unwrap_or_default(),
    })
}

pub fn player_payload(input: &PlayerInput) -> Value {
    json!({
        "number": input.number,
        "name": input.name,
        "position": input.position.wire(),
        "age": input.age,
    })
}

pub fn player_stats_payload(player_id: i64, season: &str, stats: &PlayerStats) -> Value {
    json!({
        "player_id": player_id,
        "season": season,
        "games_played": stats.games_played,
        "goals": stats.goals,
        "assists": stats.assists,
        "yellow_cards": stats.yellow_cards,
        "red_cards": stats.red_cards,
    })
}

pub fn match_payload(input: &MatchInput) -> Value {
    let competition = input
        .competition
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    json!({
        "date": input.date,
        "time": input.time,
        "opponent": input.opponent,
        "location": input.venue.wire(),
        "competition": competition,
        "goals_for": input.goals_for,
        "goals_against": input.goals_against,
        "result": input.result.map(MatchResult::wire),
        "played": input.played,
    })
}

pub fn team_info_payload(info: &TeamInfo) -> Value {
    let mut map = Map::new();
    map.insert("name".into(), Value::from(info.name.clone()));
    map.insert("founded".into(), Value::from(info.founded.clone()));
    map.insert("stadium".into(), Value::from(info.stadium.clone()));
    map.insert("city".into(), Value::from(info.city.clone()));
    map.insert("description".into(), Value::from(info.description.clone()));
    map.insert("president".into(), Value::from(info.president.clone()));
    map.insert("coach".into(), Value::from(info.coach.clone()));
    let logo = if info.logo_url.trim().is_empty() {
        Value::Null
    } else {
        Value::from(info.logo_url.clone())
    };
    map.insert("logo_url".into(), logo);
    Value::Object(map)
}

pub fn call_up_payload(player_id: i64, match_id: i64, status: CallUpStatus) -> Value {
    json!({
        "player_id": player_id,
        "match_id": match_id,
        "status": status.wire(),
    })
}

pub fn str_field(row: &Value, key: &str) -> String {
    match row.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

pub fn opt_u32_field(row: &Value, key: &str) -> Option<u32> {
    match row.get(key)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

pub fn u32_field(row: &Value, key: &str) -> u32 {
    opt_u32_field(row, key).unwrap_or(0)
}

pub fn id_field(row: &Value, key: &str) -> Option<i64> {
    match row.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub fn bool_field(row: &Value, key: &str) -> bool {
    match row.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}
