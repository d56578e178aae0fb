use serde_json::Value;

use crate::backend::{Backend, BackendError, Query, select_one};
use crate::callups::{CallUpPlan, merge_order, plan_call_ups};
use crate::model::{
    CallUp, CallUpStatus, Match, MatchInput, Player, PlayerInput, PlayerStats, TeamInfo,
    TeamStats,
};
use crate::rows::{
    call_up_payload, id_field, match_payload, player_payload, player_stats_payload,
    team_info_payload, to_call_up, to_match, to_player, to_player_stats, to_player_with_stats,
    to_team_info,
};
use crate::stats::compute_stats;

const PLAYERS: &str = "players";
const PLAYER_STATS: &str = "player_stats";
const MATCHES: &str = "matches";
const CALLUPS: &str = "callups";
const TEAM_INFO: &str = "team_info";

const DUPLICATE_NUMBER: &str =
    "A player with this number already exists. Please choose a different number.";

/// Everything the public view shows, read in one go.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    pub team_info: TeamInfo,
    pub stats: TeamStats,
    pub next_match: Option<Match>,
    pub last_matches: Vec<Match>,
    pub roster: Vec<Player>,
    pub call_ups: Vec<CallUp>,
}

/// Call-up list for the next match, after reconciliation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallUpBoard {
    pub next_match: Option<Match>,
    pub entries: Vec<CallUp>,
    /// Rows created by this reconciliation.
    pub created: usize,
}

/// Data-access layer over an explicitly passed backend handle.
pub struct ClubDb<'a> {
    backend: &'a dyn Backend,
    season: String,
    squad_size: usize,
}

impl<'a> ClubDb<'a> {
    pub fn new(backend: &'a dyn Backend, season: &str, squad_size: usize) -> Self {
        Self {
            backend,
            season: season.to_string(),
            squad_size,
        }
    }

    pub fn season(&self) -> &str {
        &self.season
    }

    /// Roster ordered by jersey number, with current-season stats.
    pub fn players(&self) -> Result<Vec<Player>, BackendError> {
        let rows = self
            .backend
            .select(&Query::table(PLAYERS).order("number", true))?;
        let stats = self
            .backend
            .select(&Query::table(PLAYER_STATS).eq("season", self.season.as_str()))?;
        Ok(rows
            .iter()
            .map(|row| to_player_with_stats(row, &stats, &self.season))
            .collect())
    }

    /// All matches, most recent date first.
    pub fn matches(&self) -> Result<Vec<Match>, BackendError> {
        let rows = self
            .backend
            .select(&Query::table(MATCHES).order("date", false))?;
        Ok(rows.iter().map(to_match).collect())
    }

    pub fn last_matches(&self, limit: usize) -> Result<Vec<Match>, BackendError> {
        let rows = self.backend.select(
            &Query::table(MATCHES)
                .eq("played", true)
                .order("date", false)
                .limit(limit),
        )?;
        Ok(rows.iter().map(to_match).collect())
    }

    /// Earliest unplayed match by date then kick-off time.
    pub fn next_match(&self) -> Result<Option<Match>, BackendError> {
        let row = select_one(
            self.backend,
            Query::table(MATCHES)
                .eq("played", false)
                .order("date", true)
                .order("time", true),
        )?;
        Ok(row.as_ref().map(to_match))
    }

    pub fn team_stats(&self) -> Result<TeamStats, BackendError> {
        let rows = self.backend.select(
            &Query::table(MATCHES)
                .columns("result, goals_for, goals_against, played")
                .eq("played", true),
        )?;
        let played: Vec<Match> = rows.iter().map(to_match).collect();
        Ok(compute_stats(&played))
    }

    pub fn create_match(&self, input: &MatchInput) -> Result<Match, BackendError> {
        let rows = self.backend.insert(MATCHES, &[match_payload(input)])?;
        first_row(rows, MATCHES).map(|row| to_match(&row))
    }

    pub fn update_match(&self, id: i64, input: &MatchInput) -> Result<Match, BackendError> {
        let row = self.backend.update(MATCHES, id, &match_payload(input))?;
        Ok(to_match(&row))
    }

    pub fn delete_match(&self, id: i64) -> Result<(), BackendError> {
        self.backend.delete(MATCHES, id)
    }

    /// Stored call-ups for the next match (read only), ordered by player id.
    pub fn call_ups(&self) -> Result<Vec<CallUp>, BackendError> {
        let next = self.next_match()?;
        let roster = self.players()?;
        self.call_ups_for(next.as_ref(), &roster)
    }

    pub fn call_ups_for(
        &self,
        next_match: Option<&Match>,
        roster: &[Player],
    ) -> Result<Vec<CallUp>, BackendError> {
        let Some(next) = next_match else {
            return Ok(Vec::new());
        };
        let rows = self.backend.select(
            &Query::table(CALLUPS)
                .eq("match_id", next.id)
                .order("player_id", true),
        )?;
        Ok(rows.iter().filter_map(|row| to_call_up(row, roster)).collect())
    }

    /// Makes sure every roster member has a call-up row for the next match.
    /// A match without any rows is seeded with the first `squad_size`
    /// players by jersey number; later signings are appended as Called.
    pub fn reconcile_call_ups(&self) -> Result<CallUpBoard, BackendError> {
        let next = self.next_match()?;
        let roster = self.players()?;
        self.reconcile_for(next, &roster)
    }

    pub fn reconcile_for(
        &self,
        next_match: Option<Match>,
        roster: &[Player],
    ) -> Result<CallUpBoard, BackendError> {
        let existing = self.call_ups_for(next_match.as_ref(), roster)?;
        let plan = plan_call_ups(next_match.as_ref(), &existing, roster, self.squad_size);
        let Some(next) = next_match else {
            return Ok(CallUpBoard::default());
        };

        let (entries, created) = match plan {
            CallUpPlan::NoMatch => (Vec::new(), 0),
            CallUpPlan::Unchanged => (existing, 0),
            CallUpPlan::Seed(ids) | CallUpPlan::AddMissing(ids) => {
                let created = self.create_initial_call_ups(next.id, &ids)?;
                let fetched = self.call_ups_for(Some(&next), roster)?;
                (merge_order(fetched, &existing), created)
            }
        };
        Ok(CallUpBoard {
            next_match: Some(next),
            entries,
            created,
        })
    }

    pub fn update_call_up_status(
        &self,
        player_id: i64,
        match_id: i64,
        status: CallUpStatus,
    ) -> Result<CallUpStatus, BackendError> {
        let rows = self.backend.upsert(
            CALLUPS,
            &[call_up_payload(player_id, match_id, status)],
            &["player_id", "match_id"],
        )?;
        let row = first_row(rows, CALLUPS)?;
        Ok(CallUpStatus::from_wire(&crate::rows::str_field(&row, "status")).unwrap_or(status))
    }

    /// Upserts Called rows for `player_ids`; returns how many rows came back.
    pub fn create_initial_call_ups(
        &self,
        match_id: i64,
        player_ids: &[i64],
    ) -> Result<usize, BackendError> {
        if player_ids.is_empty() {
            return Ok(0);
        }
        let rows: Vec<Value> = player_ids
            .iter()
            .map(|id| call_up_payload(*id, match_id, CallUpStatus::Called))
            .collect();
        let written = self
            .backend
            .upsert(CALLUPS, &rows, &["player_id", "match_id"])?;
        Ok(written.len())
    }

    /// Most recently updated profile row; an empty profile when none exists.
    pub fn team_info(&self) -> Result<TeamInfo, BackendError> {
        let row = select_one(
            self.backend,
            Query::table(TEAM_INFO).order("updated_at", false),
        )?;
        Ok(to_team_info(row.as_ref()))
    }

    /// Full-record update. Without a known id the first existing row is
    /// targeted; with no row at all one is created.
    pub fn update_team_info(&self, info: &TeamInfo) -> Result<TeamInfo, BackendError> {
        let payload = team_info_payload(info);
        let target = match info.id {
            Some(id) => Some(id),
            None => select_one(self.backend, Query::table(TEAM_INFO).columns("id"))?
                .and_then(|row| id_field(&row, "id")),
        };
        let row = match target {
            Some(id) => self.backend.update(TEAM_INFO, id, &payload)?,
            None => first_row(self.backend.insert(TEAM_INFO, &[payload])?, TEAM_INFO)?,
        };
        Ok(to_team_info(Some(&row)))
    }

    pub fn create_player(&self, input: &PlayerInput) -> Result<Player, BackendError> {
        let rows = self
            .backend
            .insert(PLAYERS, &[player_payload(input)])
            .map_err(friendly_player_error)?;
        first_row(rows, PLAYERS).map(|row| to_player(&row))
    }

    pub fn update_player(&self, id: i64, input: &PlayerInput) -> Result<Player, BackendError> {
        let row = self
            .backend
            .update(PLAYERS, id, &player_payload(input))
            .map_err(friendly_player_error)?;
        let stats = self.backend.select(
            &Query::table(PLAYER_STATS)
                .eq("player_id", id)
                .eq("season", self.season.as_str()),
        )?;
        Ok(to_player_with_stats(&row, &stats, &self.season))
    }

    pub fn delete_player(&self, id: i64) -> Result<(), BackendError> {
        self.backend.delete(PLAYERS, id)
    }

    /// Upserts the current season's stats keyed by (player_id, season).
    pub fn update_player_stats(
        &self,
        player_id: i64,
        stats: &PlayerStats,
    ) -> Result<PlayerStats, BackendError> {
        let rows = self.backend.upsert(
            PLAYER_STATS,
            &[player_stats_payload(player_id, &self.season, stats)],
            &["player_id", "season"],
        )?;
        first_row(rows, PLAYER_STATS).map(|row| to_player_stats(&row))
    }

    /// Public view: the independent reads run in parallel, the call-up list
    /// follows once the next match and roster are known.
    pub fn dashboard(&self, last_n: usize) -> Result<Dashboard, BackendError> {
        let ((team_info, stats), ((next_match, last_matches), roster)) = rayon::join(
            || rayon::join(|| self.team_info(), || self.team_stats()),
            || {
                rayon::join(
                    || rayon::join(|| self.next_match(), || self.last_matches(last_n)),
                    || self.players(),
                )
            },
        );
        let next_match = next_match?;
        let roster = roster?;
        let call_ups = self.call_ups_for(next_match.as_ref(), &roster)?;
        Ok(Dashboard {
            team_info: team_info?,
            stats: stats?,
            next_match,
            last_matches: last_matches?,
            roster,
            call_ups,
        })
    }
}

fn first_row(rows: Vec<Value>, table: &str) -> Result<Value, BackendError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| BackendError::Decode(format!("{table}: no row returned")))
}

fn friendly_player_error(err: BackendError) -> BackendError {
    match err {
        BackendError::Http {
            status,
            code,
            message,
        } if code.as_deref() == Some(crate::backend::UNIQUE_VIOLATION)
            && message.contains("number") =>
        {
            BackendError::Http {
                status,
                code,
                message: DUPLICATE_NUMBER.to_string(),
            }
        }
        other => other,
    }
}
