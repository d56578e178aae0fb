use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use serde_json::{Map, Value, json};

use crate::backend::{Backend, BackendError, Query, UNIQUE_VIOLATION};

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<String, Vec<Value>>,
    next_id: HashMap<String, i64>,
    revision: i64,
}

/// In-process stand-in for the hosted database: same filter/order/upsert
/// semantics as the REST backend, plus unique constraints. Used by the test
/// suite and by demo mode.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
    unique: HashMap<String, Vec<Vec<String>>>,
    writes: AtomicUsize,
    reads: AtomicUsize,
}

impl MemoryBackend {
    /// Empty store with the club schema's unique constraints.
    pub fn new() -> Self {
        Self::default()
            .with_unique("players", &["number"])
            .with_unique("player_stats", &["player_id", "season"])
            .with_unique("callups", &["player_id", "match_id"])
    }

    pub fn with_unique(mut self, table: &str, columns: &[&str]) -> Self {
        self.unique
            .entry(table.to_string())
            .or_default()
            .push(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Insert rows directly, bypassing the write counter.
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        let mut tables = self.lock();
        for row in rows {
            let row = stamp(&mut tables, table, row);
            tables.rows.entry(table.to_string()).or_default().push(row);
        }
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock().rows.get(table).cloned().unwrap_or_default()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(AtomicOrdering::SeqCst)
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(AtomicOrdering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        // A panic while holding the lock leaves the tables usable.
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_unique(
        &self,
        tables: &Tables,
        table: &str,
        candidate: &Value,
        skip_id: Option<i64>,
    ) -> Result<(), BackendError> {
        let Some(constraints) = self.unique.get(table) else {
            return Ok(());
        };
        let rows = tables.rows.get(table).map(Vec::as_slice).unwrap_or(&[]);
        for columns in constraints {
            let clash = rows.iter().any(|row| {
                row_id(row) != skip_id
                    && columns
                        .iter()
                        .all(|c| loose_eq(row.get(c), candidate.get(c)) && !candidate[c].is_null())
            });
            if clash {
                return Err(BackendError::Http {
                    status: 409,
                    code: Some(UNIQUE_VIOLATION.to_string()),
                    message: format!(
                        "duplicate key value violates unique constraint \"{table}_{}_key\"",
                        columns.join("_")
                    ),
                });
            }
        }
        Ok(())
    }

    fn insert_locked(
        &self,
        tables: &mut Tables,
        table: &str,
        row: &Value,
    ) -> Result<Value, BackendError> {
        if !row.is_object() {
            return Err(BackendError::Http {
                status: 400,
                code: Some("PGRST102".to_string()),
                message: "row must be a JSON object".to_string(),
            });
        }
        self.check_unique(tables, table, row, None)?;
        let row = stamp(tables, table, row.clone());
        tables
            .rows
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    fn update_locked(
        &self,
        tables: &mut Tables,
        table: &str,
        id: i64,
        patch: &Value,
    ) -> Result<Value, BackendError> {
        let Some(pos) = tables
            .rows
            .get(table)
            .and_then(|rows| rows.iter().position(|r| row_id(r) == Some(id)))
        else {
            return Err(BackendError::NotFound(format!("{table} id {id}")));
        };
        let mut merged = tables.rows[table][pos].clone();
        merge_into(&mut merged, patch);
        self.check_unique(tables, table, &merged, Some(id))?;
        tables.revision += 1;
        merged["updated_at"] = Value::from(tables.revision);
        if let Some(rows) = tables.rows.get_mut(table) {
            rows[pos] = merged.clone();
        }
        Ok(merged)
    }
}

impl Backend for MemoryBackend {
    fn select(&self, query: &Query) -> Result<Vec<Value>, BackendError> {
        self.reads.fetch_add(1, AtomicOrdering::SeqCst);
        let tables = self.lock();
        let mut rows: Vec<Value> = tables
            .rows
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| {
                        query
                            .filters
                            .iter()
                            .all(|(col, value)| loose_eq(row.get(col), Some(value)))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        rows.sort_by(|a, b| {
            for (col, ascending) in &query.order {
                let ord = compare_values(a.get(col), b.get(col));
                let ord = if *ascending { ord } else { ord.reverse() };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows
            .into_iter()
            .map(|row| project(row, &query.columns))
            .collect())
    }

    fn insert(&self, table: &str, rows: &[Value]) -> Result<Vec<Value>, BackendError> {
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);
        let mut tables = self.lock();
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(self.insert_locked(&mut tables, table, row)?);
        }
        Ok(out)
    }

    fn update(&self, table: &str, id: i64, patch: &Value) -> Result<Value, BackendError> {
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);
        let mut tables = self.lock();
        self.update_locked(&mut tables, table, id, patch)
    }

    fn delete(&self, table: &str, id: i64) -> Result<(), BackendError> {
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);
        let mut tables = self.lock();
        if let Some(rows) = tables.rows.get_mut(table) {
            rows.retain(|r| row_id(r) != Some(id));
        }
        Ok(())
    }

    fn upsert(
        &self,
        table: &str,
        rows: &[Value],
        on_conflict: &[&str],
    ) -> Result<Vec<Value>, BackendError> {
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);
        let mut tables = self.lock();
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let existing = tables.rows.get(table).and_then(|stored| {
                stored.iter().find_map(|r| {
                    on_conflict
                        .iter()
                        .all(|c| loose_eq(r.get(*c), row.get(*c)))
                        .then(|| row_id(r))
                        .flatten()
                })
            });
            let saved = match existing {
                Some(id) => self.update_locked(&mut tables, table, id, row)?,
                None => self.insert_locked(&mut tables, table, row)?,
            };
            out.push(saved);
        }
        Ok(out)
    }
}

/// Demo club used when `CLUB_DEMO` is set.
pub fn demo_backend(season: &str) -> MemoryBackend {
    let backend = MemoryBackend::new();
    backend.seed(
        "team_info",
        vec![json!({
            "name": "Atlético Ribera",
            "founded": "1987",
            "stadium": "Campo Municipal La Ribera",
            "city": "Valdemar",
            "description": "Neighbourhood club playing in the Sunday amateur league.",
            "president": "Marta Ibáñez",
            "coach": "Julián Ferrer",
            "logo_url": null,
        })],
    );

    const ROSTER: [(u32, &str, &str, u32); 20] = [
        (1, "Diego Salas", "Portero", 29),
        (2, "Iván Prieto", "Defensa", 24),
        (3, "Raúl Campos", "Defensa", 27),
        (4, "Sergio Lema", "Defensa", 31),
        (5, "Tomás Vidal", "Defensa", 22),
        (6, "Hugo Navas", "Mediocampista", 26),
        (7, "Adrián Rey", "Delantero", 23),
        (8, "Pablo Ortega", "Mediocampista", 28),
        (9, "Mario Cuesta", "Delantero", 30),
        (10, "Álvaro Ruiz", "Mediocampista", 25),
        (11, "Nico Benítez", "Delantero", 21),
        (12, "Óscar Lago", "Portero", 34),
        (13, "Luis Arenas", "Defensa", 20),
        (14, "Gonzalo Paz", "Mediocampista", 27),
        (15, "Samuel Gil", "Defensa", 29),
        (16, "Marcos Peña", "Mediocampista", 24),
        (17, "Javier Soto", "Delantero", 26),
        (18, "Andrés Mora", "Mediocampista", 32),
        (19, "Bruno Casal", "Delantero", 19),
        (20, "Eloy Fuentes", "Defensa", 23),
    ];
    backend.seed(
        "players",
        ROSTER
            .iter()
            .map(|(number, name, position, age)| {
                json!({"number": number, "name": name, "position": position, "age": age})
            })
            .collect(),
    );
    backend.seed(
        "player_stats",
        ROSTER
            .iter()
            .enumerate()
            .map(|(idx, (number, _, position, _))| {
                let attacking = matches!(*position, "Delantero" | "Mediocampista");
                let player_id = idx as i64 + 1;
                let goals = if attacking { (number * 7) % 5 } else { 0 };
                let assists = if attacking { (number * 3) % 4 } else { number % 2 };
                json!({
                    "player_id": player_id,
                    "season": season,
                    "games_played": 6 - (number % 3),
                    "goals": goals,
                    "assists": assists,
                    "yellow_cards": number % 3,
                    "red_cards": u32::from(*number == 4),
                })
            })
            .collect(),
    );

    backend.seed(
        "matches",
        vec![
            demo_match("2025-02-02", "10:00:00", "CD Almenara", "Local", Some((3, 1)), "Victoria"),
            demo_match("2025-02-09", "11:30:00", "Racing Olivar", "Visitante", Some((1, 1)), "Empate"),
            demo_match("2025-02-16", "10:00:00", "UD Pinares", "Local", Some((2, 0)), "Victoria"),
            demo_match("2025-02-23", "12:00:00", "Sporting Vega", "Visitante", Some((0, 2)), "Derrota"),
            demo_match("2025-03-02", "10:00:00", "Atlético Sur", "Local", Some((4, 2)), "Victoria"),
            demo_match("2025-03-16", "10:00:00", "Unión Collado", "Local", None, ""),
            demo_match("2025-03-23", "11:00:00", "CD Almenara", "Visitante", None, ""),
        ],
    );
    backend
}

fn demo_match(
    date: &str,
    time: &str,
    opponent: &str,
    location: &str,
    score: Option<(u32, u32)>,
    result: &str,
) -> Value {
    let played = score.is_some();
    let result = if played { Value::from(result) } else { Value::Null };
    json!({
        "date": date,
        "time": time,
        "opponent": opponent,
        "location": location,
        "competition": "Liga Dominical",
        "goals_for": score.map(|s| s.0),
        "goals_against": score.map(|s| s.1),
        "result": result,
        "played": played,
    })
}

fn stamp(tables: &mut Tables, table: &str, mut row: Value) -> Value {
    let next = tables.next_id.entry(table.to_string()).or_insert(1);
    match row_id(&row) {
        Some(id) => *next = (*next).max(id + 1),
        None => {
            row["id"] = Value::from(*next);
            *next += 1;
        }
    }
    tables.revision += 1;
    row["updated_at"] = Value::from(tables.revision);
    row
}

fn row_id(row: &Value) -> Option<i64> {
    crate::rows::id_field(row, "id")
}

fn merge_into(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (k, v) in patch {
            if k != "id" {
                target.insert(k.clone(), v.clone());
            }
        }
    }
}

fn project(row: Value, columns: &str) -> Value {
    let columns = columns.trim();
    if columns.is_empty() || columns == "*" {
        return row;
    }
    let Value::Object(map) = row else {
        return row;
    };
    let wanted: Vec<&str> = columns.split(',').map(str::trim).collect();
    let projected: Map<String, Value> = map
        .into_iter()
        .filter(|(k, _)| wanted.contains(&k.as_str()))
        .collect();
    Value::Object(projected)
}

/// Equality the way PostgREST's `eq.` filter sees it: every value travels as
/// text, so `2025` matches `"2025"`.
fn loose_eq(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) if a == b => true,
        (Some(a), Some(b)) => match (as_text(a), as_text(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
        (None, Some(Value::Null)) | (Some(Value::Null), None) => true,
        _ => false,
    }
}

fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Postgres ordering with NULLS LAST for ascending sorts.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => as_text(x).cmp(&as_text(y)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_filters_orders_and_limits() {
        let backend = MemoryBackend::new();
        backend.seed(
            "matches",
            vec![
                json!({"date": "2025-03-02", "time": "12:00:00", "played": false}),
                json!({"date": "2025-03-02", "time": "09:00:00", "played": false}),
                json!({"date": "2025-01-01", "time": "09:00:00", "played": true}),
            ],
        );
        let rows = backend
            .select(
                &Query::table("matches")
                    .eq("played", false)
                    .order("date", true)
                    .order("time", true)
                    .limit(1),
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["time"], "09:00:00");
        assert_eq!(rows[0]["id"], 2);
    }

    #[test]
    fn unique_constraint_rejects_duplicates() {
        let backend = MemoryBackend::new();
        backend
            .insert("players", &[json!({"number": 7, "name": "A"})])
            .unwrap();
        let err = backend
            .insert("players", &[json!({"number": 7, "name": "B"})])
            .unwrap_err();
        assert!(err.is_unique_violation());
        assert!(err.to_string().contains("number"));
    }

    #[test]
    fn upsert_merges_on_conflict_columns() {
        let backend = MemoryBackend::new();
        let key = ["player_id", "match_id"];
        backend
            .upsert("callups", &[json!({"player_id": 1, "match_id": 2, "status": "Convocado"})], &key)
            .unwrap();
        backend
            .upsert("callups", &[json!({"player_id": 1, "match_id": 2, "status": "Lesionado"})], &key)
            .unwrap();
        let rows = backend.rows("callups");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["status"], "Lesionado");
    }

    #[test]
    fn projection_keeps_requested_columns() {
        let backend = MemoryBackend::new();
        backend.seed("matches", vec![json!({"result": "Empate", "opponent": "X"})]);
        let rows = backend
            .select(&Query::table("matches").columns("result, goals_for"))
            .unwrap();
        assert_eq!(rows[0], json!({"result": "Empate"}));
    }
}
