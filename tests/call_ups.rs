use std::collections::BTreeSet;

use club_dashboard::db::ClubDb;
use club_dashboard::forms::{CrudView, PlayerDraft};
use club_dashboard::memory::MemoryBackend;
use club_dashboard::model::{CallUpStatus, PlayerInput, Position};
use serde_json::json;

fn club(numbers: impl DoubleEndedIterator<Item = u32>) -> MemoryBackend {
    let backend = MemoryBackend::new();
    // Reverse insertion so ids and jersey numbers disagree.
    backend.seed(
        "players",
        numbers
            .rev()
            .map(|n| json!({"number": n, "name": format!("Player {n}"), "position": "Defensa", "age": 22}))
            .collect(),
    );
    backend.seed(
        "matches",
        vec![
            json!({
                "date": "2025-03-02", "time": "10:00:00", "opponent": "Atlético Sur",
                "location": "Local", "goals_for": 2, "goals_against": 1,
                "result": "Victoria", "played": true,
            }),
            json!({
                "date": "2025-04-06", "time": "10:00:00", "opponent": "CD Norte",
                "location": "Visitante", "goals_for": null, "goals_against": null,
                "result": null, "played": false,
            }),
        ],
    );
    backend
}

#[test]
fn first_reconcile_calls_up_lowest_numbers() {
    let backend = club(1..=20);
    let db = ClubDb::new(&backend, "2025", 18);

    let board = db.reconcile_call_ups().expect("reconcile should succeed");
    assert_eq!(board.created, 18);
    assert_eq!(board.entries.len(), 18);
    assert_eq!(board.next_match.as_ref().map(|m| m.opponent.as_str()), Some("CD Norte"));
    let numbers: BTreeSet<u32> = board.entries.iter().map(|c| c.player.number).collect();
    assert_eq!(numbers, (1..=18).collect());
    assert!(board.entries.iter().all(|c| c.status == CallUpStatus::Called));
    assert_eq!(backend.rows("callups").len(), 18);
}

#[test]
fn late_signing_is_appended_and_statuses_survive() {
    let backend = club(1..=18);
    let db = ClubDb::new(&backend, "2025", 18);
    let first = db.reconcile_call_ups().unwrap();
    assert_eq!(first.created, 18);

    let injured = first.entries[0].player.id;
    let match_id = first.entries[0].match_id;
    db.update_call_up_status(injured, match_id, CallUpStatus::Injured)
        .unwrap();
    let signing = db
        .create_player(&PlayerInput {
            number: 21,
            name: "Bruno Casal".to_string(),
            position: Position::Forward,
            age: 19,
        })
        .unwrap();

    let second = db.reconcile_call_ups().unwrap();
    assert_eq!(second.created, 1);
    assert_eq!(second.entries.len(), 19);
    let last = second.entries.last().unwrap();
    assert_eq!(last.player.id, signing.id);
    assert_eq!(last.status, CallUpStatus::Called);
    let kept = second
        .entries
        .iter()
        .find(|c| c.player.id == injured)
        .unwrap();
    assert_eq!(kept.status, CallUpStatus::Injured);
    let before: BTreeSet<i64> = first.entries.iter().map(|c| c.player.id).collect();
    let after: BTreeSet<i64> = second.entries[..18].iter().map(|c| c.player.id).collect();
    assert_eq!(before, after);
}

#[test]
fn reconcile_without_next_match_writes_nothing() {
    let backend = MemoryBackend::new();
    backend.seed(
        "players",
        vec![json!({"number": 1, "name": "Solo", "position": "Portero", "age": 30})],
    );
    let db = ClubDb::new(&backend, "2025", 18);
    let board = db.reconcile_call_ups().unwrap();
    assert!(board.next_match.is_none());
    assert!(board.entries.is_empty());
    assert_eq!(backend.write_count(), 0);
}

#[test]
fn stable_roster_reconciles_without_writes() {
    let backend = club(1..=5);
    let db = ClubDb::new(&backend, "2025", 18);
    db.reconcile_call_ups().unwrap();
    let writes = backend.write_count();
    let again = db.reconcile_call_ups().unwrap();
    assert_eq!(again.created, 0);
    assert_eq!(again.entries.len(), 5);
    assert_eq!(backend.write_count(), writes);
}

#[test]
fn public_dashboard_reads_call_ups_without_creating_them() {
    let backend = club(1..=20);
    let db = ClubDb::new(&backend, "2025", 18);
    let dashboard = db.dashboard(8).unwrap();
    assert!(dashboard.call_ups.is_empty());
    assert_eq!(dashboard.roster.len(), 20);
    assert_eq!(dashboard.roster[0].number, 1);
    assert_eq!(dashboard.stats.wins, 1);
    assert_eq!(dashboard.last_matches.len(), 1);
    assert_eq!(backend.write_count(), 0);

    db.reconcile_call_ups().unwrap();
    let dashboard = db.dashboard(8).unwrap();
    assert_eq!(dashboard.call_ups.len(), 18);
}

#[test]
fn duplicate_jersey_is_rejected_before_any_write() {
    let backend = club(1..=3);
    let db = ClubDb::new(&backend, "2025", 18);
    let mut view: CrudView<PlayerDraft> = CrudView::default();
    view.set_items(db.players().unwrap());
    view.open_create();
    view.form.draft = PlayerDraft {
        number: "2".to_string(),
        name: "Nuevo".to_string(),
        position: Position::Defender,
        age: "20".to_string(),
    };

    let writes = backend.write_count();
    assert!(view.submit().is_none());
    assert!(
        view.form
            .inline_error
            .as_deref()
            .is_some_and(|e| e.contains("already taken"))
    );
    assert_eq!(backend.write_count(), writes);
}
