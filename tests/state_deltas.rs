use club_dashboard::auth::{Route, Session};
use club_dashboard::db::{CallUpBoard, Dashboard};
use club_dashboard::forms::{FormPhase, NoticeKind, Submission};
use club_dashboard::model::{CallUp, CallUpStatus, Match, Player, Position, TeamInfo};
use club_dashboard::state::{
    AdminTab, AppState, Delta, LoadState, ProviderCommand, WriteTarget, apply_delta,
};
use chrono::Utc;

fn session() -> Session {
    Session {
        access_token: "token".to_string(),
        refresh_token: String::new(),
        expires_at: Utc::now().timestamp() + 3600,
        email: "coach@club.test".to_string(),
    }
}

fn player(id: i64, number: u32) -> Player {
    Player {
        id,
        number,
        name: format!("Player {number}"),
        position: Position::Defender,
        age: 24,
        ..Player::default()
    }
}

fn fixture(id: i64, date: &str, played: bool) -> Match {
    Match {
        id,
        date: date.to_string(),
        time: "10:00".to_string(),
        opponent: format!("Rival {id}"),
        played,
        ..Match::default()
    }
}

fn admin_state() -> AppState {
    let mut state = AppState::new(Some(session()));
    state.navigate(Route::Admin, Utc::now().timestamp());
    apply_delta(
        &mut state,
        Delta::AdminLoaded {
            players: vec![player(2, 9), player(1, 4)],
            matches: vec![
                fixture(1, "2025-02-02", true),
                fixture(2, "2025-03-16", false),
                fixture(3, "2025-03-02", true),
            ],
            team_info: TeamInfo {
                id: Some(1),
                name: "CD Norte".to_string(),
                ..TeamInfo::default()
            },
        },
    );
    state.take_follow_ups();
    state
}

#[test]
fn admin_without_session_lands_on_login() {
    let mut state = AppState::new(None);
    let landed = state.navigate(Route::Admin, Utc::now().timestamp());
    assert_eq!(landed, Route::Login);
    assert_eq!(state.screen, Route::Login);
    assert!(
        state
            .take_follow_ups()
            .iter()
            .all(|cmd| !matches!(cmd, ProviderCommand::LoadAdmin))
    );
}

#[test]
fn sign_in_opens_admin_and_loads_it() {
    let mut state = AppState::new(None);
    state.navigate(Route::Login, Utc::now().timestamp());
    state.login.busy = true;
    apply_delta(&mut state, Delta::SignedIn(session()));
    assert_eq!(state.screen, Route::Admin);
    assert!(!state.login.busy);
    assert!(state.admin_loaded.is_loading());
    assert!(
        state
            .take_follow_ups()
            .iter()
            .any(|cmd| matches!(cmd, ProviderCommand::LoadAdmin))
    );
}

#[test]
fn failed_sign_in_keeps_user_on_login() {
    let mut state = AppState::new(None);
    state.navigate(Route::Login, Utc::now().timestamp());
    state.login.email = "coach@club.test".to_string();
    state.login.password = "wrong".to_string();
    state.login.busy = true;
    apply_delta(
        &mut state,
        Delta::SignInFailed("Invalid login credentials".to_string()),
    );
    assert_eq!(state.screen, Route::Login);
    assert!(state.login.password.is_empty());
    assert_eq!(state.login.email, "coach@club.test");
    assert_eq!(
        state.login.error.as_deref(),
        Some("Invalid login credentials")
    );
}

#[test]
fn admin_lists_are_sorted_on_load() {
    let state = admin_state();
    let numbers: Vec<u32> = state.players.items.iter().map(|p| p.number).collect();
    assert_eq!(numbers, vec![4, 9]);
    let ids: Vec<i64> = state.matches.items.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![2, 3, 1]);
    assert_eq!(state.admin_loaded, LoadState::Ready(()));
}

#[test]
fn saved_player_is_spliced_in_and_marks_dashboard_stale() {
    let mut state = admin_state();
    state.players.open_create();
    state.players.form.draft.number = "1".to_string();
    state.players.form.draft.name = "Diego Salas".to_string();
    state.players.form.draft.age = "29".to_string();
    assert!(matches!(state.players.submit(), Some(Submission::Create(_))));

    apply_delta(&mut state, Delta::PlayerSaved(player(7, 1)));
    assert_eq!(state.players.items[0].id, 7);
    assert_eq!(state.players.selected, 0);
    assert!(!state.players.form.is_open());
    assert!(state.dashboard_stale);
    let notice = state.players.notice.as_ref().unwrap();
    assert_eq!(notice.kind, NoticeKind::Success);
    assert_eq!(notice.title, "Player added");
}

#[test]
fn rejected_write_keeps_the_draft() {
    let mut state = admin_state();
    assert!(state.players.open_edit(2));
    state.players.form.draft.name = "Renamed".to_string();
    assert!(state.players.submit().is_some());

    apply_delta(
        &mut state,
        Delta::WriteFailed {
            target: WriteTarget::Player,
            message: "A player with this number already exists.".to_string(),
        },
    );
    assert!(matches!(state.players.form.phase, FormPhase::Error(_)));
    assert_eq!(state.players.form.draft.name, "Renamed");
    assert_eq!(
        state.players.notice.as_ref().map(|n| n.kind),
        Some(NoticeKind::Failure)
    );
    assert_eq!(state.players.items[1].name, "Player 9");
}

#[test]
fn deleting_a_match_removes_it_locally() {
    let mut state = admin_state();
    state.set_admin_tab(AdminTab::Matches);
    state.matches.select_next();
    state.matches.request_delete();
    let id = state.matches.confirm_delete().unwrap();
    assert_eq!(id, 3);
    assert!(state.matches.confirm_delete().is_none());

    apply_delta(&mut state, Delta::MatchDeleted(id));
    assert!(state.matches.items.iter().all(|m| m.id != 3));
    assert!(!state.matches.deleting);
}

#[test]
fn opening_call_ups_tab_requests_reconciliation() {
    let mut state = admin_state();
    state.set_admin_tab(AdminTab::CallUps);
    let cmds = state.take_follow_ups();
    assert!(matches!(cmds.as_slice(), [ProviderCommand::ReconcileCallUps]));

    let next = fixture(2, "2025-03-16", false);
    let entries = vec![
        CallUp {
            player: player(1, 4),
            match_id: 2,
            status: CallUpStatus::Called,
        },
        CallUp {
            player: player(2, 9),
            match_id: 2,
            status: CallUpStatus::Called,
        },
    ];
    apply_delta(
        &mut state,
        Delta::CallUpsLoaded(CallUpBoard {
            next_match: Some(next),
            entries,
            created: 2,
        }),
    );
    assert_eq!(state.call_ups.entries.len(), 2);
    assert!(state.dashboard_stale);

    state.call_ups.select_next();
    let change = state.call_ups.change_selected(true).unwrap();
    assert_eq!(change.player_id, 2);
    assert_eq!(change.status, CallUpStatus::Injured);
    // One write at a time.
    assert!(state.call_ups.change_selected(true).is_none());

    apply_delta(
        &mut state,
        Delta::CallUpStatusSet {
            player_id: 2,
            status: CallUpStatus::Injured,
        },
    );
    assert_eq!(state.call_ups.entries[1].status, CallUpStatus::Injured);
    assert!(state.call_ups.saving.is_none());
}

#[test]
fn stale_dashboard_reloads_when_returning_to_public() {
    let mut state = admin_state();
    apply_delta(
        &mut state,
        Delta::DashboardLoaded(Dashboard::default()),
    );
    state.dashboard_stale = true;
    state.navigate(Route::Public, Utc::now().timestamp());
    assert!(state.dashboard.is_loading());
    assert!(
        state
            .take_follow_ups()
            .iter()
            .any(|cmd| matches!(cmd, ProviderCommand::LoadDashboard))
    );
}

#[test]
fn sign_out_returns_to_public() {
    let mut state = admin_state();
    apply_delta(&mut state, Delta::SignedOut);
    assert!(state.session.is_none());
    assert_eq!(state.screen, Route::Public);
    assert_eq!(state.admin_loaded, LoadState::Idle);
    assert_eq!(state.navigate(Route::Admin, Utc::now().timestamp()), Route::Login);
}

#[test]
fn stats_form_submits_an_update_for_the_selected_player() {
    let mut state = admin_state();
    assert!(state.open_stats_form());
    state.stats_form.draft.goals = "5".to_string();
    let cmd = state.submit_stats();
    assert!(matches!(
        cmd,
        Some(ProviderCommand::SavePlayerStats { player_id: 1, ref stats }) if stats.goals == 5
    ));

    let stats = club_dashboard::model::PlayerStats {
        goals: 5,
        ..Default::default()
    };
    apply_delta(&mut state, Delta::PlayerStatsSaved { player_id: 1, stats });
    assert_eq!(state.players.items[0].stats.goals, 5);
    assert!(!state.stats_form.is_open());
}

#[test]
fn failed_call_up_load_replaces_the_board_with_an_error() {
    let mut state = admin_state();
    state.set_admin_tab(AdminTab::CallUps);
    state.take_follow_ups();
    apply_delta(
        &mut state,
        Delta::CallUpsLoaded(CallUpBoard {
            next_match: Some(fixture(2, "2025-03-16", false)),
            entries: vec![CallUp {
                player: player(1, 4),
                match_id: 2,
                status: CallUpStatus::Called,
            }],
            created: 0,
        }),
    );

    apply_delta(
        &mut state,
        Delta::CallUpsFailed("connection refused".to_string()),
    );
    assert!(state.call_ups.entries.is_empty());
    assert!(state.call_ups.next_match.is_none());
    assert_eq!(
        state.call_ups.load_error.as_deref(),
        Some("connection refused")
    );
    assert!(state.call_ups.change_selected(true).is_none());
    assert!(state.call_ups.notice.is_none());

    // Retrying re-runs reconciliation and a good board clears the error.
    state.set_admin_tab(AdminTab::CallUps);
    assert!(matches!(
        state.take_follow_ups().as_slice(),
        [ProviderCommand::ReconcileCallUps]
    ));
    apply_delta(
        &mut state,
        Delta::CallUpsLoaded(CallUpBoard {
            next_match: Some(fixture(2, "2025-03-16", false)),
            entries: vec![CallUp {
                player: player(1, 4),
                match_id: 2,
                status: CallUpStatus::Called,
            }],
            created: 0,
        }),
    );
    assert!(state.call_ups.load_error.is_none());
    assert!(state.call_ups.change_selected(true).is_some());
}

#[test]
fn board_refresh_does_not_unlock_a_pending_status_write() {
    let mut state = admin_state();
    let board = CallUpBoard {
        next_match: Some(fixture(2, "2025-03-16", false)),
        entries: vec![CallUp {
            player: player(1, 4),
            match_id: 2,
            status: CallUpStatus::Called,
        }],
        created: 0,
    };
    apply_delta(&mut state, Delta::CallUpsLoaded(board.clone()));
    assert!(state.call_ups.change_selected(true).is_some());

    apply_delta(&mut state, Delta::CallUpsLoaded(board));
    assert_eq!(state.call_ups.saving, Some(1));
    assert!(state.call_ups.change_selected(true).is_none());
}
