use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use club_dashboard::auth::{DemoAuth, Session};
use club_dashboard::config::Config;
use club_dashboard::forms::{Submission, TeamInfoInput};
use club_dashboard::memory::{MemoryBackend, demo_backend};
use club_dashboard::model::{PlayerInput, Position, TeamInfo};
use club_dashboard::persist;
use club_dashboard::provider::{Services, handle_command};
use club_dashboard::state::{Delta, ProviderCommand, WriteTarget};
use club_dashboard::storage::{MemoryAssets, logo_storage_path};

fn demo_config() -> Config {
    Config::from_lookup(|key| (key == "CLUB_DEMO").then(|| "1".to_string()))
        .expect("demo config needs no credentials")
}

/// Demo services whose backend and bucket stay inspectable.
fn services(session_path: Option<std::path::PathBuf>) -> (Services, Arc<MemoryBackend>, Arc<MemoryAssets>) {
    let config = demo_config();
    let backend = Arc::new(demo_backend(&config.season));
    let assets = Arc::new(MemoryAssets::new());
    let services = Services {
        backend: Box::new(Arc::clone(&backend)),
        auth: Box::new(DemoAuth::new()),
        assets: Box::new(Arc::clone(&assets)),
        config,
        session_path,
    };
    (services, backend, assets)
}

fn single(mut deltas: Vec<Delta>) -> Delta {
    deltas.retain(|d| !matches!(d, Delta::Log(_)));
    assert_eq!(deltas.len(), 1, "expected one delta, got {deltas:?}");
    deltas.remove(0)
}

fn logo_file(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(b"\x89PNG\r\n\x1a\nfake").unwrap();
    path
}

#[test]
fn demo_dashboard_loads() {
    let svc = Services::demo(demo_config(), None);
    let Delta::DashboardLoaded(dashboard) = single(handle_command(&svc, ProviderCommand::LoadDashboard))
    else {
        panic!("dashboard should load");
    };
    assert_eq!(dashboard.team_info.name, "Atlético Ribera");
    assert_eq!(dashboard.roster.len(), 20);
    assert_eq!(dashboard.stats.total_games, 5);
    assert_eq!(
        (dashboard.stats.wins, dashboard.stats.draws, dashboard.stats.losses),
        (3, 1, 1)
    );
    assert_eq!((dashboard.stats.goals_for, dashboard.stats.goals_against), (10, 6));
    assert_eq!(dashboard.stats.win_percentage, 60);
    assert_eq!(
        dashboard.next_match.map(|m| m.opponent),
        Some("Unión Collado".to_string())
    );
    assert_eq!(dashboard.last_matches.first().map(|m| m.date.as_str()), Some("2025-03-02"));
    assert!(dashboard.call_ups.is_empty());
}

#[test]
fn sign_in_persists_and_sign_out_clears_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("club").join("session.json");
    let (svc, _, _) = services(Some(path.clone()));

    let failed = single(handle_command(
        &svc,
        ProviderCommand::SignIn {
            email: DemoAuth::EMAIL.to_string(),
            password: "nope".to_string(),
        },
    ));
    assert!(matches!(failed, Delta::SignInFailed(ref m) if m == "Invalid login credentials"));
    assert!(!path.exists());

    let Delta::SignedIn(session) = single(handle_command(
        &svc,
        ProviderCommand::SignIn {
            email: DemoAuth::EMAIL.to_string(),
            password: DemoAuth::PASSWORD.to_string(),
        },
    )) else {
        panic!("demo credentials should sign in");
    };
    let stored: Session = persist::load_session_from(&path).expect("session file written");
    assert_eq!(stored, session);
    assert!(stored.is_active());

    let out = single(handle_command(&svc, ProviderCommand::SignOut(session)));
    assert!(matches!(out, Delta::SignedOut));
    assert!(persist::load_session_from(&path).is_none());
}

#[test]
fn reconcile_then_status_change_reaches_public_view() {
    let (svc, backend, _) = services(None);
    let Delta::CallUpsLoaded(board) = single(handle_command(&svc, ProviderCommand::ReconcileCallUps))
    else {
        panic!("call-ups should load");
    };
    assert_eq!(board.created, 18);
    assert_eq!(backend.rows("callups").len(), 18);

    let entry = &board.entries[0];
    let change = club_dashboard::forms::StatusChange {
        player_id: entry.player.id,
        match_id: entry.match_id,
        status: entry.status.next(),
    };
    let out = single(handle_command(&svc, ProviderCommand::SetCallUpStatus(change)));
    assert!(matches!(out, Delta::CallUpStatusSet { status, .. } if status == change.status));

    let Delta::DashboardLoaded(dashboard) = single(handle_command(&svc, ProviderCommand::LoadDashboard))
    else {
        panic!("dashboard should load");
    };
    assert_eq!(dashboard.call_ups.len(), 18);
    let shown = dashboard
        .call_ups
        .iter()
        .find(|c| c.player.id == change.player_id)
        .unwrap();
    assert_eq!(shown.status, change.status);
}

#[test]
fn duplicate_number_from_backend_is_reported_verbatim() {
    let (svc, _, _) = services(None);
    let out = single(handle_command(
        &svc,
        ProviderCommand::SavePlayer(Submission::Create(PlayerInput {
            number: 10,
            name: "Otro Diez".to_string(),
            position: Position::Midfielder,
            age: 21,
        })),
    ));
    match out {
        Delta::WriteFailed { target, message } => {
            assert_eq!(target, WriteTarget::Player);
            assert!(message.starts_with("A player with this number already exists"));
        }
        other => panic!("expected a write failure, got {other:?}"),
    }
}

#[test]
fn replacing_the_logo_removes_the_old_asset() {
    let dir = tempfile::tempdir().unwrap();
    let (svc, _, assets) = services(None);
    let team = svc.db().team_info().unwrap();

    let save = |info: TeamInfo, file: Option<std::path::PathBuf>, remove: bool| {
        single(handle_command(
            &svc,
            ProviderCommand::SaveTeamInfo(TeamInfoInput {
                info,
                logo_file: file,
                remove_logo: remove,
            }),
        ))
    };

    let Delta::TeamInfoSaved(first) = save(team, Some(logo_file(&dir, "crest.png")), false) else {
        panic!("first logo should save");
    };
    assert!(first.logo_url.starts_with(MemoryAssets::BASE_URL));
    let first_path = logo_storage_path(&first.logo_url).unwrap();
    assert_eq!(assets.paths(), vec![first_path.clone()]);

    // Object names carry a millisecond stamp.
    thread::sleep(Duration::from_millis(5));
    let Delta::TeamInfoSaved(second) = save(first.clone(), Some(logo_file(&dir, "crest2.PNG")), false)
    else {
        panic!("replacement logo should save");
    };
    assert_ne!(second.logo_url, first.logo_url);
    let paths = assets.paths();
    assert_eq!(paths.len(), 1);
    assert_ne!(paths[0], first_path);

    let Delta::TeamInfoSaved(cleared) = save(second, None, true) else {
        panic!("logo removal should save");
    };
    assert!(cleared.logo_url.is_empty());
    assert!(assets.paths().is_empty());
    assert_eq!(svc.db().team_info().unwrap().logo_url, "");
}

#[test]
fn non_image_logo_is_rejected_without_writes() {
    let dir = tempfile::tempdir().unwrap();
    let (svc, backend, assets) = services(None);
    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, "not a logo").unwrap();
    let writes = backend.write_count();

    let team = svc.db().team_info().unwrap();
    let out = single(handle_command(
        &svc,
        ProviderCommand::SaveTeamInfo(TeamInfoInput {
            info: team,
            logo_file: Some(notes),
            remove_logo: false,
        }),
    ));
    assert!(matches!(
        out,
        Delta::WriteFailed {
            target: WriteTarget::TeamInfo,
            ..
        }
    ));
    assert!(assets.paths().is_empty());
    assert_eq!(backend.write_count(), writes);
}

#[test]
fn sign_out_reports_a_session_file_it_could_not_remove() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    // A directory in place of the session file cannot be removed.
    std::fs::create_dir(&path).unwrap();
    let (svc, _, _) = services(Some(path.clone()));
    let Delta::SignedIn(session) = single(handle_command(
        &svc,
        ProviderCommand::SignIn {
            email: DemoAuth::EMAIL.to_string(),
            password: DemoAuth::PASSWORD.to_string(),
        },
    )) else {
        panic!("demo credentials should sign in");
    };

    let out = handle_command(&svc, ProviderCommand::SignOut(session));
    assert!(
        out.iter()
            .any(|d| matches!(d, Delta::Log(msg) if msg.contains("Stored session not removed")))
    );
    assert!(matches!(out.last(), Some(Delta::SignedOut)));
    assert!(path.is_dir());
}
