use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};

use crate::auth::{Auth, AuthClient, DemoAuth, Session};
use crate::backend::{Backend, BackendError};
use crate::config::Config;
use crate::db::ClubDb;
use crate::forms::{StatusChange, Submission, TeamInfoInput};
use crate::http_client::build_http_client;
use crate::memory::demo_backend;
use crate::model::TeamInfo;
use crate::persist;
use crate::rest::RestBackend;
use crate::state::{Delta, ProviderCommand, WriteTarget};
use crate::storage::{AssetStore, MemoryAssets, StorageClient, delete_logo, upload_logo};

/// The remote collaborators plus the settings the worker needs.
pub struct Services {
    pub backend: Box<dyn Backend>,
    pub auth: Box<dyn Auth>,
    pub assets: Box<dyn AssetStore>,
    pub config: Config,
    pub session_path: Option<PathBuf>,
}

impl Services {
    pub fn from_config(config: Config, session_path: Option<PathBuf>) -> Result<Self> {
        if config.demo {
            return Ok(Self::demo(config, session_path));
        }
        let client = build_http_client(config.http_timeout)?;
        let backend = RestBackend::new(client.clone(), &config.supabase_url, &config.anon_key);
        let auth = AuthClient::new(client.clone(), &config.supabase_url, &config.anon_key);
        let assets = StorageClient::new(
            client,
            &config.supabase_url,
            &config.anon_key,
            &config.asset_bucket,
        );
        Ok(Self {
            backend: Box::new(backend),
            auth: Box::new(auth),
            assets: Box::new(assets),
            config,
            session_path,
        })
    }

    /// In-memory club with fixed admin credentials.
    pub fn demo(config: Config, session_path: Option<PathBuf>) -> Self {
        Self {
            backend: Box::new(demo_backend(&config.season)),
            auth: Box::new(DemoAuth::new()),
            assets: Box::new(MemoryAssets::new()),
            config,
            session_path,
        }
    }

    pub fn db(&self) -> ClubDb<'_> {
        ClubDb::new(
            self.backend.as_ref(),
            &self.config.season,
            self.config.squad_size,
        )
    }

    /// Authenticated requests use the session token; `None` reverts to the anon key.
    pub fn use_session(&self, session: Option<&Session>) {
        let token = session.map(|s| s.access_token.as_str());
        self.backend.set_access_token(token);
        self.assets.set_access_token(token);
    }
}

pub fn spawn_provider(
    services: Services,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("club-provider".to_string())
        .spawn(move || {
            for cmd in cmd_rx {
                for delta in handle_command(&services, cmd) {
                    if tx.send(delta).is_err() {
                        return;
                    }
                }
            }
        })
        .context("failed to spawn provider thread")
}

/// Runs one command to completion. Every failure is reported as a delta.
pub fn handle_command(services: &Services, cmd: ProviderCommand) -> Vec<Delta> {
    let db = services.db();
    let mut out = Vec::new();
    match cmd {
        ProviderCommand::LoadDashboard => match db.dashboard(services.config.last_matches) {
            Ok(dashboard) => out.push(Delta::DashboardLoaded(dashboard)),
            Err(err) => out.push(Delta::DashboardFailed(err.to_string())),
        },
        ProviderCommand::LoadAdmin => {
            let (players, (matches, team_info)) =
                rayon::join(|| db.players(), || rayon::join(|| db.matches(), || db.team_info()));
            match (players, matches, team_info) {
                (Ok(players), Ok(matches), Ok(team_info)) => out.push(Delta::AdminLoaded {
                    players,
                    matches,
                    team_info,
                }),
                (Err(err), _, _) | (_, Err(err), _) | (_, _, Err(err)) => {
                    out.push(Delta::AdminFailed(err.to_string()))
                }
            }
        }
        ProviderCommand::ReconcileCallUps => match db.reconcile_call_ups() {
            Ok(board) => out.push(Delta::CallUpsLoaded(board)),
            Err(err) => out.push(Delta::CallUpsFailed(err.user_message())),
        },
        ProviderCommand::SignIn { email, password } => {
            match services.auth.sign_in(&email, &password) {
                Ok(session) => {
                    services.use_session(Some(&session));
                    if let Some(path) = &services.session_path
                        && let Err(err) = persist::save_session_to(path, &session)
                    {
                        out.push(Delta::Log(format!("[WARN] Session not saved: {err}")));
                    }
                    out.push(Delta::SignedIn(session));
                }
                Err(err) => out.push(Delta::SignInFailed(err.user_message())),
            }
        }
        ProviderCommand::SignOut(session) => {
            if let Err(err) = services.auth.sign_out(&session) {
                out.push(Delta::Log(format!("[WARN] Sign-out request failed: {err}")));
            }
            services.use_session(None);
            if let Some(path) = &services.session_path
                && let Err(err) = persist::clear_session(path)
            {
                out.push(Delta::Log(format!(
                    "[WARN] Stored session not removed ({}): {err}",
                    path.display()
                )));
            }
            out.push(Delta::SignedOut);
        }
        ProviderCommand::SavePlayer(submission) => {
            let saved = match &submission {
                Submission::Create(input) => db.create_player(input),
                Submission::Update(id, input) => db.update_player(*id, input),
            };
            out.push(write_result(saved.map(Delta::PlayerSaved), WriteTarget::Player));
        }
        ProviderCommand::SavePlayerStats { player_id, stats } => {
            let saved = db
                .update_player_stats(player_id, &stats)
                .map(|stats| Delta::PlayerStatsSaved { player_id, stats });
            out.push(write_result(saved, WriteTarget::PlayerStats));
        }
        ProviderCommand::DeletePlayer { id } => {
            let deleted = db.delete_player(id).map(|()| Delta::PlayerDeleted(id));
            out.push(write_result(deleted, WriteTarget::PlayerDelete));
        }
        ProviderCommand::SaveMatch(submission) => {
            let saved = match &submission {
                Submission::Create(input) => db.create_match(input),
                Submission::Update(id, input) => db.update_match(*id, input),
            };
            out.push(write_result(saved.map(Delta::MatchSaved), WriteTarget::Match));
        }
        ProviderCommand::DeleteMatch { id } => {
            let deleted = db.delete_match(id).map(|()| Delta::MatchDeleted(id));
            out.push(write_result(deleted, WriteTarget::MatchDelete));
        }
        ProviderCommand::SetCallUpStatus(StatusChange {
            player_id,
            match_id,
            status,
        }) => {
            let saved = db
                .update_call_up_status(player_id, match_id, status)
                .map(|status| Delta::CallUpStatusSet { player_id, status });
            out.push(write_result(saved, WriteTarget::CallUp));
        }
        ProviderCommand::SaveTeamInfo(input) => match save_team_info(services, &db, input, &mut out)
        {
            Ok(info) => out.push(Delta::TeamInfoSaved(info)),
            Err(message) => out.push(Delta::WriteFailed {
                target: WriteTarget::TeamInfo,
                message,
            }),
        },
    }
    out
}

fn write_result(result: Result<Delta, BackendError>, target: WriteTarget) -> Delta {
    result.unwrap_or_else(|err| Delta::WriteFailed {
        target,
        message: err.user_message(),
    })
}

/// Uploads a new logo first so the saved record points at a live asset; the
/// replaced asset is removed only after the record no longer references it.
fn save_team_info(
    services: &Services,
    db: &ClubDb<'_>,
    input: TeamInfoInput,
    out: &mut Vec<Delta>,
) -> std::result::Result<TeamInfo, String> {
    let assets = services.assets.as_ref();
    let mut info = input.info;
    let previous_logo = info.logo_url.clone();

    let mut uploaded = None;
    if let Some(file) = &input.logo_file {
        let asset = upload_logo(assets, file).map_err(|err| err.to_string())?;
        out.push(Delta::Log(format!("[INFO] Logo uploaded to {}", asset.path)));
        info.logo_url = asset.url.clone();
        uploaded = Some(asset);
    } else if input.remove_logo {
        info.logo_url.clear();
    }

    match db.update_team_info(&info) {
        Ok(saved) => {
            if !previous_logo.is_empty()
                && saved.logo_url != previous_logo
                && let Err(err) = delete_logo(assets, &previous_logo)
            {
                out.push(Delta::Log(format!("[WARN] Old logo not deleted: {err}")));
            }
            Ok(saved)
        }
        Err(err) => {
            if let Some(asset) = uploaded
                && let Err(cleanup) = assets.remove(&asset.path)
            {
                out.push(Delta::Log(format!(
                    "[WARN] Orphaned logo {} not deleted: {cleanup}",
                    asset.path
                )));
            }
            Err(err.user_message())
        }
    }
}
