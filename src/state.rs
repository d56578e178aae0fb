use std::collections::VecDeque;

use chrono::Utc;

use crate::auth::{Route, Session, gate};
use crate::db::{CallUpBoard, Dashboard};
use crate::forms::{
    CallUpView, CrudView, Form, MatchDraft, Notice, PlayerDraft, StatsDraft, StatusChange,
    Submission, TeamInfoInput, TeamInfoView, expire_notice,
};
use crate::model::{
    CallUpStatus, Match, MatchInput, Player, PlayerInput, PlayerStats, TeamInfo,
};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminTab {
    Overview,
    Players,
    Matches,
    CallUps,
    TeamInfo,
}

impl AdminTab {
    pub const ALL: [AdminTab; 5] = [
        AdminTab::Overview,
        AdminTab::Players,
        AdminTab::Matches,
        AdminTab::CallUps,
        AdminTab::TeamInfo,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AdminTab::Overview => "Overview",
            AdminTab::Players => "Players",
            AdminTab::Matches => "Matches",
            AdminTab::CallUps => "Call-ups",
            AdminTab::TeamInfo => "Team info",
        }
    }

    pub fn next(self) -> Self {
        let pos = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let pos = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(pos + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            LoadState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    /// 0 = email, 1 = password.
    pub focus: usize,
    pub busy: bool,
    pub error: Option<String>,
}

impl LoginForm {
    pub fn field_mut(&mut self) -> &mut String {
        if self.focus == 0 {
            &mut self.email
        } else {
            &mut self.password
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = 1 - self.focus.min(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteTarget {
    Player,
    PlayerStats,
    PlayerDelete,
    Match,
    MatchDelete,
    CallUp,
    TeamInfo,
}

#[derive(Debug, Clone)]
pub enum Delta {
    DashboardLoaded(Dashboard),
    DashboardFailed(String),
    AdminLoaded {
        players: Vec<Player>,
        matches: Vec<Match>,
        team_info: TeamInfo,
    },
    AdminFailed(String),
    CallUpsLoaded(CallUpBoard),
    CallUpsFailed(String),
    SignedIn(Session),
    SignInFailed(String),
    SignedOut,
    PlayerSaved(Player),
    PlayerStatsSaved {
        player_id: i64,
        stats: PlayerStats,
    },
    PlayerDeleted(i64),
    MatchSaved(Match),
    MatchDeleted(i64),
    CallUpStatusSet {
        player_id: i64,
        status: CallUpStatus,
    },
    TeamInfoSaved(TeamInfo),
    WriteFailed {
        target: WriteTarget,
        message: String,
    },
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    LoadDashboard,
    LoadAdmin,
    ReconcileCallUps,
    SignIn {
        email: String,
        password: String,
    },
    SignOut(Session),
    SavePlayer(Submission<PlayerInput>),
    SavePlayerStats {
        player_id: i64,
        stats: PlayerStats,
    },
    DeletePlayer {
        id: i64,
    },
    SaveMatch(Submission<MatchInput>),
    DeleteMatch {
        id: i64,
    },
    SetCallUpStatus(StatusChange),
    SaveTeamInfo(TeamInfoInput),
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Route,
    pub admin_tab: AdminTab,
    pub session: Option<Session>,
    pub dashboard: LoadState<Dashboard>,
    /// A write happened since the public view was loaded.
    pub dashboard_stale: bool,
    pub roster_scroll: u16,
    pub admin_loaded: LoadState<()>,
    pub players: CrudView<PlayerDraft>,
    pub stats_form: Form<StatsDraft>,
    pub matches: CrudView<MatchDraft>,
    pub call_ups: CallUpView,
    pub team: TeamInfoView,
    pub login: LoginForm,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    /// Commands produced while applying deltas; drained by the event loop.
    pub follow_ups: Vec<ProviderCommand>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(None)
    }
}

impl AppState {
    pub fn new(session: Option<Session>) -> Self {
        Self {
            screen: Route::Public,
            admin_tab: AdminTab::Overview,
            session,
            dashboard: LoadState::Idle,
            dashboard_stale: false,
            roster_scroll: 0,
            admin_loaded: LoadState::Idle,
            players: CrudView::default(),
            stats_form: Form::default(),
            matches: CrudView::default(),
            call_ups: CallUpView::default(),
            team: TeamInfoView::default(),
            login: LoginForm::default(),
            logs: VecDeque::with_capacity(MAX_LOGS),
            help_overlay: false,
            follow_ups: Vec::new(),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn take_follow_ups(&mut self) -> Vec<ProviderCommand> {
        std::mem::take(&mut self.follow_ups)
    }

    pub fn signed_in(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.is_active_at(Utc::now().timestamp()))
    }

    /// Moves to `route`, honouring the session gate. Returns where the user
    /// actually landed.
    pub fn navigate(&mut self, route: Route, now: i64) -> Route {
        let landed = gate(route, self.session.as_ref(), now);
        if landed != route {
            self.push_log("[INFO] Sign in to open the admin area");
        }
        if landed == Route::Admin && matches!(self.admin_loaded, LoadState::Idle) {
            self.admin_loaded = LoadState::Loading;
            self.follow_ups.push(ProviderCommand::LoadAdmin);
        }
        if landed == Route::Public
            && (self.dashboard_stale || matches!(self.dashboard, LoadState::Idle))
        {
            self.request_dashboard();
        }
        self.screen = landed;
        landed
    }

    pub fn request_dashboard(&mut self) {
        self.dashboard_stale = false;
        self.dashboard = LoadState::Loading;
        self.follow_ups.push(ProviderCommand::LoadDashboard);
    }

    pub fn request_admin_reload(&mut self) {
        self.admin_loaded = LoadState::Loading;
        self.follow_ups.push(ProviderCommand::LoadAdmin);
    }

    pub fn set_admin_tab(&mut self, tab: AdminTab) {
        self.admin_tab = tab;
        if tab == AdminTab::CallUps {
            self.follow_ups.push(ProviderCommand::ReconcileCallUps);
        }
    }

    /// Any open form or pending confirmation on the current admin tab.
    pub fn form_open(&self) -> bool {
        match self.admin_tab {
            AdminTab::Players => {
                self.players.form.is_open()
                    || self.stats_form.is_open()
                    || self.players.pending_delete.is_some()
            }
            AdminTab::Matches => self.matches.form.is_open() || self.matches.pending_delete.is_some(),
            AdminTab::TeamInfo => self.team.form.is_open(),
            AdminTab::Overview | AdminTab::CallUps => false,
        }
    }

    pub fn open_stats_form(&mut self) -> bool {
        let Some(player) = self.players.selected_item().cloned() else {
            return false;
        };
        self.stats_form.open_record(&player);
        true
    }

    pub fn submit_stats(&mut self) -> Option<ProviderCommand> {
        match self.stats_form.submit(&self.players.items)? {
            Submission::Update(player_id, stats) => {
                Some(ProviderCommand::SavePlayerStats { player_id, stats })
            }
            // Stats always belong to an existing player.
            Submission::Create(_) => {
                self.stats_form.close();
                None
            }
        }
    }

    pub fn expire_notices(&mut self, now: std::time::Instant) {
        expire_notice(&mut self.players.notice, now);
        expire_notice(&mut self.matches.notice, now);
        expire_notice(&mut self.call_ups.notice, now);
        expire_notice(&mut self.team.notice, now);
    }

    pub fn dismiss_notices(&mut self) {
        self.players.notice = None;
        self.matches.notice = None;
        self.call_ups.notice = None;
        self.team.notice = None;
    }

    pub fn active_notice(&self) -> Option<&Notice> {
        match self.admin_tab {
            AdminTab::Players => self.players.notice.as_ref(),
            AdminTab::Matches => self.matches.notice.as_ref(),
            AdminTab::CallUps => self.call_ups.notice.as_ref(),
            AdminTab::TeamInfo => self.team.notice.as_ref(),
            AdminTab::Overview => None,
        }
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::DashboardLoaded(dashboard) => {
            state.dashboard = LoadState::Ready(dashboard);
        }
        Delta::DashboardFailed(message) => {
            state.push_log(format!("[WARN] Dashboard load failed: {message}"));
            state.dashboard = LoadState::Failed(message);
        }
        Delta::AdminLoaded {
            players,
            matches,
            team_info,
        } => {
            state.players.set_items(players);
            state.matches.set_items(matches);
            state.team.info = team_info;
            state.admin_loaded = LoadState::Ready(());
        }
        Delta::AdminFailed(message) => {
            state.push_log(format!("[WARN] Admin load failed: {message}"));
            state.admin_loaded = LoadState::Failed(message);
        }
        Delta::CallUpsLoaded(board) => {
            if board.created > 0 {
                state.push_log(format!("[INFO] Created {} call-up rows", board.created));
                state.dashboard_stale = true;
            }
            state.call_ups.set_board(board.next_match, board.entries);
        }
        Delta::CallUpsFailed(message) => {
            state.push_log(format!("[WARN] Call-up load failed: {message}"));
            state.call_ups.fail_load(message);
        }
        Delta::SignedIn(session) => {
            state.push_log(format!("[INFO] Signed in as {}", session.email));
            state.session = Some(session);
            state.login = LoginForm::default();
            state.navigate(Route::Admin, Utc::now().timestamp());
        }
        Delta::SignInFailed(message) => {
            state.login.busy = false;
            state.login.password.clear();
            state.login.error = Some(message);
        }
        Delta::SignedOut => {
            state.session = None;
            state.admin_loaded = LoadState::Idle;
            state.push_log("[INFO] Signed out");
            state.navigate(Route::Public, Utc::now().timestamp());
        }
        Delta::PlayerSaved(player) => {
            state.push_log(format!("[INFO] Saved player #{} {}", player.number, player.name));
            state.players.finish_saved(player);
            state.dashboard_stale = true;
        }
        Delta::PlayerStatsSaved { player_id, stats } => {
            if let Some(player) = state.players.items.iter_mut().find(|p| p.id == player_id) {
                player.stats = stats;
            }
            state.stats_form.close();
            state.players.notice = Some(Notice::success("Stats updated", "Changes saved."));
            state.dashboard_stale = true;
        }
        Delta::PlayerDeleted(id) => {
            state.players.finish_deleted(id);
            state.dashboard_stale = true;
        }
        Delta::MatchSaved(m) => {
            state.push_log(format!("[INFO] Saved match {} vs {}", m.date, m.opponent));
            state.matches.finish_saved(m);
            state.dashboard_stale = true;
        }
        Delta::MatchDeleted(id) => {
            state.matches.finish_deleted(id);
            state.dashboard_stale = true;
        }
        Delta::CallUpStatusSet { player_id, status } => {
            state.call_ups.finish_status(player_id, status);
            state.dashboard_stale = true;
        }
        Delta::TeamInfoSaved(info) => {
            state.team.finish_saved(info);
            state.dashboard_stale = true;
        }
        Delta::WriteFailed { target, message } => {
            state.push_log(format!("[WARN] Write failed: {message}"));
            match target {
                WriteTarget::Player => state.players.finish_failed(message),
                WriteTarget::PlayerStats => {
                    state.players.notice =
                        Some(Notice::failure("Could not save stats", message.clone()));
                    state.stats_form.fail(message);
                }
                WriteTarget::PlayerDelete => state.players.finish_delete_failed(message),
                WriteTarget::Match => state.matches.finish_failed(message),
                WriteTarget::MatchDelete => state.matches.finish_delete_failed(message),
                WriteTarget::CallUp => state.call_ups.finish_failed(message),
                WriteTarget::TeamInfo => state.team.finish_failed(message),
            }
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
