use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use club_dashboard::auth::{DemoAuth, Route};
use club_dashboard::callups::summarize;
use club_dashboard::config::Config;
use club_dashboard::db::Dashboard;
use club_dashboard::forms::{Draft, Form, FormPhase, Notice, NoticeKind};
use club_dashboard::model::{CallUpStatus, Match, Player};
use club_dashboard::persist;
use club_dashboard::provider::{Services, spawn_provider};
use club_dashboard::state::{AdminTab, AppState, Delta, LoadState, ProviderCommand, apply_delta};
use club_dashboard::stats::{compute_stats, recent_form, top_scorers};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<ProviderCommand>,
    demo: bool,
    season: String,
}

impl App {
    fn send(&mut self, cmd: ProviderCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            self.state.push_log("[WARN] Provider unavailable");
        }
    }

    fn flush_follow_ups(&mut self) {
        for cmd in self.state.take_follow_ups() {
            self.send(cmd);
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.help_overlay {
            self.state.help_overlay = false;
            return;
        }
        match self.state.screen {
            Route::Login => self.on_login_key(key),
            Route::Admin if self.state.form_open() => self.on_form_key(key),
            Route::Admin => self.on_admin_key(key),
            Route::Public => self.on_public_key(key),
        }
        self.flush_follow_ups();
    }

    fn on_global_key(&mut self, key: KeyEvent) -> bool {
        let now = Utc::now().timestamp();
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => {
                self.state.navigate(Route::Public, now);
            }
            KeyCode::Char('2') => {
                self.state.navigate(Route::Admin, now);
            }
            KeyCode::Char('?') => self.state.help_overlay = true,
            _ => return false,
        }
        true
    }

    fn on_public_key(&mut self, key: KeyEvent) {
        if self.on_global_key(key) {
            return;
        }
        match key.code {
            KeyCode::Char('r') => self.state.request_dashboard(),
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.roster_scroll = self.state.roster_scroll.saturating_add(1)
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.roster_scroll = self.state.roster_scroll.saturating_sub(1)
            }
            _ => {}
        }
    }

    fn on_login_key(&mut self, key: KeyEvent) {
        let login = &mut self.state.login;
        if login.busy {
            return;
        }
        match key.code {
            KeyCode::Esc => {
                self.state.login = Default::default();
                self.state.navigate(Route::Public, Utc::now().timestamp());
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => login.toggle_focus(),
            KeyCode::Backspace => {
                login.field_mut().pop();
            }
            KeyCode::Enter => {
                if login.email.trim().is_empty() || login.password.is_empty() {
                    login.error = Some("Email and password are required".to_string());
                    return;
                }
                login.busy = true;
                login.error = None;
                let cmd = ProviderCommand::SignIn {
                    email: login.email.trim().to_string(),
                    password: login.password.clone(),
                };
                self.send(cmd);
            }
            KeyCode::Char(c) => login.field_mut().push(c),
            _ => {}
        }
    }

    fn on_admin_key(&mut self, key: KeyEvent) {
        if self.on_global_key(key) {
            return;
        }
        match key.code {
            KeyCode::Tab => self.state.set_admin_tab(self.state.admin_tab.next()),
            KeyCode::BackTab => self.state.set_admin_tab(self.state.admin_tab.prev()),
            KeyCode::Char('x') => self.state.dismiss_notices(),
            KeyCode::Char('r') => {
                self.state.request_admin_reload();
                if self.state.admin_tab == AdminTab::CallUps {
                    self.state.set_admin_tab(AdminTab::CallUps);
                }
            }
            KeyCode::Char('o') => {
                if let Some(session) = self.state.session.clone() {
                    self.send(ProviderCommand::SignOut(session));
                }
            }
            _ => match self.state.admin_tab {
                AdminTab::Players => self.on_players_key(key),
                AdminTab::Matches => self.on_matches_key(key),
                AdminTab::CallUps => self.on_call_ups_key(key),
                AdminTab::TeamInfo => {
                    if matches!(key.code, KeyCode::Char('e') | KeyCode::Enter) {
                        self.state.team.open_edit();
                    }
                }
                AdminTab::Overview => {}
            },
        }
    }

    fn on_players_key(&mut self, key: KeyEvent) {
        let view = &mut self.state.players;
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => view.select_next(),
            KeyCode::Char('k') | KeyCode::Up => view.select_prev(),
            KeyCode::Char('n') => view.open_create(),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(id) = view.selected_item().map(|p| p.id) {
                    view.open_edit(id);
                }
            }
            KeyCode::Char('s') => {
                self.state.open_stats_form();
            }
            KeyCode::Char('d') => view.request_delete(),
            _ => {}
        }
    }

    fn on_matches_key(&mut self, key: KeyEvent) {
        let view = &mut self.state.matches;
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => view.select_next(),
            KeyCode::Char('k') | KeyCode::Up => view.select_prev(),
            KeyCode::Char('n') => view.open_create(),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(id) = view.selected_item().map(|m| m.id) {
                    view.open_edit(id);
                }
            }
            KeyCode::Char('d') => view.request_delete(),
            _ => {}
        }
    }

    fn on_call_ups_key(&mut self, key: KeyEvent) {
        let view = &mut self.state.call_ups;
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => view.select_next(),
            KeyCode::Char('k') | KeyCode::Up => view.select_prev(),
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Char(' ') => {
                if let Some(change) = view.change_selected(true) {
                    self.send(ProviderCommand::SetCallUpStatus(change));
                }
            }
            KeyCode::Char('h') | KeyCode::Left => {
                if let Some(change) = view.change_selected(false) {
                    self.send(ProviderCommand::SetCallUpStatus(change));
                }
            }
            _ => {}
        }
    }

    fn on_form_key(&mut self, key: KeyEvent) {
        match self.state.admin_tab {
            AdminTab::Players if self.state.players.pending_delete.is_some() => {
                match key.code {
                    KeyCode::Char('y') => {
                        if let Some(id) = self.state.players.confirm_delete() {
                            self.send(ProviderCommand::DeletePlayer { id });
                        }
                    }
                    _ => self.state.players.cancel_delete(),
                }
            }
            AdminTab::Matches if self.state.matches.pending_delete.is_some() => {
                match key.code {
                    KeyCode::Char('y') => {
                        if let Some(id) = self.state.matches.confirm_delete() {
                            self.send(ProviderCommand::DeleteMatch { id });
                        }
                    }
                    _ => self.state.matches.cancel_delete(),
                }
            }
            AdminTab::Players if self.state.stats_form.is_open() => {
                if edit_form(&mut self.state.stats_form, key) == FormKey::Submit
                    && let Some(cmd) = self.state.submit_stats()
                {
                    self.send(cmd);
                }
            }
            AdminTab::Players => {
                if edit_form(&mut self.state.players.form, key) == FormKey::Submit
                    && let Some(submission) = self.state.players.submit()
                {
                    self.send(ProviderCommand::SavePlayer(submission));
                }
            }
            AdminTab::Matches => {
                if edit_form(&mut self.state.matches.form, key) == FormKey::Submit
                    && let Some(submission) = self.state.matches.submit()
                {
                    self.send(ProviderCommand::SaveMatch(submission));
                }
            }
            AdminTab::TeamInfo => {
                if edit_form(&mut self.state.team.form, key) == FormKey::Submit
                    && let Some(input) = self.state.team.submit()
                {
                    self.send(ProviderCommand::SaveTeamInfo(input));
                }
            }
            AdminTab::Overview | AdminTab::CallUps => {}
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum FormKey {
    Handled,
    Submit,
}

fn edit_form<D: Draft>(form: &mut Form<D>, key: KeyEvent) -> FormKey {
    match key.code {
        KeyCode::Esc => {
            form.cancel();
        }
        KeyCode::Enter => return FormKey::Submit,
        KeyCode::Tab | KeyCode::Down => form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
        KeyCode::Left => form.cycle_choice(false),
        KeyCode::Right => form.cycle_choice(true),
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char(c) => form.input_char(c),
        _ => {}
    }
    FormKey::Handled
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = Config::from_env()?;
    let demo = config.demo;
    let season = config.season.clone();
    let session_path = persist::session_path();
    let session = session_path
        .as_deref()
        .and_then(persist::load_session_from)
        .filter(|s| s.is_active());

    let services = Services::from_config(config, session_path)?;
    services.use_session(session.as_ref());

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(services, tx, cmd_rx)?;

    let mut app = App {
        state: AppState::new(session),
        should_quit: false,
        cmd_tx,
        demo,
        season,
    };
    if app.demo {
        app.state.push_log("[INFO] Demo mode: in-memory club, nothing is saved");
    }
    app.state.navigate(Route::Public, Utc::now().timestamp());
    app.flush_follow_ups();

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }
        app.flush_follow_ups();
        app.state.expire_notices(Instant::now());

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Route::Public => render_public(frame, chunks[1], &app.state),
        Route::Login => render_login(frame, chunks[1], app),
        Route::Admin => render_admin(frame, chunks[1], &app.state),
    }

    let footer = Paragraph::new(footer_text(&app.state))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(app: &App) -> String {
    let club = app
        .state
        .dashboard
        .ready()
        .map(|d| d.team_info.name.clone())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "Club".to_string());
    let screen = match app.state.screen {
        Route::Public => "Dashboard".to_string(),
        Route::Login => "Sign in".to_string(),
        Route::Admin => format!("Admin / {}", app.state.admin_tab.label()),
    };
    let who = match &app.state.session {
        Some(s) if app.state.signed_in() => s.email.clone(),
        _ => "guest".to_string(),
    };
    let demo = if app.demo { " | DEMO" } else { "" };
    format!(" {club} | {screen} | Season {} | {who}{demo}", app.season)
}

fn footer_text(state: &AppState) -> String {
    match state.screen {
        Route::Public => "1 Dashboard | 2 Admin | j/k Scroll roster | r Reload | ? Help | q Quit".to_string(),
        Route::Login => "Tab Switch field | Enter Sign in | Esc Back".to_string(),
        Route::Admin if state.form_open() => {
            "Tab/↑/↓ Field | ←/→ Choice | Enter Save | Esc Cancel".to_string()
        }
        Route::Admin => match state.admin_tab {
            AdminTab::Players => {
                "Tab Next tab | j/k Move | n New | e Edit | s Stats | d Delete | x Dismiss | o Sign out"
                    .to_string()
            }
            AdminTab::Matches => {
                "Tab Next tab | j/k Move | n New | e Edit | d Delete | x Dismiss | o Sign out".to_string()
            }
            AdminTab::CallUps => {
                "Tab Next tab | j/k Move | ←/→ Change status | r Reload | o Sign out".to_string()
            }
            AdminTab::TeamInfo => "Tab Next tab | e Edit | x Dismiss | o Sign out".to_string(),
            AdminTab::Overview => "Tab Next tab | 1 Dashboard | r Reload | o Sign out".to_string(),
        },
    }
}

fn render_public(frame: &mut Frame, area: Rect, state: &AppState) {
    let dashboard = match &state.dashboard {
        LoadState::Ready(dashboard) => dashboard,
        LoadState::Failed(message) => {
            let text = format!("Could not load the dashboard.\n\n{message}\n\nPress r to retry.");
            let error = Paragraph::new(text)
                .style(Style::default().fg(Color::Red))
                .block(Block::default().title("Error").borders(Borders::ALL))
                .wrap(Wrap { trim: true });
            frame.render_widget(error, area);
            return;
        }
        LoadState::Idle | LoadState::Loading => {
            let loading = Paragraph::new("Loading club data...")
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(loading, area);
            return;
        }
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(6)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(rows[0]);

    frame.render_widget(
        Paragraph::new(team_text(dashboard))
            .block(Block::default().title("Club").borders(Borders::ALL))
            .wrap(Wrap { trim: true }),
        top[0],
    );
    frame.render_widget(
        Paragraph::new(stats_text(dashboard))
            .block(Block::default().title("Season").borders(Borders::ALL)),
        top[1],
    );
    frame.render_widget(
        Paragraph::new(next_match_text(dashboard.next_match.as_ref()))
            .block(Block::default().title("Next match").borders(Borders::ALL)),
        top[2],
    );

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Percentage(30),
            Constraint::Percentage(25),
        ])
        .split(rows[1]);

    frame.render_widget(
        Paragraph::new(roster_text(&dashboard.roster))
            .scroll((state.roster_scroll, 0))
            .block(Block::default().title("Squad").borders(Borders::ALL)),
        bottom[0],
    );
    frame.render_widget(
        Paragraph::new(results_text(&dashboard.last_matches))
            .block(Block::default().title("Last results").borders(Borders::ALL)),
        bottom[1],
    );
    let call_up_text = if dashboard.next_match.is_none() {
        "No upcoming match".to_string()
    } else if dashboard.call_ups.is_empty() {
        "Call-up not published yet".to_string()
    } else {
        dashboard
            .call_ups
            .iter()
            .map(|c| format!("{:>2} {} ({})", c.player.number, c.player.name, c.status.label()))
            .collect::<Vec<_>>()
            .join("\n")
    };
    frame.render_widget(
        Paragraph::new(call_up_text)
            .block(Block::default().title("Call-up").borders(Borders::ALL)),
        bottom[2],
    );
}

fn team_text(dashboard: &Dashboard) -> String {
    let info = &dashboard.team_info;
    let mut lines = vec![format!("[{}] {}", info.initial(), info.name)];
    if !info.founded.is_empty() {
        lines.push(format!("Founded {}", info.founded));
    }
    if !info.stadium.is_empty() || !info.city.is_empty() {
        lines.push(format!("{} {}", info.stadium, info.city).trim().to_string());
    }
    if !info.coach.is_empty() {
        lines.push(format!("Coach: {}", info.coach));
    }
    if !info.president.is_empty() {
        lines.push(format!("President: {}", info.president));
    }
    if !info.description.is_empty() {
        lines.push(info.description.clone());
    }
    lines.join("\n")
}

fn stats_text(dashboard: &Dashboard) -> String {
    let s = &dashboard.stats;
    let form = recent_form(&dashboard.last_matches, 5);
    let scorers = top_scorers(&dashboard.roster, 3)
        .iter()
        .map(|p| format!("{} {}", p.name, p.stats.goals))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Played {}  W {}  D {}  L {}\nGoals {}-{} (GD {:+})\nWin rate {}%\nForm {}\nTop scorers: {}",
        s.total_games,
        s.wins,
        s.draws,
        s.losses,
        s.goals_for,
        s.goals_against,
        s.goal_difference(),
        s.win_percentage,
        if form.is_empty() { "-".to_string() } else { form },
        if scorers.is_empty() { "-".to_string() } else { scorers },
    )
}

fn next_match_text(next: Option<&Match>) -> String {
    let Some(m) = next else {
        return "No match scheduled".to_string();
    };
    let mut text = format!(
        "vs {}\n{} {}\n{}",
        m.opponent,
        m.date,
        m.time,
        m.venue.label()
    );
    if !m.competition.is_empty() {
        text.push('\n');
        text.push_str(&m.competition);
    }
    text
}

fn roster_text(roster: &[Player]) -> String {
    if roster.is_empty() {
        return "No players yet".to_string();
    }
    let mut lines = vec![format!(
        "{:>2}  {:<20} {:<3} {:>3} {:>3} {:>3} {:>3} {:>3}",
        "#", "Name", "Pos", "GP", "G", "A", "YC", "RC"
    )];
    lines.extend(roster.iter().map(|p| {
        format!(
            "{:>2}  {:<20} {:<3} {:>3} {:>3} {:>3} {:>3} {:>3}",
            p.number,
            truncate(&p.name, 20),
            p.position.short(),
            p.stats.games_played,
            p.stats.goals,
            p.stats.assists,
            p.stats.yellow_cards,
            p.stats.red_cards
        )
    }));
    lines.join("\n")
}

fn results_text(matches: &[Match]) -> String {
    if matches.is_empty() {
        return "No matches played".to_string();
    }
    matches
        .iter()
        .map(|m| {
            format!(
                "{} {} {} vs {}",
                m.date,
                m.result.map(|r| r.letter()).unwrap_or('-'),
                m.scoreline().unwrap_or_default(),
                m.opponent
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_login(frame: &mut Frame, area: Rect, app: &App) {
    let popup = centered_rect(50, 50, area);
    frame.render_widget(Clear, popup);
    let login = &app.state.login;
    let marker = |field: usize| if login.focus == field { ">" } else { " " };
    let mut lines = vec![
        format!("{} Email:    {}", marker(0), login.email),
        format!("{} Password: {}", marker(1), "*".repeat(login.password.chars().count())),
        String::new(),
    ];
    if login.busy {
        lines.push("Signing in...".to_string());
    }
    if let Some(error) = &login.error {
        lines.push(format!("! {error}"));
    }
    if app.demo {
        lines.push(format!(
            "Demo credentials: {} / {}",
            DemoAuth::EMAIL,
            DemoAuth::PASSWORD
        ));
    }
    let form = Paragraph::new(lines.join("\n"))
        .block(Block::default().title("Admin sign in").borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(form, popup);
}

fn render_admin(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(2),
            Constraint::Length(5),
        ])
        .split(area);

    let tabs = AdminTab::ALL
        .iter()
        .map(|t| {
            if *t == state.admin_tab {
                format!("[{}]", t.label())
            } else {
                format!(" {} ", t.label())
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    frame.render_widget(Paragraph::new(tabs), rows[0]);

    let call_up_error = state
        .call_ups
        .load_error
        .as_ref()
        .filter(|_| state.admin_tab == AdminTab::CallUps);
    let failed = matches!(state.admin_loaded, LoadState::Failed(_)) || call_up_error.is_some();
    let body = match (&state.admin_loaded, call_up_error) {
        (LoadState::Failed(message), _) => {
            format!("Could not load admin data: {message}\nPress r to retry.")
        }
        (LoadState::Idle | LoadState::Loading, _) => "Loading...".to_string(),
        (LoadState::Ready(()), Some(message)) => {
            format!("Could not load the call-up: {message}\nPress r to retry.")
        }
        (LoadState::Ready(()), None) => match state.admin_tab {
            AdminTab::Overview => overview_text(state),
            AdminTab::Players => players_text(state),
            AdminTab::Matches => matches_text(state),
            AdminTab::CallUps => call_ups_text(state),
            AdminTab::TeamInfo => team_info_text(state),
        },
    };
    let body_style = if failed {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    };
    frame.render_widget(
        Paragraph::new(body).style(body_style).block(
            Block::default()
                .title(state.admin_tab.label())
                .borders(Borders::ALL),
        ),
        rows[1],
    );

    if let Some(notice) = state.active_notice() {
        frame.render_widget(notice_widget(notice), rows[2]);
    }

    frame.render_widget(
        Paragraph::new(console_text(state))
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().title("Console").borders(Borders::TOP)),
        rows[3],
    );

    match state.admin_tab {
        AdminTab::Players if state.stats_form.is_open() => render_form(frame, area, &state.stats_form),
        AdminTab::Players if state.players.form.is_open() => {
            render_form(frame, area, &state.players.form)
        }
        AdminTab::Matches if state.matches.form.is_open() => {
            render_form(frame, area, &state.matches.form)
        }
        AdminTab::TeamInfo if state.team.form.is_open() => render_form(frame, area, &state.team.form),
        _ => {}
    }
    let pending = match state.admin_tab {
        AdminTab::Players => state.players.pending_delete.is_some(),
        AdminTab::Matches => state.matches.pending_delete.is_some(),
        _ => false,
    };
    if pending {
        let popup = centered_rect(40, 20, area);
        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new("Delete this record? y to confirm, any other key to cancel")
                .wrap(Wrap { trim: true })
                .block(Block::default().title("Confirm").borders(Borders::ALL)),
            popup,
        );
    }
}

fn notice_widget(notice: &Notice) -> Paragraph<'static> {
    let color = match notice.kind {
        NoticeKind::Success => Color::Green,
        NoticeKind::Failure => Color::Red,
    };
    Paragraph::new(format!("{}: {}  (x to dismiss)", notice.title, notice.body))
        .style(Style::default().fg(color))
        .wrap(Wrap { trim: true })
}

fn overview_text(state: &AppState) -> String {
    let played: Vec<Match> = state
        .matches
        .items
        .iter()
        .filter(|m| m.played)
        .cloned()
        .collect();
    let stats = compute_stats(&played);
    let upcoming = state.matches.items.iter().filter(|m| !m.played).count();
    let summary = summarize(&state.call_ups.entries);
    format!(
        "Players: {}\nMatches played: {} (W {} D {} L {}, win rate {}%)\nUpcoming matches: {}\nGoals: {}-{}\nCall-up: {} called, {} injured, {} suspended",
        state.players.items.len(),
        stats.total_games,
        stats.wins,
        stats.draws,
        stats.losses,
        stats.win_percentage,
        upcoming,
        stats.goals_for,
        stats.goals_against,
        summary.called,
        summary.injured,
        summary.suspended,
    )
}

fn players_text(state: &AppState) -> String {
    let view = &state.players;
    if view.items.is_empty() {
        return "No players. Press n to add one.".to_string();
    }
    view.items
        .iter()
        .enumerate()
        .map(|(idx, p)| {
            let cursor = if idx == view.selected { ">" } else { " " };
            format!(
                "{cursor} {:>2}  {:<22} {:<13} {:>2}y  G {:>2} A {:>2}",
                p.number,
                truncate(&p.name, 22),
                p.position.label(),
                p.age,
                p.stats.goals,
                p.stats.assists
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn matches_text(state: &AppState) -> String {
    let view = &state.matches;
    if view.items.is_empty() {
        return "No matches. Press n to add one.".to_string();
    }
    view.items
        .iter()
        .enumerate()
        .map(|(idx, m)| {
            let cursor = if idx == view.selected { ">" } else { " " };
            let outcome = match (m.played, m.scoreline(), m.result) {
                (true, Some(score), Some(result)) => format!("{score} {}", result.label()),
                _ => "pending".to_string(),
            };
            format!(
                "{cursor} {} {}  {:<9} vs {:<20} {}",
                m.date,
                m.time,
                m.venue.label(),
                truncate(&m.opponent, 20),
                outcome
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn call_ups_text(state: &AppState) -> String {
    let view = &state.call_ups;
    let Some(next) = &view.next_match else {
        return "No upcoming match: nothing to call up.".to_string();
    };
    let summary = summarize(&view.entries);
    let mut lines = vec![
        format!("Next: {} {} vs {}", next.date, next.time, next.opponent),
        format!(
            "Called {} | Injured {} | Suspended {}",
            summary.called, summary.injured, summary.suspended
        ),
        String::new(),
    ];
    lines.extend(view.entries.iter().enumerate().map(|(idx, c)| {
        let cursor = if idx == view.selected { ">" } else { " " };
        let saving = if view.saving == Some(c.player.id) { " ..." } else { "" };
        let badge = match c.status {
            CallUpStatus::Called => "[+]",
            CallUpStatus::Injured => "[!]",
            CallUpStatus::Suspended => "[-]",
        };
        format!(
            "{cursor} {:>2} {:<22} {badge} {}{saving}",
            c.player.number,
            truncate(&c.player.name, 22),
            c.status.label()
        )
    }));
    lines.join("\n")
}

fn team_info_text(state: &AppState) -> String {
    let info = &state.team.info;
    let logo = if info.logo_url.is_empty() {
        format!("(none, showing initial '{}')", info.initial())
    } else {
        info.logo_url.clone()
    };
    format!(
        "Name:        {}\nFounded:     {}\nStadium:     {}\nCity:        {}\nPresident:   {}\nCoach:       {}\nLogo:        {}\n\n{}",
        info.name,
        info.founded,
        info.stadium,
        info.city,
        info.president,
        info.coach,
        logo,
        info.description
    )
}

fn render_form<D: Draft>(frame: &mut Frame, area: Rect, form: &Form<D>) {
    let popup = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup);
    let mut lines: Vec<String> = D::FIELDS
        .iter()
        .enumerate()
        .map(|(idx, label)| {
            let cursor = if idx == form.focus { ">" } else { " " };
            format!("{cursor} {:<14} {}", label, form.draft.value(idx))
        })
        .collect();
    lines.push(String::new());
    match &form.phase {
        FormPhase::Saving => lines.push("Saving...".to_string()),
        FormPhase::Error(message) => lines.push(format!("! {message}")),
        FormPhase::Editing | FormPhase::Idle => {
            if let Some(error) = &form.inline_error {
                lines.push(format!("! {error}"));
            }
        }
    }
    let title = match form.editing_id {
        Some(_) => format!("Edit {}", D::NOUN.to_lowercase()),
        None => format!("New {}", D::NOUN.to_lowercase()),
    };
    frame.render_widget(
        Paragraph::new(lines.join("\n"))
            .wrap(Wrap { trim: false })
            .block(Block::default().title(title).borders(Borders::ALL)),
        popup,
    );
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    let start = state.logs.len().saturating_sub(4);
    state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Club Dashboard - Help",
        "",
        "Global:",
        "  1            Public dashboard",
        "  2            Admin area (sign-in required)",
        "  r            Reload",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Admin:",
        "  Tab/S-Tab    Switch tab",
        "  j/k or ↑/↓   Move",
        "  n / e / d    New / edit / delete",
        "  s            Edit season stats (players)",
        "  ←/→          Change call-up status",
        "  x            Dismiss notification",
        "  o            Sign out",
        "",
        "Forms:",
        "  Tab / ↑/↓    Next / previous field",
        "  ←/→          Cycle choices",
        "  Enter        Save",
        "  Esc          Cancel",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
