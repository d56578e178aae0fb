use std::path::PathBuf;
use std::time::Instant;

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::model::{
    CallUp, CallUpStatus, Match, MatchInput, MatchResult, Player, PlayerInput, PlayerStats,
    Position, TeamInfo, Venue,
};

/// How long a notification stays on screen.
pub const NOTICE_KEEP_SECS: u64 = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{0} must be a whole number")]
    NotANumber(&'static str),
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: u32,
        max: u32,
    },
    #[error("number {0} is already taken by another player")]
    NumberTaken(u32),
    #[error("date must look like YYYY-MM-DD")]
    BadDate,
    #[error("time must look like HH:MM")]
    BadTime,
    #[error("enter both scores, or leave both empty for an unplayed match")]
    PartialScore,
    #[error("a played match needs a result")]
    ResultRequired,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormPhase {
    #[default]
    Idle,
    Editing,
    Saving,
    /// Backend rejected the write; the draft is kept for another attempt.
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Failure,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub body: String,
    pub raised_at: Instant,
}

impl Notice {
    pub fn success(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: title.into(),
            body: body.into(),
            raised_at: Instant::now(),
        }
    }

    pub fn failure(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Failure,
            title: title.into(),
            body: body.into(),
            raised_at: Instant::now(),
        }
    }

    pub fn expired_at(&self, now: Instant, keep_secs: u64) -> bool {
        now.duration_since(self.raised_at).as_secs() >= keep_secs
    }
}

/// Clears `notice` once it has been shown long enough. Failures stay until
/// dismissed.
pub fn expire_notice(notice: &mut Option<Notice>, now: Instant) {
    if notice
        .as_ref()
        .is_some_and(|n| n.kind == NoticeKind::Success && n.expired_at(now, NOTICE_KEEP_SECS))
    {
        *notice = None;
    }
}

pub trait Record: Clone + std::fmt::Debug {
    fn id(&self) -> i64;
}

impl Record for Player {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Record for Match {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Record for TeamInfo {
    fn id(&self) -> i64 {
        self.id.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission<I> {
    Create(I),
    Update(i64, I),
}

/// Editable text form for one kind of record.
pub trait Draft: Clone + Default + std::fmt::Debug {
    type Record: Record;
    type Input;

    const NOUN: &'static str;
    const FIELDS: &'static [&'static str];

    fn from_record(record: &Self::Record) -> Self;

    /// `loaded` is the list the form was opened from; `editing_id` is the
    /// record under edit, if any.
    fn validate(
        &self,
        loaded: &[Self::Record],
        editing_id: Option<i64>,
    ) -> Result<Self::Input, ValidationError>;

    fn value(&self, field: usize) -> String;

    /// Free-text fields; choice fields return `None` and use `cycle`.
    fn text_mut(&mut self, field: usize) -> Option<&mut String>;

    fn cycle(&mut self, _field: usize, _forward: bool) {}

    /// Display order of the list.
    fn sort(_items: &mut [Self::Record]) {}
}

#[derive(Debug, Clone, Default)]
pub struct Form<D: Draft> {
    pub phase: FormPhase,
    pub draft: D,
    pub editing_id: Option<i64>,
    pub focus: usize,
    /// Validation message shown under the form; no request was made.
    pub inline_error: Option<String>,
}

impl<D: Draft> Form<D> {
    pub fn is_open(&self) -> bool {
        !matches!(self.phase, FormPhase::Idle)
    }

    pub fn accepts_input(&self) -> bool {
        matches!(self.phase, FormPhase::Editing | FormPhase::Error(_))
    }

    pub fn open_create(&mut self) {
        self.open(D::default(), None);
    }

    pub fn open_record(&mut self, record: &D::Record) {
        self.open(D::from_record(record), Some(record.id()));
    }

    fn open(&mut self, draft: D, editing_id: Option<i64>) {
        self.phase = FormPhase::Editing;
        self.draft = draft;
        self.editing_id = editing_id;
        self.focus = 0;
        self.inline_error = None;
    }

    /// Discards the draft. A form that is waiting on the backend stays open.
    pub fn cancel(&mut self) -> bool {
        if self.phase == FormPhase::Saving {
            return false;
        }
        self.reset();
        true
    }

    fn reset(&mut self) {
        self.phase = FormPhase::Idle;
        self.draft = D::default();
        self.editing_id = None;
        self.focus = 0;
        self.inline_error = None;
    }

    pub fn submit(&mut self, loaded: &[D::Record]) -> Option<Submission<D::Input>> {
        if !self.accepts_input() {
            return None;
        }
        match self.draft.validate(loaded, self.editing_id) {
            Ok(input) => {
                self.phase = FormPhase::Saving;
                self.inline_error = None;
                Some(match self.editing_id {
                    Some(id) => Submission::Update(id, input),
                    None => Submission::Create(input),
                })
            }
            Err(err) => {
                self.phase = FormPhase::Editing;
                self.inline_error = Some(err.to_string());
                None
            }
        }
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        if self.phase == FormPhase::Saving {
            self.phase = FormPhase::Error(message.into());
        }
    }

    /// Closes the form after a successful save.
    pub fn close(&mut self) {
        self.reset();
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.phase {
            FormPhase::Error(message) => Some(message),
            _ => self.inline_error.as_deref(),
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % D::FIELDS.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.checked_sub(1).unwrap_or(D::FIELDS.len() - 1);
    }

    pub fn input_char(&mut self, c: char) {
        if !self.accepts_input() {
            return;
        }
        if let Some(text) = self.draft.text_mut(self.focus) {
            text.push(c);
        } else if c == ' ' {
            self.draft.cycle(self.focus, true);
        }
    }

    pub fn backspace(&mut self) {
        if !self.accepts_input() {
            return;
        }
        if let Some(text) = self.draft.text_mut(self.focus) {
            text.pop();
        }
    }

    pub fn cycle_choice(&mut self, forward: bool) {
        if self.accepts_input() && self.draft.text_mut(self.focus).is_none() {
            self.draft.cycle(self.focus, forward);
        }
    }
}

/// List of records plus the create/edit form and delete confirmation.
#[derive(Debug, Clone, Default)]
pub struct CrudView<D: Draft> {
    pub items: Vec<D::Record>,
    pub selected: usize,
    pub form: Form<D>,
    pub notice: Option<Notice>,
    pub pending_delete: Option<i64>,
    pub deleting: bool,
}

impl<D: Draft> CrudView<D> {
    pub fn set_items(&mut self, mut items: Vec<D::Record>) {
        D::sort(&mut items);
        self.items = items;
        self.clamp_selection();
    }

    pub fn selected_item(&self) -> Option<&D::Record> {
        self.items.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.items.is_empty() {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1) % self.items.len();
    }

    pub fn select_prev(&mut self) {
        if self.items.is_empty() {
            self.selected = 0;
            return;
        }
        if self.selected == 0 {
            self.selected = self.items.len() - 1;
        } else {
            self.selected -= 1;
        }
    }

    fn clamp_selection(&mut self) {
        if self.items.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.items.len() {
            self.selected = self.items.len() - 1;
        }
    }

    pub fn open_create(&mut self) {
        self.form.open_create();
    }

    pub fn open_edit(&mut self, id: i64) -> bool {
        let Some(record) = self.items.iter().find(|r| r.id() == id) else {
            return false;
        };
        self.form.open_record(record);
        true
    }

    pub fn cancel(&mut self) -> bool {
        self.form.cancel()
    }

    pub fn submit(&mut self) -> Option<Submission<D::Input>> {
        self.form.submit(&self.items)
    }

    /// Splices the saved record into the list: replace on update, append on create.
    pub fn finish_saved(&mut self, record: D::Record) {
        let id = record.id();
        let created = match self.items.iter_mut().find(|r| r.id() == id) {
            Some(slot) => {
                *slot = record;
                false
            }
            None => {
                self.items.push(record);
                true
            }
        };
        D::sort(&mut self.items);
        if let Some(pos) = self.items.iter().position(|r| r.id() == id) {
            self.selected = pos;
        }
        self.form.close();
        let title = if created {
            format!("{} added", D::NOUN)
        } else {
            format!("{} updated", D::NOUN)
        };
        self.notice = Some(Notice::success(title, "Changes saved."));
    }

    pub fn finish_failed(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.notice = Some(Notice::failure(
            format!("Could not save {}", D::NOUN.to_lowercase()),
            message.clone(),
        ));
        self.form.fail(message);
    }

    pub fn request_delete(&mut self) {
        if let Some(id) = self.selected_item().map(Record::id) {
            self.pending_delete = Some(id);
        }
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Id to delete once the user confirmed.
    pub fn confirm_delete(&mut self) -> Option<i64> {
        if self.deleting {
            return None;
        }
        let id = self.pending_delete.take()?;
        self.deleting = true;
        Some(id)
    }

    pub fn finish_deleted(&mut self, id: i64) {
        self.items.retain(|r| r.id() != id);
        self.deleting = false;
        self.clamp_selection();
        self.notice = Some(Notice::success(
            format!("{} deleted", D::NOUN),
            "The record was removed.",
        ));
    }

    pub fn finish_delete_failed(&mut self, message: impl Into<String>) {
        self.deleting = false;
        self.notice = Some(Notice::failure(
            format!("Could not delete {}", D::NOUN.to_lowercase()),
            message,
        ));
    }
}

fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(value.to_string())
}

fn number_in(value: &str, field: &'static str, min: u32, max: u32) -> Result<u32, ValidationError> {
    let raw = required(value, field)?;
    let n = raw
        .parse::<u32>()
        .map_err(|_| ValidationError::NotANumber(field))?;
    if !(min..=max).contains(&n) {
        return Err(ValidationError::OutOfRange { field, min, max });
    }
    Ok(n)
}

fn optional_number(value: &str, field: &'static str) -> Result<Option<u32>, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<u32>()
        .map(Some)
        .map_err(|_| ValidationError::NotANumber(field))
}

fn cycle_in<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let pos = all.iter().position(|v| *v == current).unwrap_or(0);
    let next = if forward {
        (pos + 1) % all.len()
    } else {
        (pos + all.len() - 1) % all.len()
    };
    all[next]
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerDraft {
    pub number: String,
    pub name: String,
    pub position: Position,
    pub age: String,
}

impl Draft for PlayerDraft {
    type Record = Player;
    type Input = PlayerInput;

    const NOUN: &'static str = "Player";
    const FIELDS: &'static [&'static str] = &["Number", "Name", "Position", "Age"];

    fn from_record(p: &Player) -> Self {
        Self {
            number: p.number.to_string(),
            name: p.name.clone(),
            position: p.position,
            age: p.age.to_string(),
        }
    }

    fn validate(
        &self,
        roster: &[Player],
        editing_id: Option<i64>,
    ) -> Result<PlayerInput, ValidationError> {
        let number = number_in(&self.number, "Number", 1, 99)?;
        let name = required(&self.name, "Name")?;
        let age = number_in(&self.age, "Age", 5, 80)?;
        if roster
            .iter()
            .any(|p| p.number == number && Some(p.id) != editing_id)
        {
            return Err(ValidationError::NumberTaken(number));
        }
        Ok(PlayerInput {
            number,
            name,
            position: self.position,
            age,
        })
    }

    fn value(&self, field: usize) -> String {
        match field {
            0 => self.number.clone(),
            1 => self.name.clone(),
            2 => self.position.label().to_string(),
            _ => self.age.clone(),
        }
    }

    fn text_mut(&mut self, field: usize) -> Option<&mut String> {
        match field {
            0 => Some(&mut self.number),
            1 => Some(&mut self.name),
            3 => Some(&mut self.age),
            _ => None,
        }
    }

    fn cycle(&mut self, field: usize, forward: bool) {
        if field == 2 {
            self.position = cycle_in(&Position::ALL, self.position, forward);
        }
    }

    fn sort(items: &mut [Player]) {
        items.sort_by(|a, b| a.number.cmp(&b.number).then(a.id.cmp(&b.id)));
    }
}

/// Season stats of one player; always an update of an existing player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsDraft {
    pub games_played: String,
    pub goals: String,
    pub assists: String,
    pub yellow_cards: String,
    pub red_cards: String,
}

impl Draft for StatsDraft {
    type Record = Player;
    type Input = PlayerStats;

    const NOUN: &'static str = "Stats";
    const FIELDS: &'static [&'static str] =
        &["Games played", "Goals", "Assists", "Yellow cards", "Red cards"];

    fn from_record(p: &Player) -> Self {
        Self {
            games_played: p.stats.games_played.to_string(),
            goals: p.stats.goals.to_string(),
            assists: p.stats.assists.to_string(),
            yellow_cards: p.stats.yellow_cards.to_string(),
            red_cards: p.stats.red_cards.to_string(),
        }
    }

    fn validate(&self, _: &[Player], _: Option<i64>) -> Result<PlayerStats, ValidationError> {
        let field = |value: &str, name| optional_number(value, name).map(Option::unwrap_or_default);
        Ok(PlayerStats {
            games_played: field(&self.games_played, "Games played")?,
            goals: field(&self.goals, "Goals")?,
            assists: field(&self.assists, "Assists")?,
            yellow_cards: field(&self.yellow_cards, "Yellow cards")?,
            red_cards: field(&self.red_cards, "Red cards")?,
        })
    }

    fn value(&self, field: usize) -> String {
        match field {
            0 => self.games_played.clone(),
            1 => self.goals.clone(),
            2 => self.assists.clone(),
            3 => self.yellow_cards.clone(),
            _ => self.red_cards.clone(),
        }
    }

    fn text_mut(&mut self, field: usize) -> Option<&mut String> {
        Some(match field {
            0 => &mut self.games_played,
            1 => &mut self.goals,
            2 => &mut self.assists,
            3 => &mut self.yellow_cards,
            _ => &mut self.red_cards,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchDraft {
    pub date: String,
    pub time: String,
    pub opponent: String,
    pub venue: Venue,
    pub competition: String,
    pub goals_for: String,
    pub goals_against: String,
    pub result: Option<MatchResult>,
}

impl Draft for MatchDraft {
    type Record = Match;
    type Input = MatchInput;

    const NOUN: &'static str = "Match";
    const FIELDS: &'static [&'static str] = &[
        "Date",
        "Time",
        "Opponent",
        "Venue",
        "Competition",
        "Goals for",
        "Goals against",
        "Result",
    ];

    fn from_record(m: &Match) -> Self {
        Self {
            date: m.date.clone(),
            time: m.time.clone(),
            opponent: m.opponent.clone(),
            venue: m.venue,
            competition: m.competition.clone(),
            goals_for: m.goals_for.map(|g| g.to_string()).unwrap_or_default(),
            goals_against: m.goals_against.map(|g| g.to_string()).unwrap_or_default(),
            result: m.result,
        }
    }

    /// A match counts as played exactly when both scores are entered.
    fn validate(&self, _: &[Match], _: Option<i64>) -> Result<MatchInput, ValidationError> {
        let date = required(&self.date, "Date")?;
        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|_| ValidationError::BadDate)?;
        let time = required(&self.time, "Time")?;
        let time = NaiveTime::parse_from_str(&time, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&time, "%H:%M:%S"))
            .map_err(|_| ValidationError::BadTime)?;
        let opponent = required(&self.opponent, "Opponent")?;
        let goals_for = optional_number(&self.goals_for, "Goals for")?;
        let goals_against = optional_number(&self.goals_against, "Goals against")?;
        let played = match (goals_for, goals_against) {
            (Some(_), Some(_)) => true,
            (None, None) => false,
            _ => return Err(ValidationError::PartialScore),
        };
        let result = if played {
            Some(self.result.ok_or(ValidationError::ResultRequired)?)
        } else {
            None
        };
        let competition = Some(self.competition.trim().to_string()).filter(|c| !c.is_empty());
        Ok(MatchInput {
            date: date.format("%Y-%m-%d").to_string(),
            time: time.format("%H:%M").to_string(),
            opponent,
            venue: self.venue,
            competition,
            goals_for,
            goals_against,
            result,
            played,
        })
    }

    fn value(&self, field: usize) -> String {
        match field {
            0 => self.date.clone(),
            1 => self.time.clone(),
            2 => self.opponent.clone(),
            3 => self.venue.label().to_string(),
            4 => self.competition.clone(),
            5 => self.goals_for.clone(),
            6 => self.goals_against.clone(),
            _ => self.result.map(MatchResult::label).unwrap_or("-").to_string(),
        }
    }

    fn text_mut(&mut self, field: usize) -> Option<&mut String> {
        match field {
            0 => Some(&mut self.date),
            1 => Some(&mut self.time),
            2 => Some(&mut self.opponent),
            4 => Some(&mut self.competition),
            5 => Some(&mut self.goals_for),
            6 => Some(&mut self.goals_against),
            _ => None,
        }
    }

    fn cycle(&mut self, field: usize, forward: bool) {
        match field {
            3 => self.venue = cycle_in(&Venue::ALL, self.venue, forward),
            7 => {
                let options = [
                    None,
                    Some(MatchResult::Win),
                    Some(MatchResult::Draw),
                    Some(MatchResult::Loss),
                ];
                self.result = cycle_in(&options, self.result, forward);
            }
            _ => {}
        }
    }

    fn sort(items: &mut [Match]) {
        sort_matches(items);
    }
}

/// Unplayed first, then most recent date first.
pub fn sort_matches(items: &mut [Match]) {
    items.sort_by(|a, b| {
        a.played
            .cmp(&b.played)
            .then_with(|| b.date.cmp(&a.date))
            .then_with(|| b.time.cmp(&a.time))
            .then(a.id.cmp(&b.id))
    });
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamInfoInput {
    pub info: TeamInfo,
    /// Local image to upload as the new logo.
    pub logo_file: Option<PathBuf>,
    pub remove_logo: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamInfoDraft {
    pub id: Option<i64>,
    pub name: String,
    pub founded: String,
    pub stadium: String,
    pub city: String,
    pub president: String,
    pub coach: String,
    pub description: String,
    pub logo_url: String,
    pub logo_file: String,
    pub remove_logo: bool,
}

impl Draft for TeamInfoDraft {
    type Record = TeamInfo;
    type Input = TeamInfoInput;

    const NOUN: &'static str = "Team info";
    const FIELDS: &'static [&'static str] = &[
        "Name",
        "Founded",
        "Stadium",
        "City",
        "President",
        "Coach",
        "Description",
        "Logo file",
        "Remove logo",
    ];

    fn from_record(info: &TeamInfo) -> Self {
        Self {
            id: info.id,
            name: info.name.clone(),
            founded: info.founded.clone(),
            stadium: info.stadium.clone(),
            city: info.city.clone(),
            president: info.president.clone(),
            coach: info.coach.clone(),
            description: info.description.clone(),
            logo_url: info.logo_url.clone(),
            logo_file: String::new(),
            remove_logo: false,
        }
    }

    fn validate(&self, _: &[TeamInfo], _: Option<i64>) -> Result<TeamInfoInput, ValidationError> {
        let name = required(&self.name, "Name")?;
        let logo_file = Some(self.logo_file.trim())
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        Ok(TeamInfoInput {
            info: TeamInfo {
                id: self.id,
                name,
                founded: self.founded.trim().to_string(),
                stadium: self.stadium.trim().to_string(),
                city: self.city.trim().to_string(),
                description: self.description.trim().to_string(),
                president: self.president.trim().to_string(),
                coach: self.coach.trim().to_string(),
                logo_url: self.logo_url.clone(),
            },
            remove_logo: self.remove_logo && logo_file.is_none(),
            logo_file,
        })
    }

    fn value(&self, field: usize) -> String {
        match field {
            0 => self.name.clone(),
            1 => self.founded.clone(),
            2 => self.stadium.clone(),
            3 => self.city.clone(),
            4 => self.president.clone(),
            5 => self.coach.clone(),
            6 => self.description.clone(),
            7 => self.logo_file.clone(),
            _ => if self.remove_logo { "yes" } else { "no" }.to_string(),
        }
    }

    fn text_mut(&mut self, field: usize) -> Option<&mut String> {
        match field {
            0 => Some(&mut self.name),
            1 => Some(&mut self.founded),
            2 => Some(&mut self.stadium),
            3 => Some(&mut self.city),
            4 => Some(&mut self.president),
            5 => Some(&mut self.coach),
            6 => Some(&mut self.description),
            7 => Some(&mut self.logo_file),
            _ => None,
        }
    }

    fn cycle(&mut self, field: usize, _forward: bool) {
        if field == 8 {
            self.remove_logo = !self.remove_logo;
        }
    }
}

/// Team profile tab: a single record with its edit form.
#[derive(Debug, Clone, Default)]
pub struct TeamInfoView {
    pub info: TeamInfo,
    pub form: Form<TeamInfoDraft>,
    pub notice: Option<Notice>,
}

impl TeamInfoView {
    pub fn open_edit(&mut self) {
        self.form.open_record(&self.info);
    }

    pub fn submit(&mut self) -> Option<TeamInfoInput> {
        match self.form.submit(std::slice::from_ref(&self.info))? {
            Submission::Create(input) | Submission::Update(_, input) => Some(input),
        }
    }

    pub fn finish_saved(&mut self, info: TeamInfo) {
        self.info = info;
        self.form.close();
        self.notice = Some(Notice::success("Team info updated", "Changes saved."));
    }

    pub fn finish_failed(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.notice = Some(Notice::failure("Could not save team info", message.clone()));
        self.form.fail(message);
    }
}

/// Call-up list for the next match with per-player status changes.
#[derive(Debug, Clone, Default)]
pub struct CallUpView {
    pub next_match: Option<Match>,
    pub entries: Vec<CallUp>,
    pub selected: usize,
    /// Player whose status write is in flight.
    pub saving: Option<i64>,
    pub notice: Option<Notice>,
    /// The last read failed; the board is empty until a reload succeeds.
    pub load_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub player_id: i64,
    pub match_id: i64,
    pub status: CallUpStatus,
}

impl CallUpView {
    /// Replaces the board. A status write still in flight stays pending.
    pub fn set_board(&mut self, next_match: Option<Match>, entries: Vec<CallUp>) {
        self.next_match = next_match;
        self.entries = entries;
        self.load_error = None;
        if self.selected >= self.entries.len() {
            self.selected = self.entries.len().saturating_sub(1);
        }
    }

    /// Drops the stale board so nothing can be edited against it.
    pub fn fail_load(&mut self, message: impl Into<String>) {
        self.next_match = None;
        self.entries.clear();
        self.selected = 0;
        self.load_error = Some(message.into());
    }

    pub fn select_next(&mut self) {
        if !self.entries.is_empty() {
            self.selected = (self.selected + 1) % self.entries.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.entries.is_empty() {
            self.selected = (self.selected + self.entries.len() - 1) % self.entries.len();
        }
    }

    /// Status change for the selected player, if no other write is pending.
    pub fn change_selected(&mut self, forward: bool) -> Option<StatusChange> {
        if self.saving.is_some() || self.load_error.is_some() {
            return None;
        }
        let entry = self.entries.get(self.selected)?;
        let status = if forward {
            entry.status.next()
        } else {
            entry.status.prev()
        };
        self.saving = Some(entry.player.id);
        Some(StatusChange {
            player_id: entry.player.id,
            match_id: entry.match_id,
            status,
        })
    }

    pub fn finish_status(&mut self, player_id: i64, status: CallUpStatus) {
        self.saving = None;
        if crate::callups::set_status(&mut self.entries, player_id, status) {
            let name = self
                .entries
                .iter()
                .find(|c| c.player.id == player_id)
                .map(|c| c.player.name.clone())
                .unwrap_or_default();
            self.notice = Some(Notice::success(
                "Call-up updated",
                format!("{name}: {}", status.label()),
            ));
        }
    }

    pub fn finish_failed(&mut self, message: impl Into<String>) {
        self.saving = None;
        self.notice = Some(Notice::failure("Could not update call-up", message));
    }
}
