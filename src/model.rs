#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    #[default]
    Forward,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    /// Value stored in the `players.position` column.
    pub fn wire(self) -> &'static str {
        match self {
            Position::Goalkeeper => "Portero",
            Position::Defender => "Defensa",
            Position::Midfielder => "Mediocampista",
            Position::Forward => "Delantero",
        }
    }

    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "portero" | "goalkeeper" | "gk" => Some(Position::Goalkeeper),
            "defensa" | "defender" | "df" => Some(Position::Defender),
            "mediocampista" | "midfielder" | "mf" => Some(Position::Midfielder),
            "delantero" | "forward" | "fw" => Some(Position::Forward),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Position::Goalkeeper => "Goalkeeper",
            Position::Defender => "Defender",
            Position::Midfielder => "Midfielder",
            Position::Forward => "Forward",
        }
    }

    pub fn short(self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::Defender => "DF",
            Position::Midfielder => "MF",
            Position::Forward => "FW",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Venue {
    #[default]
    Home,
    Away,
}

impl Venue {
    pub const ALL: [Venue; 2] = [Venue::Home, Venue::Away];

    pub fn wire(self) -> &'static str {
        match self {
            Venue::Home => "Local",
            Venue::Away => "Visitante",
        }
    }

    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "local" | "home" => Some(Venue::Home),
            "visitante" | "away" => Some(Venue::Away),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Venue::Home => "Home",
            Venue::Away => "Away",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatchResult {
    #[default]
    Win,
    Draw,
    Loss,
}

impl MatchResult {
    pub const ALL: [MatchResult; 3] = [MatchResult::Win, MatchResult::Draw, MatchResult::Loss];

    pub fn wire(self) -> &'static str {
        match self {
            MatchResult::Win => "Victoria",
            MatchResult::Draw => "Empate",
            MatchResult::Loss => "Derrota",
        }
    }

    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "victoria" | "win" => Some(MatchResult::Win),
            "empate" | "draw" => Some(MatchResult::Draw),
            "derrota" | "loss" => Some(MatchResult::Loss),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MatchResult::Win => "Win",
            MatchResult::Draw => "Draw",
            MatchResult::Loss => "Loss",
        }
    }

    pub fn letter(self) -> char {
        match self {
            MatchResult::Win => 'W',
            MatchResult::Draw => 'D',
            MatchResult::Loss => 'L',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CallUpStatus {
    #[default]
    Called,
    Injured,
    Suspended,
}

impl CallUpStatus {
    pub const ALL: [CallUpStatus; 3] = [
        CallUpStatus::Called,
        CallUpStatus::Injured,
        CallUpStatus::Suspended,
    ];

    pub fn wire(self) -> &'static str {
        match self {
            CallUpStatus::Called => "Convocado",
            CallUpStatus::Injured => "Lesionado",
            CallUpStatus::Suspended => "Suspendido",
        }
    }

    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "convocado" | "called" => Some(CallUpStatus::Called),
            "lesionado" | "injured" => Some(CallUpStatus::Injured),
            "suspendido" | "suspended" => Some(CallUpStatus::Suspended),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CallUpStatus::Called => "Called",
            CallUpStatus::Injured => "Injured",
            CallUpStatus::Suspended => "Suspended",
        }
    }

    pub fn next(self) -> Self {
        match self {
            CallUpStatus::Called => CallUpStatus::Injured,
            CallUpStatus::Injured => CallUpStatus::Suspended,
            CallUpStatus::Suspended => CallUpStatus::Called,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            CallUpStatus::Called => CallUpStatus::Suspended,
            CallUpStatus::Injured => CallUpStatus::Called,
            CallUpStatus::Suspended => CallUpStatus::Injured,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerStats {
    pub games_played: u32,
    pub goals: u32,
    pub assists: u32,
    pub yellow_cards: u32,
    pub red_cards: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Player {
    pub id: i64,
    pub number: u32,
    pub name: String,
    pub position: Position,
    pub age: u32,
    /// Stats for the configured season; zeroed when no row exists yet.
    pub stats: PlayerStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInput {
    pub number: u32,
    pub name: String,
    pub position: Position,
    pub age: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Match {
    pub id: i64,
    pub date: String,
    pub time: String,
    pub opponent: String,
    pub venue: Venue,
    pub competition: String,
    pub goals_for: Option<u32>,
    pub goals_against: Option<u32>,
    pub result: Option<MatchResult>,
    pub played: bool,
}

impl Match {
    pub fn scoreline(&self) -> Option<String> {
        match (self.goals_for, self.goals_against) {
            (Some(f), Some(a)) => Some(format!("{f}-{a}")),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchInput {
    pub date: String,
    pub time: String,
    pub opponent: String,
    pub venue: Venue,
    pub competition: Option<String>,
    pub goals_for: Option<u32>,
    pub goals_against: Option<u32>,
    pub result: Option<MatchResult>,
    pub played: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallUp {
    pub player: Player,
    pub match_id: i64,
    pub status: CallUpStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TeamInfo {
    pub id: Option<i64>,
    pub name: String,
    pub founded: String,
    pub stadium: String,
    pub city: String,
    pub description: String,
    pub president: String,
    pub coach: String,
    pub logo_url: String,
}

impl TeamInfo {
    pub fn initial(&self) -> char {
        self.name
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('C')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TeamStats {
    pub total_games: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub win_percentage: u32,
}

impl TeamStats {
    pub fn goal_difference(&self) -> i64 {
        i64::from(self.goals_for) - i64::from(self.goals_against)
    }
}
