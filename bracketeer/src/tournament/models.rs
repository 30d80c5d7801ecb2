//! Tournament data models.

use super::errors::{TournamentError, TournamentResult};
use crate::bracket::models::{Bracket, BracketView};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Tournament ID type
pub type TournamentId = Uuid;

/// Team ID type
pub type TeamId = Uuid;

/// User ID type
pub type UserId = Uuid;

/// Who may enter a tournament
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentKind {
    /// Teams only
    Team,
    /// Individual players only
    Solo,
    /// Teams and players in the same bracket
    Mixed,
}

impl std::fmt::Display for TournamentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentKind::Team => write!(f, "team"),
            TournamentKind::Solo => write!(f, "solo"),
            TournamentKind::Mixed => write!(f, "mixed"),
        }
    }
}

/// Bracket format. Only single elimination can be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    SingleElimination,
    DoubleElimination,
    RoundRobin,
}

impl std::fmt::Display for TournamentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentFormat::SingleElimination => write!(f, "single_elimination"),
            TournamentFormat::DoubleElimination => write!(f, "double_elimination"),
            TournamentFormat::RoundRobin => write!(f, "round_robin"),
        }
    }
}

/// Tournament lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Accepting registrations
    Registration,
    /// Bracket generated, matches being played
    InProgress,
    /// Final match resolved
    Completed,
    /// Cancelled before completion
    Cancelled,
}

impl std::fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentStatus::Registration => write!(f, "registration"),
            TournamentStatus::InProgress => write!(f, "in_progress"),
            TournamentStatus::Completed => write!(f, "completed"),
            TournamentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Kind tag of a [`Participant`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantKind {
    Team,
    Player,
}

/// Typed reference to a bracket entrant. A bare id is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Participant {
    Team(TeamId),
    Player(UserId),
}

impl Participant {
    /// Build a participant from a kind tag and a reference
    pub fn new(kind: ParticipantKind, reference: Uuid) -> Self {
        match kind {
            ParticipantKind::Team => Participant::Team(reference),
            ParticipantKind::Player => Participant::Player(reference),
        }
    }

    pub fn kind(&self) -> ParticipantKind {
        match self {
            Participant::Team(_) => ParticipantKind::Team,
            Participant::Player(_) => ParticipantKind::Player,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Participant::Team(id) | Participant::Player(id) => *id,
        }
    }
}

impl std::fmt::Display for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Participant::Team(id) => write!(f, "team {}", id),
            Participant::Player(id) => write!(f, "player {}", id),
        }
    }
}

/// Tournament creation input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentConfig {
    /// Tournament name
    pub name: String,
    /// Participant mode
    pub kind: TournamentKind,
    /// Bracket format
    pub format: TournamentFormat,
    /// Team ceiling (required for team tournaments)
    pub max_teams: Option<u32>,
    /// Player ceiling (required for solo tournaments)
    pub max_players: Option<u32>,
    /// Registration closes and the bracket may be generated at this instant
    pub start_date: DateTime<Utc>,
    /// Optional scheduled end
    pub end_date: Option<DateTime<Utc>>,
}

impl TournamentConfig {
    /// Single-elimination tournament with no ceilings set yet
    pub fn single_elimination(name: String, kind: TournamentKind, start_date: DateTime<Utc>) -> Self {
        Self {
            name,
            kind,
            format: TournamentFormat::SingleElimination,
            max_teams: None,
            max_players: None,
            start_date,
            end_date: None,
        }
    }

    pub fn with_max_teams(mut self, max_teams: u32) -> Self {
        self.max_teams = Some(max_teams);
        self
    }

    pub fn with_max_players(mut self, max_players: u32) -> Self {
        self.max_players = Some(max_players);
        self
    }

    pub fn with_end_date(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Validate the configuration before the tournament record is created
    pub fn validate(&self) -> TournamentResult<()> {
        if self.name.trim().is_empty() {
            return Err(TournamentError::InvalidConfig(
                "name must not be empty".to_string(),
            ));
        }

        match self.kind {
            TournamentKind::Team if self.max_teams.unwrap_or(0) < 2 => {
                return Err(TournamentError::InvalidConfig(
                    "team tournaments need max_teams of at least 2".to_string(),
                ));
            }
            TournamentKind::Solo if self.max_players.unwrap_or(0) < 2 => {
                return Err(TournamentError::InvalidConfig(
                    "solo tournaments need max_players of at least 2".to_string(),
                ));
            }
            TournamentKind::Mixed => {
                if self.max_teams.is_none() && self.max_players.is_none() {
                    return Err(TournamentError::InvalidConfig(
                        "mixed tournaments need max_teams or max_players".to_string(),
                    ));
                }
                if self.max_teams.unwrap_or(0) + self.max_players.unwrap_or(0) < 2 {
                    return Err(TournamentError::InvalidConfig(
                        "mixed tournaments need room for at least 2 participants".to_string(),
                    ));
                }
            }
            _ => {}
        }

        if let Some(end_date) = self.end_date
            && end_date <= self.start_date
        {
            return Err(TournamentError::InvalidConfig(
                "end_date must be after start_date".to_string(),
            ));
        }

        Ok(())
    }
}

/// Tournament record as held by the store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TournamentKind,
    pub format: TournamentFormat,
    pub status: TournamentStatus,
    pub max_teams: Option<u32>,
    pub max_players: Option<u32>,
    pub registered_teams: Vec<TeamId>,
    pub registered_players: Vec<UserId>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub bracket: Option<Bracket>,
    pub champion: Option<Participant>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Commit counter maintained by the store
    pub version: u64,
}

impl Tournament {
    /// Create a tournament in the registration phase
    pub fn new(id: TournamentId, config: TournamentConfig, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: config.name,
            kind: config.kind,
            format: config.format,
            status: TournamentStatus::Registration,
            max_teams: config.max_teams,
            max_players: config.max_players,
            registered_teams: Vec::new(),
            registered_players: Vec::new(),
            start_date: config.start_date,
            end_date: config.end_date,
            bracket: None,
            champion: None,
            created_at,
            started_at: None,
            completed_at: None,
            version: 0,
        }
    }

    /// Number of admitted participants, always derived from the two sets
    pub fn participant_count(&self) -> usize {
        self.registered_teams.len() + self.registered_players.len()
    }

    /// Admission ceiling for the tournament's participant mode
    pub fn capacity(&self) -> usize {
        let teams = self.max_teams.unwrap_or(0) as usize;
        let players = self.max_players.unwrap_or(0) as usize;
        match self.kind {
            TournamentKind::Team => teams,
            TournamentKind::Solo => players,
            TournamentKind::Mixed => teams + players,
        }
    }

    /// Whether the tournament accepts this kind of participant
    pub fn accepts(&self, kind: ParticipantKind) -> bool {
        matches!(
            (self.kind, kind),
            (TournamentKind::Mixed, _)
                | (TournamentKind::Team, ParticipantKind::Team)
                | (TournamentKind::Solo, ParticipantKind::Player)
        )
    }

    pub fn is_registered(&self, participant: &Participant) -> bool {
        match participant {
            Participant::Team(id) => self.registered_teams.contains(id),
            Participant::Player(id) => self.registered_players.contains(id),
        }
    }

    /// Registered participants as a tagged list, teams first
    pub fn participants(&self) -> Vec<Participant> {
        self.registered_teams
            .iter()
            .copied()
            .map(Participant::Team)
            .chain(self.registered_players.iter().copied().map(Participant::Player))
            .collect()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            TournamentStatus::Completed | TournamentStatus::Cancelled
        )
    }

    /// Check the standing invariants of a proposed next state
    ///
    /// Called on the mutated copy before it is committed, so a violation
    /// aborts the whole mutation.
    pub fn check_invariants(&self) -> TournamentResult<()> {
        let unique_teams: HashSet<_> = self.registered_teams.iter().collect();
        let unique_players: HashSet<_> = self.registered_players.iter().collect();
        if unique_teams.len() != self.registered_teams.len()
            || unique_players.len() != self.registered_players.len()
        {
            return Err(TournamentError::Corrupted(format!(
                "duplicate registration in tournament {}",
                self.id
            )));
        }

        if self.status == TournamentStatus::Registration
            && self.participant_count() > self.capacity()
        {
            return Err(TournamentError::Corrupted(format!(
                "tournament {} holds {} participants over capacity {}",
                self.id,
                self.participant_count(),
                self.capacity()
            )));
        }

        let needs_bracket = matches!(
            self.status,
            TournamentStatus::InProgress | TournamentStatus::Completed
        );
        if needs_bracket && self.bracket.is_none() {
            return Err(TournamentError::Corrupted(format!(
                "tournament {} is {} without a bracket",
                self.id, self.status
            )));
        }

        if self.status == TournamentStatus::Completed && self.champion.is_none() {
            return Err(TournamentError::Corrupted(format!(
                "tournament {} completed without a champion",
                self.id
            )));
        }

        Ok(())
    }

    /// Read-model snapshot handed to callers
    pub fn view(&self) -> TournamentView {
        TournamentView {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            format: self.format,
            status: self.status,
            max_teams: self.max_teams,
            max_players: self.max_players,
            registered_teams: self.registered_teams.clone(),
            registered_players: self.registered_players.clone(),
            participant_count: self.participant_count(),
            start_date: self.start_date,
            end_date: self.end_date,
            bracket: self.bracket.as_ref().map(Bracket::view),
            champion: self.champion,
            started_at: self.started_at,
            completed_at: self.completed_at,
        }
    }
}

/// JSON-serializable tournament snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentView {
    pub id: TournamentId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TournamentKind,
    pub format: TournamentFormat,
    pub status: TournamentStatus,
    pub max_teams: Option<u32>,
    pub max_players: Option<u32>,
    pub registered_teams: Vec<TeamId>,
    pub registered_players: Vec<UserId>,
    pub participant_count: usize,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub bracket: Option<BracketView>,
    pub champion: Option<Participant>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn config(kind: TournamentKind) -> TournamentConfig {
        TournamentConfig::single_elimination(
            "Friday Cup".to_string(),
            kind,
            Utc::now() + Duration::days(1),
        )
    }

    #[test]
    fn test_capacity_by_kind() {
        let now = Utc::now();
        let team = Tournament::new(Uuid::new_v4(), config(TournamentKind::Team).with_max_teams(8), now);
        assert_eq!(team.capacity(), 8);

        let solo = Tournament::new(
            Uuid::new_v4(),
            config(TournamentKind::Solo).with_max_players(16).with_max_teams(4),
            now,
        );
        assert_eq!(solo.capacity(), 16);

        let mixed = Tournament::new(
            Uuid::new_v4(),
            config(TournamentKind::Mixed).with_max_players(6).with_max_teams(4),
            now,
        );
        assert_eq!(mixed.capacity(), 10);
    }

    #[test]
    fn test_config_validation() {
        assert!(config(TournamentKind::Team).with_max_teams(8).validate().is_ok());
        assert!(config(TournamentKind::Team).validate().is_err());
        assert!(config(TournamentKind::Solo).with_max_players(1).validate().is_err());
        assert!(config(TournamentKind::Mixed).validate().is_err());
        assert!(config(TournamentKind::Mixed).with_max_players(2).validate().is_ok());

        let base = config(TournamentKind::Solo).with_max_players(8);
        let before_start = base.start_date - Duration::hours(1);
        assert!(matches!(
            base.with_end_date(before_start).validate(),
            Err(TournamentError::InvalidConfig(_))
        ));

        let mut unnamed = config(TournamentKind::Solo).with_max_players(8);
        unnamed.name = "  ".to_string();
        assert!(unnamed.validate().is_err());
    }

    #[test]
    fn test_participants_teams_first() {
        let mut tournament = Tournament::new(
            Uuid::new_v4(),
            config(TournamentKind::Mixed).with_max_teams(4).with_max_players(4),
            Utc::now(),
        );
        let player = Uuid::new_v4();
        let team = Uuid::new_v4();
        tournament.registered_players.push(player);
        tournament.registered_teams.push(team);

        assert_eq!(
            tournament.participants(),
            vec![Participant::Team(team), Participant::Player(player)]
        );
        assert_eq!(tournament.participant_count(), 2);
    }

    #[test]
    fn test_invariants_reject_duplicates() {
        let mut tournament = Tournament::new(
            Uuid::new_v4(),
            config(TournamentKind::Solo).with_max_players(4),
            Utc::now(),
        );
        let player = Uuid::new_v4();
        tournament.registered_players.push(player);
        assert!(tournament.check_invariants().is_ok());

        tournament.registered_players.push(player);
        let err = tournament.check_invariants().unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_participant_serializes_tagged() {
        let id = Uuid::new_v4();
        let value = serde_json::to_value(Participant::Team(id)).unwrap();
        assert_eq!(value["kind"], "team");
        assert_eq!(value["id"], id.to_string());
    }

    #[test]
    fn test_view_reports_derived_count() {
        let mut tournament = Tournament::new(
            Uuid::new_v4(),
            config(TournamentKind::Team).with_max_teams(4),
            Utc::now(),
        );
        tournament.registered_teams.push(Uuid::new_v4());
        tournament.registered_teams.push(Uuid::new_v4());

        let value = serde_json::to_value(tournament.view()).unwrap();
        assert_eq!(value["participantCount"], 2);
        assert_eq!(value["type"], "team");
        assert_eq!(value["status"], "registration");
    }
}
