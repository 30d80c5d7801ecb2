//! Bracket and match data models.

use crate::tournament::models::{Participant, ParticipantKind, TeamId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Match lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    InProgress,
    Completed,
}

/// A single elimination match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// 1-indexed round
    pub round: u32,
    /// Unique within the tournament, assigned round by round
    pub match_number: u32,
    pub slot1: Option<Participant>,
    pub slot2: Option<Participant>,
    pub score1: u32,
    pub score2: u32,
    pub winner: Option<Participant>,
    pub status: MatchStatus,
    /// Auto-completed round-1 match with a single entrant
    pub is_bye: bool,
}

impl Match {
    /// Empty match waiting for winners from the previous round
    pub fn placeholder(round: u32, match_number: u32) -> Self {
        Self {
            round,
            match_number,
            slot1: None,
            slot2: None,
            score1: 0,
            score2: 0,
            winner: None,
            status: MatchStatus::Pending,
            is_bye: false,
        }
    }

    /// Both slots are filled
    pub fn is_ready(&self) -> bool {
        self.slot1.is_some() && self.slot2.is_some()
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    pub fn has_participant(&self, participant: &Participant) -> bool {
        self.slot1.as_ref() == Some(participant) || self.slot2.as_ref() == Some(participant)
    }

    /// The slot occupant who did not win, for completed matches
    pub fn loser(&self) -> Option<Participant> {
        let winner = self.winner?;
        [self.slot1, self.slot2]
            .into_iter()
            .flatten()
            .find(|p| *p != winner)
    }

    /// Wire representation
    pub fn view(&self) -> MatchView {
        MatchView {
            round: self.round,
            match_number: self.match_number,
            team1: team_ref(self.slot1),
            team2: team_ref(self.slot2),
            player1: player_ref(self.slot1),
            player2: player_ref(self.slot2),
            score1: self.score1,
            score2: self.score2,
            winner: self.winner.map(|w| w.id()),
            winner_type: self.winner.map(|w| w.kind()),
            status: self.status,
        }
    }
}

fn team_ref(slot: Option<Participant>) -> Option<TeamId> {
    match slot {
        Some(Participant::Team(id)) => Some(id),
        _ => None,
    }
}

fn player_ref(slot: Option<Participant>) -> Option<UserId> {
    match slot {
        Some(Participant::Player(id)) => Some(id),
        _ => None,
    }
}

/// Full match topology of one tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub rounds: u32,
    /// Ordered by `match_number`
    pub matches: Vec<Match>,
}

impl Bracket {
    pub fn find(&self, match_number: u32) -> Option<&Match> {
        self.matches.iter().find(|m| m.match_number == match_number)
    }

    pub fn find_mut(&mut self, match_number: u32) -> Option<&mut Match> {
        self.matches
            .iter_mut()
            .find(|m| m.match_number == match_number)
    }

    /// Matches of one round in position order
    pub fn round(&self, round: u32) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(move |m| m.round == round)
    }

    /// Round and 0-indexed position within that round
    pub fn locate(&self, match_number: u32) -> Option<(u32, usize)> {
        let found = self.find(match_number)?;
        let position = self
            .round(found.round)
            .position(|m| m.match_number == match_number)?;
        Some((found.round, position))
    }

    /// The single match of the last round
    pub fn final_match(&self) -> Option<&Match> {
        self.round(self.rounds).next()
    }

    pub fn bye_count(&self) -> usize {
        self.matches.iter().filter(|m| m.is_bye).count()
    }

    /// Wins and losses derived from completed, played matches
    pub fn record_for(&self, participant: &Participant) -> Record {
        self.matches
            .iter()
            .filter(|m| m.is_completed() && !m.is_bye && m.has_participant(participant))
            .fold(Record::default(), |mut record, m| {
                if m.winner.as_ref() == Some(participant) {
                    record.wins += 1;
                } else {
                    record.losses += 1;
                }
                record
            })
    }

    pub fn view(&self) -> BracketView {
        BracketView {
            rounds: self.rounds,
            matches: self.matches.iter().map(Match::view).collect(),
        }
    }
}

/// Win/loss tally derived on read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub wins: u32,
    pub losses: u32,
}

impl Record {
    pub fn games(&self) -> u32 {
        self.wins + self.losses
    }

    /// Fraction of games won, 0 when nothing has been played
    pub fn win_rate(&self) -> f64 {
        match self.games() {
            0 => 0.0,
            games => f64::from(self.wins) / f64::from(games),
        }
    }
}

/// Serialized match
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    pub round: u32,
    pub match_number: u32,
    pub team1: Option<TeamId>,
    pub team2: Option<TeamId>,
    pub player1: Option<UserId>,
    pub player2: Option<UserId>,
    pub score1: u32,
    pub score2: u32,
    pub winner: Option<Uuid>,
    pub winner_type: Option<ParticipantKind>,
    pub status: MatchStatus,
}

impl MatchView {
    /// First slot as a typed participant
    pub fn slot1(&self) -> Option<Participant> {
        self.team1
            .map(Participant::Team)
            .or(self.player1.map(Participant::Player))
    }

    /// Second slot as a typed participant
    pub fn slot2(&self) -> Option<Participant> {
        self.team2
            .map(Participant::Team)
            .or(self.player2.map(Participant::Player))
    }

    pub fn winner(&self) -> Option<Participant> {
        Some(Participant::new(self.winner_type?, self.winner?))
    }
}

/// Serialized bracket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BracketView {
    pub rounds: u32,
    pub matches: Vec<MatchView>,
}
