//! Match result recording and winner advancement.

use super::models::{Bracket, MatchStatus};
use crate::tournament::{
    errors::{TournamentError, TournamentResult},
    models::{Participant, Tournament, TournamentStatus},
};
use chrono::{DateTime, Utc};

fn bracket_mut(tournament: &mut Tournament) -> TournamentResult<&mut Bracket> {
    if tournament.status != TournamentStatus::InProgress {
        return Err(TournamentError::InvalidState(format!(
            "tournament is {}",
            tournament.status
        )));
    }

    let id = tournament.id;
    tournament
        .bracket
        .as_mut()
        .ok_or_else(|| TournamentError::Corrupted(format!("tournament {} has no bracket", id)))
}

/// Mark a ready match as being played
pub fn begin_match(tournament: &mut Tournament, match_number: u32) -> TournamentResult<()> {
    let bracket = bracket_mut(tournament)?;
    let m = bracket
        .find_mut(match_number)
        .ok_or(TournamentError::MatchNotFound(match_number))?;

    if m.status != MatchStatus::Pending {
        return Err(TournamentError::InvalidState(format!(
            "match {} is not pending",
            match_number
        )));
    }
    if !m.is_ready() {
        return Err(TournamentError::InvalidState(format!(
            "match {} is waiting for participants",
            match_number
        )));
    }

    m.status = MatchStatus::InProgress;
    Ok(())
}

/// Record the result of a played match and advance the winner
///
/// Completing the final match completes the tournament in the same step.
pub fn record_result(
    tournament: &mut Tournament,
    match_number: u32,
    score1: u32,
    score2: u32,
    winner: Participant,
    now: DateTime<Utc>,
) -> TournamentResult<()> {
    let tournament_id = tournament.id;
    let bracket = bracket_mut(tournament)?;
    let m = bracket
        .find_mut(match_number)
        .ok_or(TournamentError::MatchNotFound(match_number))?;

    if m.is_completed() {
        return Err(TournamentError::InvalidState(format!(
            "match {} is already completed",
            match_number
        )));
    }
    if !m.is_ready() {
        return Err(TournamentError::InvalidState(format!(
            "match {} is waiting for participants",
            match_number
        )));
    }
    if !m.has_participant(&winner) {
        return Err(TournamentError::InvalidWinner {
            match_number,
            winner,
        });
    }

    m.score1 = score1;
    m.score2 = score2;
    m.winner = Some(winner);
    m.status = MatchStatus::Completed;

    let destination = advance(bracket, match_number, winner)?;

    match destination {
        Some(next) => {
            log::info!(
                "Tournament {}: {} won match {}, advances to match {}",
                tournament_id,
                winner,
                match_number,
                next
            );
        }
        None => {
            tournament.status = TournamentStatus::Completed;
            tournament.champion = Some(winner);
            tournament.completed_at = Some(now);
            log::info!(
                "Tournament {} completed, champion {}",
                tournament_id,
                winner
            );
        }
    }

    Ok(())
}

/// Write `winner` of `match_number` into its next-round slot
///
/// Returns the destination match number, or `None` when the match is the
/// final. An occupied destination is structural corruption.
pub(crate) fn advance(
    bracket: &mut Bracket,
    match_number: u32,
    winner: Participant,
) -> TournamentResult<Option<u32>> {
    let (round, position) = bracket
        .locate(match_number)
        .ok_or(TournamentError::MatchNotFound(match_number))?;

    if round >= bracket.rounds {
        return Ok(None);
    }

    let destination = bracket
        .matches
        .iter_mut()
        .filter(|m| m.round == round + 1)
        .nth(position / 2)
        .ok_or_else(|| {
            TournamentError::Corrupted(format!(
                "no round {} match at position {}",
                round + 1,
                position / 2
            ))
        })?;

    if destination.slot1.is_none() {
        destination.slot1 = Some(winner);
    } else if destination.slot2.is_none() {
        destination.slot2 = Some(winner);
    } else {
        return Err(TournamentError::DestinationSlotOccupied {
            round: destination.round,
            match_number: destination.match_number,
        });
    }

    Ok(Some(destination.match_number))
}
