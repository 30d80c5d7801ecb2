//! Registration rules applied to a tournament inside a store commit.

use super::{
    errors::{TournamentError, TournamentResult},
    models::{Participant, Tournament, TournamentKind, TournamentStatus},
};
use chrono::{DateTime, Utc};

fn ensure_open(tournament: &Tournament, now: DateTime<Utc>) -> TournamentResult<()> {
    if tournament.status != TournamentStatus::Registration || now >= tournament.start_date {
        return Err(TournamentError::RegistrationClosed);
    }
    Ok(())
}

/// Admit a participant
///
/// Checks run in order: registration open, not already present, kind accepted,
/// capacity left. Nothing is written unless every check passes.
pub fn admit(
    tournament: &mut Tournament,
    participant: Participant,
    now: DateTime<Utc>,
) -> TournamentResult<()> {
    ensure_open(tournament, now)?;

    if tournament.is_registered(&participant) {
        return Err(TournamentError::AlreadyRegistered(participant));
    }

    if !tournament.accepts(participant.kind()) {
        return Err(TournamentError::ParticipantKindMismatch {
            participant,
            kind: tournament.kind,
        });
    }

    let used = match tournament.kind {
        TournamentKind::Team => tournament.registered_teams.len(),
        TournamentKind::Solo => tournament.registered_players.len(),
        TournamentKind::Mixed => tournament.participant_count(),
    };
    let capacity = tournament.capacity();
    if used >= capacity {
        return Err(TournamentError::CapacityExceeded { capacity });
    }

    match participant {
        Participant::Team(id) => tournament.registered_teams.push(id),
        Participant::Player(id) => tournament.registered_players.push(id),
    }
    Ok(())
}

/// Remove a participant while registration is still open
pub fn remove(
    tournament: &mut Tournament,
    participant: Participant,
    now: DateTime<Utc>,
) -> TournamentResult<()> {
    ensure_open(tournament, now)?;

    let set = match participant {
        Participant::Team(_) => &mut tournament.registered_teams,
        Participant::Player(_) => &mut tournament.registered_players,
    };
    let before = set.len();
    set.retain(|id| *id != participant.id());
    if set.len() == before {
        return Err(TournamentError::NotRegistered(participant));
    }
    Ok(())
}

/// Cancel a tournament that has not finished
pub fn cancel(tournament: &mut Tournament) -> TournamentResult<()> {
    if tournament.is_terminal() {
        return Err(TournamentError::InvalidState(format!(
            "tournament is already {}",
            tournament.status
        )));
    }
    tournament.status = TournamentStatus::Cancelled;
    Ok(())
}
