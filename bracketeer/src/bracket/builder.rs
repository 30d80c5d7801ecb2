//! Single-elimination bracket generation.

use super::{
    models::{Bracket, Match, MatchStatus},
    progression,
    random::RandomSource,
};
use crate::tournament::{
    errors::{TournamentError, TournamentResult},
    models::{Participant, Tournament, TournamentFormat, TournamentStatus},
};
use chrono::{DateTime, Utc};

/// Minimum entrants for a bracket
pub const MIN_PARTICIPANTS: usize = 2;

/// Generate the bracket for a tournament that is ready to start
///
/// # Arguments
///
/// * `tournament` - Tournament still in registration
/// * `now` - Current time, must be at or past the start date
/// * `random` - Source used to shuffle the entrants
///
/// # Returns
///
/// * `TournamentResult<Bracket>` - Full topology with byes resolved
pub fn generate(
    tournament: &Tournament,
    now: DateTime<Utc>,
    random: &dyn RandomSource,
) -> TournamentResult<Bracket> {
    if tournament.status != TournamentStatus::Registration {
        return Err(TournamentError::NotStartable(format!(
            "tournament is {}",
            tournament.status
        )));
    }

    if tournament.format != TournamentFormat::SingleElimination {
        return Err(TournamentError::NotStartable(format!(
            "{} brackets are not supported",
            tournament.format
        )));
    }

    if now < tournament.start_date {
        return Err(TournamentError::NotStartable(
            "start date has not been reached".to_string(),
        ));
    }

    let count = tournament.participant_count();
    if count < MIN_PARTICIPANTS {
        return Err(TournamentError::InsufficientParticipants {
            needed: MIN_PARTICIPANTS,
            current: count,
        });
    }

    let mut entries = tournament.participants();
    random.shuffle(&mut entries);
    layout(entries)
}

/// Generate the bracket and move the tournament into play
pub fn start(
    tournament: &mut Tournament,
    now: DateTime<Utc>,
    random: &dyn RandomSource,
) -> TournamentResult<()> {
    let bracket = generate(tournament, now, random)?;

    log::info!(
        "Tournament {} bracket generated: {} rounds, {} matches, {} byes",
        tournament.id,
        bracket.rounds,
        bracket.matches.len(),
        bracket.bye_count()
    );

    tournament.bracket = Some(bracket);
    tournament.status = TournamentStatus::InProgress;
    tournament.started_at = Some(now);
    Ok(())
}

/// Lay out entries in the given order as a single-elimination bracket
///
/// The first `byes` round-1 pairs each hold one entrant and an empty slot, so
/// no pair is ever empty on both sides. Bye winners are already written into
/// round 2 when this returns.
pub fn layout(entries: Vec<Participant>) -> TournamentResult<Bracket> {
    let count = entries.len();
    if count < MIN_PARTICIPANTS {
        return Err(TournamentError::InsufficientParticipants {
            needed: MIN_PARTICIPANTS,
            current: count,
        });
    }

    let size = count.next_power_of_two();
    let byes = size - count;
    let rounds = size.trailing_zeros();

    let mut entries = entries.into_iter();
    let mut matches = Vec::with_capacity(size - 1);
    let mut match_number = 0u32;

    for pair in 0..size / 2 {
        let slot1 = entries.next();
        let slot2 = if pair < byes { None } else { entries.next() };

        if slot1.is_none() && slot2.is_none() {
            log::warn!("Skipping empty round 1 pairing at position {}", pair);
            continue;
        }

        match_number += 1;
        let mut m = Match {
            slot1,
            slot2,
            ..Match::placeholder(1, match_number)
        };

        if let (Some(only), None) | (None, Some(only)) = (slot1, slot2) {
            m.is_bye = true;
            m.winner = Some(only);
            m.status = MatchStatus::Completed;
            if slot1.is_some() {
                m.score1 = 1;
            } else {
                m.score2 = 1;
            }
        }

        matches.push(m);
    }

    for round in 2..=rounds {
        for _ in 0..(size >> round) {
            match_number += 1;
            matches.push(Match::placeholder(round, match_number));
        }
    }

    let mut bracket = Bracket { rounds, matches };

    let bye_winners: Vec<(u32, Participant)> = bracket
        .matches
        .iter()
        .filter(|m| m.is_bye)
        .filter_map(|m| Some((m.match_number, m.winner?)))
        .collect();
    for (number, winner) in bye_winners {
        progression::advance(&mut bracket, number, winner)?;
    }

    Ok(bracket)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::random::SeededRandom;
    use crate::tournament::models::{TournamentConfig, TournamentKind};
    use chrono::Duration;
    use uuid::Uuid;

    fn players(n: usize) -> Vec<Participant> {
        (0..n).map(|_| Participant::Player(Uuid::new_v4())).collect()
    }

    fn ready_tournament(n: usize) -> Tournament {
        let config = TournamentConfig::single_elimination(
            "Builder Cup".to_string(),
            TournamentKind::Solo,
            Utc::now() - Duration::minutes(1),
        )
        .with_max_players(n as u32);
        let mut tournament = Tournament::new(Uuid::new_v4(), config, Utc::now());
        tournament.registered_players = (0..n).map(|_| Uuid::new_v4()).collect();
        tournament
    }

    #[test]
    fn test_eight_entrants_no_byes() {
        let bracket = layout(players(8)).unwrap();
        assert_eq!(bracket.rounds, 3);
        assert_eq!(bracket.matches.len(), 7);
        assert_eq!(bracket.round(1).count(), 4);
        assert_eq!(bracket.bye_count(), 0);
        assert!(bracket.round(1).all(|m| m.status == MatchStatus::Pending && m.is_ready()));
    }

    #[test]
    fn test_six_entrants_two_byes() {
        let entries = players(6);
        let bracket = layout(entries.clone()).unwrap();

        assert_eq!(bracket.rounds, 3);
        assert_eq!(bracket.matches.len(), 7);

        let round1: Vec<&Match> = bracket.round(1).collect();
        assert_eq!(round1.len(), 4);
        assert_eq!(round1.iter().filter(|m| m.is_bye).count(), 2);
        assert_eq!(
            round1
                .iter()
                .filter(|m| !m.is_bye && m.status == MatchStatus::Pending)
                .count(),
            2
        );

        for bye in round1.iter().filter(|m| m.is_bye) {
            assert_eq!(bye.status, MatchStatus::Completed);
            assert_eq!((bye.score1, bye.score2), (1, 0));
            assert_eq!(bye.winner, bye.slot1);
        }

        // Both byes feed round 2 match one, which is ready without a played game
        let first_semi = bracket.round(2).next().unwrap();
        assert_eq!(first_semi.slot1, Some(entries[0]));
        assert_eq!(first_semi.slot2, Some(entries[1]));
    }

    #[test]
    fn test_sixty_four_entrants() {
        let bracket = layout(players(64)).unwrap();
        assert_eq!(bracket.rounds, 6);
        assert_eq!(bracket.matches.len(), 63);
    }

    #[test]
    fn test_two_entrants_single_final() {
        let bracket = layout(players(2)).unwrap();
        assert_eq!(bracket.rounds, 1);
        assert_eq!(bracket.matches.len(), 1);
        assert_eq!(bracket.final_match().unwrap().match_number, 1);
    }

    #[test]
    fn test_match_numbers_increase_by_round() {
        let bracket = layout(players(13)).unwrap();
        let numbers: Vec<u32> = bracket.matches.iter().map(|m| m.match_number).collect();
        assert_eq!(numbers, (1..=15).collect::<Vec<_>>());
        assert!(bracket.matches.windows(2).all(|w| w[0].round <= w[1].round));
    }

    #[test]
    fn test_generate_rejects_early_start() {
        let mut tournament = ready_tournament(4);
        tournament.start_date = Utc::now() + Duration::hours(1);
        let result = generate(&tournament, Utc::now(), &SeededRandom::new(1));
        assert!(matches!(result, Err(TournamentError::NotStartable(_))));
    }

    #[test]
    fn test_generate_rejects_single_entrant() {
        let tournament = ready_tournament(1);
        let result = generate(&tournament, Utc::now(), &SeededRandom::new(1));
        assert!(matches!(
            result,
            Err(TournamentError::InsufficientParticipants {
                needed: 2,
                current: 1
            })
        ));
    }

    #[test]
    fn test_generate_rejects_other_formats() {
        let mut tournament = ready_tournament(4);
        tournament.format = TournamentFormat::RoundRobin;
        let result = generate(&tournament, Utc::now(), &SeededRandom::new(1));
        assert!(matches!(result, Err(TournamentError::NotStartable(_))));
    }

    #[test]
    fn test_start_is_deterministic_for_a_seed() {
        let tournament = ready_tournament(10);
        let now = Utc::now();

        let mut a = tournament.clone();
        let mut b = tournament.clone();
        start(&mut a, now, &SeededRandom::new(99)).unwrap();
        start(&mut b, now, &SeededRandom::new(99)).unwrap();

        assert_eq!(a.bracket, b.bracket);
        assert_eq!(a.status, TournamentStatus::InProgress);
        assert_eq!(a.started_at, Some(now));

        // A started tournament cannot be generated again
        assert!(matches!(
            start(&mut a, now, &SeededRandom::new(99)),
            Err(TournamentError::NotStartable(_))
        ));
    }
}
