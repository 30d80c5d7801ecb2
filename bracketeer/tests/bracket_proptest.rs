/// Property-based tests for bracket generation using proptest
///
/// These tests verify the structural guarantees of a generated bracket for
/// every entrant count from 2 to 300.
use bracketeer::bracket::{MatchStatus, SeededRandom, generate, layout};
use bracketeer::tournament::{Participant, Tournament, TournamentConfig, TournamentKind};
use chrono::{Duration, Utc};
use proptest::prelude::*;
use std::collections::HashMap;
use uuid::Uuid;

// Strategy for a list of distinct entrants, teams and players mixed
fn entrants_strategy() -> impl Strategy<Value = Vec<Participant>> {
    prop::collection::vec(any::<bool>(), 2..=300).prop_map(|kinds| {
        kinds
            .into_iter()
            .map(|is_team| {
                if is_team {
                    Participant::Team(Uuid::new_v4())
                } else {
                    Participant::Player(Uuid::new_v4())
                }
            })
            .collect()
    })
}

// Helper to build a mixed tournament ready to start with the given entrants
fn ready_tournament(entrants: &[Participant]) -> Tournament {
    let config = TournamentConfig::single_elimination(
        "Property Cup".to_string(),
        TournamentKind::Mixed,
        Utc::now() - Duration::minutes(5),
    )
    .with_max_teams(entrants.len() as u32)
    .with_max_players(entrants.len() as u32);

    let mut tournament = Tournament::new(Uuid::new_v4(), config, Utc::now());
    for entrant in entrants {
        match entrant {
            Participant::Team(id) => tournament.registered_teams.push(*id),
            Participant::Player(id) => tournament.registered_players.push(*id),
        }
    }
    tournament
}

proptest! {
    #[test]
    fn test_bracket_shape(entrants in entrants_strategy(), seed in any::<u64>()) {
        let n = entrants.len();
        let tournament = ready_tournament(&entrants);
        let bracket = generate(&tournament, Utc::now(), &SeededRandom::new(seed)).unwrap();

        let size = n.next_power_of_two();
        prop_assert_eq!(bracket.rounds, size.trailing_zeros());
        prop_assert_eq!(bracket.matches.len(), size - 1);
        prop_assert_eq!(bracket.bye_count(), size - n);

        // Every round halves the previous one
        for round in 1..=bracket.rounds {
            prop_assert_eq!(bracket.round(round).count(), size >> round);
        }
    }

    #[test]
    fn test_every_entrant_seeded_once(entrants in entrants_strategy(), seed in any::<u64>()) {
        let tournament = ready_tournament(&entrants);
        let bracket = generate(&tournament, Utc::now(), &SeededRandom::new(seed)).unwrap();

        let mut seen: HashMap<Participant, usize> = HashMap::new();
        for m in bracket.round(1) {
            prop_assert!(m.slot1.is_some() || m.slot2.is_some(), "double-empty pairing");
            for p in [m.slot1, m.slot2].into_iter().flatten() {
                *seen.entry(p).or_default() += 1;
            }
        }

        prop_assert_eq!(seen.len(), entrants.len());
        prop_assert!(seen.values().all(|count| *count == 1));
    }

    #[test]
    fn test_byes_resolved_and_numbers_ordered(entrants in entrants_strategy()) {
        let n = entrants.len();
        let bracket = layout(entrants).unwrap();

        for m in bracket.matches.iter().filter(|m| m.is_bye) {
            prop_assert_eq!(m.round, 1);
            prop_assert_eq!(m.status, MatchStatus::Completed);
            prop_assert!(m.winner.is_some());
        }

        let numbers: Vec<u32> = bracket.matches.iter().map(|m| m.match_number).collect();
        let expected: Vec<u32> = (1..=(n.next_power_of_two() as u32 - 1)).collect();
        prop_assert_eq!(numbers, expected);

        // Round 2 holds exactly one seat per bye winner before any game is played
        let seated: usize = bracket
            .round(2)
            .map(|m| usize::from(m.slot1.is_some()) + usize::from(m.slot2.is_some()))
            .sum();
        prop_assert_eq!(seated, bracket.bye_count());
    }
}
