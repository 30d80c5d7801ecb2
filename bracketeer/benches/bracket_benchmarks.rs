use bracketeer::bracket::{SeededRandom, generate, layout, record_result};
use bracketeer::tournament::{Participant, Tournament, TournamentConfig, TournamentKind};
use chrono::{Duration, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use uuid::Uuid;

/// Helper to create a solo tournament with N registered players, ready to start
fn setup_tournament(n_players: usize) -> Tournament {
    let config = TournamentConfig::single_elimination(
        "Bench Cup".to_string(),
        TournamentKind::Solo,
        Utc::now() - Duration::minutes(1),
    )
    .with_max_players(n_players as u32);

    let mut tournament = Tournament::new(Uuid::new_v4(), config, Utc::now());
    tournament.registered_players = (0..n_players).map(|_| Uuid::new_v4()).collect();
    tournament
}

/// Benchmark shuffle plus layout for different field sizes
fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    let random = SeededRandom::new(1);

    for n in [8usize, 64, 300, 1024] {
        let tournament = setup_tournament(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &tournament, |b, t| {
            b.iter(|| generate(black_box(t), Utc::now(), &random));
        });
    }

    group.finish();
}

/// Benchmark layout alone with a bye-heavy field (one over a power of two)
fn bench_layout_with_byes(c: &mut Criterion) {
    let entrants: Vec<Participant> = (0..257).map(|_| Participant::Player(Uuid::new_v4())).collect();

    c.bench_function("layout_257_entrants", |b| {
        b.iter(|| layout(black_box(entrants.clone())));
    });
}

/// Benchmark playing a 64-player bracket to completion
fn bench_full_progression(c: &mut Criterion) {
    let mut tournament = setup_tournament(64);
    let now = Utc::now();
    bracketeer::bracket::start(&mut tournament, now, &SeededRandom::new(3)).unwrap();

    c.bench_function("progress_64_players", |b| {
        b.iter(|| {
            let mut t = tournament.clone();
            let rounds = t.bracket.as_ref().map(|br| br.rounds).unwrap_or(0);
            for round in 1..=rounds {
                let pending: Vec<(u32, Participant)> = t
                    .bracket
                    .as_ref()
                    .unwrap()
                    .round(round)
                    .filter(|m| !m.is_completed())
                    .map(|m| (m.match_number, m.slot1.unwrap()))
                    .collect();
                for (number, winner) in pending {
                    record_result(&mut t, number, 1, 0, winner, now).unwrap();
                }
            }
            black_box(t)
        });
    });
}

criterion_group!(
    benches,
    bench_generate,
    bench_layout_with_byes,
    bench_full_progression
);
criterion_main!(benches);
