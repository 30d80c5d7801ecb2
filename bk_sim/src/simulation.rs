//! End-to-end tournament simulation.
//!
//! Drives one tournament through the engine: throttled registration, bracket
//! generation, every match of every round, then the champion's reward grant,
//! claim and withdrawal.

use std::sync::{Arc, Mutex};

use anyhow::{Context, bail};
use bracketeer::bracket::{RandomSource, SeededRandom, ThreadRandom};
use bracketeer::clock::{Clock, SystemClock};
use bracketeer::reward::{
    CurrencyDetails, Reward, RewardLedger, RewardType, TeamReward, WithdrawalReceipt,
};
use bracketeer::store::MemoryStore;
use bracketeer::{
    MatchStatus, Participant, TournamentConfig, TournamentError, TournamentKind,
    TournamentManager, TournamentStatus, TournamentView,
};
use chrono::Duration as ChronoDuration;
use rand::{Rng, SeedableRng, rngs::StdRng};
use uuid::Uuid;

use crate::config::SimConfig;
use crate::throttle::RegistrationThrottle;

/// Share split used when a team wins
const TEAM_SHARES: [u32; 3] = [50, 30, 20];

const START_MARGIN: std::time::Duration = std::time::Duration::from_millis(20);

/// Outcome of the registration phase
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationTally {
    pub admitted: usize,
    pub duplicates: usize,
    pub full: usize,
    pub late: usize,
    pub throttled: usize,
}

/// Everything a finished simulation produced
#[derive(Debug)]
pub struct SimulationReport {
    pub tournament: TournamentView,
    pub registration: RegistrationTally,
    pub matches_played: usize,
    /// Withdrawals made by a solo champion
    pub receipts: Vec<WithdrawalReceipt>,
    /// Reward split among the members of a team champion
    pub team_reward: Option<TeamReward>,
}

/// A configured simulation with its own engine instance
pub struct Simulation {
    config: SimConfig,
    clock: Arc<dyn Clock>,
    manager: TournamentManager,
    ledger: RewardLedger,
    throttle: Arc<RegistrationThrottle>,
    scores: Mutex<StdRng>,
}

impl Simulation {
    /// Wire the engine to an in-memory store and the wall clock
    pub fn new(config: SimConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let random: Arc<dyn RandomSource> = match config.seed {
            Some(seed) => Arc::new(SeededRandom::new(seed)),
            None => Arc::new(ThreadRandom),
        };
        let scores = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_os_rng(),
        };

        Self {
            manager: TournamentManager::new(store.clone(), clock.clone(), random),
            ledger: RewardLedger::new(store, clock.clone()),
            throttle: Arc::new(RegistrationThrottle::from_settings(&config.throttle)),
            scores: Mutex::new(scores),
            clock,
            config,
        }
    }

    /// Run the whole tournament lifecycle
    pub async fn run(&self) -> anyhow::Result<SimulationReport> {
        let settings = &self.config.tournament;
        let window = ChronoDuration::from_std(settings.registration_window)
            .context("registration window out of range")?;
        let start_date = self.clock.now() + window;

        let created = self
            .manager
            .create_tournament(self.tournament_config(start_date))
            .await?;
        tracing::info!(
            tournament = %created.id,
            kind = %created.kind,
            "Registration open until {}",
            created.start_date
        );

        let registration = self.register_entrants(created.id).await?;
        tracing::info!(
            admitted = registration.admitted,
            duplicates = registration.duplicates,
            full = registration.full,
            late = registration.late,
            throttled = registration.throttled,
            "Registration closed"
        );

        let evicted = self.throttle.sweep().await;
        tracing::debug!(
            evicted,
            tracked = self.throttle.tracked_users().await,
            "Registration throttle swept"
        );

        // Timer resolution may wake slightly before the wall clock reaches the start
        if let Ok(wait) = (start_date - self.clock.now()).to_std() {
            tokio::time::sleep(wait + START_MARGIN).await;
        }

        let started = self.manager.start(created.id).await?;
        let bracket = started
            .bracket
            .as_ref()
            .context("started tournament has no bracket")?;
        tracing::info!(
            rounds = bracket.rounds,
            matches = bracket.matches.len(),
            "Bracket generated"
        );

        let matches_played = self.play(created.id).await?;
        let tournament = self.manager.get(created.id).await?;
        let champion = tournament
            .champion
            .context("completed tournament has no champion")?;

        let record = self.manager.participant_record(created.id, champion).await?;
        tracing::info!(
            %champion,
            wins = record.wins,
            losses = record.losses,
            "Tournament won"
        );

        let (receipts, team_reward) = match champion {
            Participant::Player(user) => (self.pay_player(created.id, user).await?, None),
            Participant::Team(team) => {
                (Vec::new(), Some(self.pay_team(created.id, team).await?))
            }
        };

        let sweep = self.ledger.sweep_expired().await?;
        tracing::debug!(
            expired = sweep.expired,
            failed = sweep.failed,
            "Reward sweep finished"
        );

        Ok(SimulationReport {
            tournament,
            registration,
            matches_played,
            receipts,
            team_reward,
        })
    }

    fn tournament_config(&self, start_date: chrono::DateTime<chrono::Utc>) -> TournamentConfig {
        let settings = &self.config.tournament;
        let config = TournamentConfig::single_elimination(
            format!("Simulated {} Cup", settings.kind),
            settings.kind,
            start_date,
        );
        let teams = settings.max_teams.unwrap_or(settings.participants);
        let players = settings.max_players.unwrap_or(settings.participants);

        match settings.kind {
            TournamentKind::Team => config.with_max_teams(teams),
            TournamentKind::Solo => config.with_max_players(players),
            TournamentKind::Mixed => config.with_max_teams(teams).with_max_players(players),
        }
    }

    fn entrants(&self) -> Vec<Participant> {
        let settings = &self.config.tournament;
        (0..settings.participants as usize)
            .map(|i| match settings.kind {
                TournamentKind::Team => Participant::Team(Uuid::new_v4()),
                TournamentKind::Solo => Participant::Player(Uuid::new_v4()),
                TournamentKind::Mixed if i % 2 == 0 => Participant::Team(Uuid::new_v4()),
                TournamentKind::Mixed => Participant::Player(Uuid::new_v4()),
            })
            .collect()
    }

    /// Register every entrant concurrently; every third one retries once
    async fn register_entrants(&self, id: Uuid) -> anyhow::Result<RegistrationTally> {
        let mut tasks = Vec::new();
        for (i, entrant) in self.entrants().into_iter().enumerate() {
            let manager = self.manager.clone();
            let throttle = self.throttle.clone();
            let attempts = if i % 3 == 0 { 2 } else { 1 };

            tasks.push(tokio::spawn(async move {
                let mut tally = RegistrationTally::default();
                for _ in 0..attempts {
                    if !throttle.check(entrant.id()).await.is_allowed() {
                        tally.throttled += 1;
                        continue;
                    }
                    match manager.register(id, entrant.id(), entrant.kind()).await {
                        Ok(_) => tally.admitted += 1,
                        Err(TournamentError::AlreadyRegistered(_)) => tally.duplicates += 1,
                        Err(TournamentError::CapacityExceeded { .. }) => tally.full += 1,
                        Err(TournamentError::RegistrationClosed) => tally.late += 1,
                        Err(e) => return Err(e),
                    }
                }
                Ok(tally)
            }));
        }

        let mut total = RegistrationTally::default();
        for task in tasks {
            let tally = task.await.context("registration task panicked")??;
            total.admitted += tally.admitted;
            total.duplicates += tally.duplicates;
            total.full += tally.full;
            total.late += tally.late;
            total.throttled += tally.throttled;
        }
        Ok(total)
    }

    /// Play rounds until a champion is crowned; returns the number of games played
    async fn play(&self, id: Uuid) -> anyhow::Result<usize> {
        let mut played = 0;
        loop {
            let view = self.manager.get(id).await?;
            match view.status {
                TournamentStatus::Completed => return Ok(played),
                TournamentStatus::InProgress => {}
                status => bail!("tournament {id} is {status}, expected in progress"),
            }

            let bracket = view.bracket.context("tournament in progress has no bracket")?;
            let ready: Vec<(u32, Participant, Participant)> = bracket
                .matches
                .iter()
                .filter(|m| m.status == MatchStatus::Pending)
                .filter_map(|m| Some((m.match_number, m.slot1()?, m.slot2()?)))
                .collect();

            if ready.is_empty() {
                bail!("tournament {id} is in progress with no playable match");
            }

            for (match_number, first, second) in ready {
                self.manager.begin_match(id, match_number).await?;
                let (score1, score2, winner) = self.roll(first, second);
                self.manager
                    .record_result(id, match_number, score1, score2, winner)
                    .await?;
                tracing::debug!(match_number, %winner, score1, score2, "Match played");
                played += 1;
            }
        }
    }

    /// Pick a winner and a best-of-five scoreline
    fn roll(&self, first: Participant, second: Participant) -> (u32, u32, Participant) {
        let mut rng = self.scores.lock().unwrap_or_else(|e| e.into_inner());
        let loser_score = rng.random_range(0..3);
        if rng.random_bool(0.5) {
            (3, loser_score, first)
        } else {
            (loser_score, 3, second)
        }
    }

    fn prize(&self, tournament: Uuid) -> Reward {
        let reward = &self.config.reward;
        Reward::currency(
            format!("Winnings from tournament {tournament}"),
            CurrencyDetails {
                currency: "USDT".to_string(),
                amount: reward.amount,
                min_withdrawal: 1,
                max_withdrawal: None,
                withdrawal_fee_percent: reward.fee_percent,
            },
        )
        .with_valid_days(30)
    }

    /// Grant the prize to a solo champion and cash it out in two withdrawals
    async fn pay_player(
        &self,
        tournament: Uuid,
        user: Uuid,
    ) -> anyhow::Result<Vec<WithdrawalReceipt>> {
        let badge = self
            .ledger
            .grant_player_reward(user, Reward::new("Champion".to_string(), RewardType::Badge))
            .await?;
        self.ledger.claim_player_reward(badge.id).await?;

        let prize = self.ledger.grant_player_reward(user, self.prize(tournament)).await?;
        let total = prize.balance().unwrap_or(0);
        let first = total / 2;

        let mut receipts = Vec::new();
        for (n, amount) in [first, total - first].into_iter().enumerate() {
            if amount == 0 {
                continue;
            }
            let quote = self.ledger.validate_withdrawal(prize.id, amount).await?;
            tracing::debug!(amount, fee = quote.fee, net = quote.net, "Withdrawal quoted");

            let receipt = self
                .ledger
                .withdraw(prize.id, amount, format!("{}-payout-{}", prize.id, n + 1))
                .await?;
            tracing::info!(
                amount = receipt.amount,
                fee = receipt.fee,
                net = receipt.net,
                remaining = receipt.remaining,
                "Prize withdrawn"
            );
            receipts.push(receipt);
        }
        Ok(receipts)
    }

    /// Grant the prize to a team champion and let every member claim a share
    async fn pay_team(&self, tournament: Uuid, team: Uuid) -> anyhow::Result<TeamReward> {
        let shares: Vec<(Uuid, u32)> = TEAM_SHARES
            .iter()
            .map(|percent| (Uuid::new_v4(), *percent))
            .collect();

        let granted = self
            .ledger
            .grant_team_reward(team, self.prize(tournament), &shares)
            .await?;

        let mut latest = granted;
        for (member, percent) in &shares {
            latest = self.ledger.claim_team_share(latest.id, *member).await?;
            tracing::info!(%member, percent, "Team share claimed");
        }
        Ok(latest)
    }
}
